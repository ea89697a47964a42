pub(crate) mod gate;

use std::sync::Arc;

use anyhow::Error;
use teloxide::dptree::di::DependencySupplier;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};

use crate::{
    config::SharedConfig,
    module_mgr::Module,
    surface::{ChatSurface, TelegramSurface},
    types::{HandlerResult, TeloxideHandler},
    utils::dptree_ext::command_filter,
};
use gate::{ChannelRef, TelegramMembership};
pub(crate) use gate::{GatePolicy, SubscriptionCheck, SubscriptionGate};

pub(crate) const CHECK_SUBSCRIPTION_DATA: &str = "check_subscription";

/// The keyboard attached to the subscribe prompt: a link to the channel
/// and a button to re-check the subscription.
pub(crate) fn subscribe_keyboard(
    channel: &ChannelRef,
    config: &SharedConfig,
) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    match channel.link().map(|link| reqwest::Url::parse(&link)) {
        Some(Ok(url)) => {
            keyboard = keyboard.append_row([InlineKeyboardButton::url(
                config.i18n.subscribe_button.clone(),
                url,
            )]);
        }
        Some(Err(err)) => {
            warn!("Invalid channel link for {}: {}", channel, err);
        }
        None => {}
    }
    keyboard.append_row([InlineKeyboardButton::callback(
        config.i18n.subscribed_button.clone(),
        CHECK_SUBSCRIPTION_DATA,
    )])
}

async fn send_welcome<S>(
    surface: &S,
    channel: &ChannelRef,
    config: &SharedConfig,
) -> HandlerResult
where
    S: ChatSurface + ?Sized,
{
    let keyboard = config
        .welcome_keyboard
        .then(|| subscribe_keyboard(channel, config));
    surface.send_text(&config.i18n.welcome, keyboard).await?;
    Ok(())
}

/// Greets the user, or asks them to subscribe first.
pub(crate) async fn start_flow<S>(
    surface: &S,
    check: SubscriptionCheck,
    channel: &ChannelRef,
    config: &SharedConfig,
) -> HandlerResult
where
    S: ChatSurface + ?Sized,
{
    if !GatePolicy::Strict.allows(check) {
        surface
            .send_text(
                &config.i18n.subscribe_prompt,
                Some(subscribe_keyboard(channel, config)),
            )
            .await?;
        return Ok(());
    }

    send_welcome(surface, channel, config).await
}

/// Handles a press on the "subscribed" button of `prompt_msg_id`.
pub(crate) async fn check_subscription_flow<S>(
    surface: &S,
    check: SubscriptionCheck,
    prompt_msg_id: Option<MessageId>,
    channel: &ChannelRef,
    config: &SharedConfig,
) -> HandlerResult
where
    S: ChatSurface + ?Sized,
{
    if !GatePolicy::Strict.allows(check) {
        surface.alert(&config.i18n.subscribe_alert).await?;
        return Ok(());
    }

    if let Some(prompt_msg_id) = prompt_msg_id {
        surface.delete_message(prompt_msg_id).await?;
    }
    send_welcome(surface, channel, config).await?;
    // Stops the loading indicator on the button.
    surface.answer_callback().await
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    gate: SubscriptionGate,
    config: SharedConfig,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        warn!("Message ({}) has no sender", msg.id);
        return Ok(());
    };

    let check = gate.check(user.id).await;
    let surface = TelegramSurface::new(bot, msg.chat.id);
    start_flow(&surface, check, gate.channel(), &config).await
}

async fn handle_check_subscription(
    bot: Bot,
    query: CallbackQuery,
    gate: SubscriptionGate,
    config: SharedConfig,
) -> HandlerResult {
    let Some(message) = query.message else {
        warn!("Callback query ({}) has no message attached", query.id);
        return Ok(());
    };

    let check = gate.check(query.from.id).await;
    let surface = TelegramSurface::for_callback(bot, message.chat.id, query.id);
    check_subscription_flow(&surface, check, Some(message.id), gate.channel(), &config).await
}

pub(crate) struct Subscription;

#[async_trait]
impl Module for Subscription {
    async fn register_dependency(&mut self, dep_map: &mut DependencyMap) -> Result<(), Error> {
        let config: Arc<SharedConfig> = dep_map.get();
        let bot: Arc<Bot> = dep_map.get();

        let channel = ChannelRef::parse(&config.channel)?;
        info!("Access is gated by channel {}", channel);
        dep_map.insert(SubscriptionGate::new(
            TelegramMembership::new(bot.as_ref().clone()),
            channel,
        ));
        Ok(())
    }

    fn handler_chain(&self) -> TeloxideHandler {
        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter(command_filter("start"))
                    .endpoint(handle_start),
            )
            .branch(
                Update::filter_callback_query()
                    .filter(|query: CallbackQuery| {
                        query.data.as_deref() == Some(CHECK_SUBSCRIPTION_DATA)
                    })
                    .endpoint(handle_check_subscription),
            )
    }

    fn commands(&self) -> Vec<BotCommand> {
        vec![BotCommand::new("start", "Почати роботу з ботом")]
    }
}
