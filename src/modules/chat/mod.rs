mod openai_client;
mod session;
mod session_mgr;

use std::sync::Arc;

use anyhow::Error;
use teloxide::dptree::di::DependencySupplier;
use teloxide::prelude::*;
use teloxide::utils::html;

use crate::{
    config::SharedConfig,
    module_mgr::Module,
    modules::subscription::{GatePolicy, SubscriptionCheck, SubscriptionGate},
    surface::{ChatSurface, TelegramSurface},
    types::{HandlerResult, MessageText, TeloxideHandler},
};
pub(crate) use openai_client::{ChatModel, OpenAIClient};
pub(crate) use session::{ChatMessage, Session};
pub(crate) use session_mgr::SessionManager;

/// Produces replies to user prompts, keeping each user's history.
#[derive(Clone)]
pub(crate) struct ChatService {
    session_mgr: SessionManager,
    model: Arc<dyn ChatModel>,
    config: SharedConfig,
}

impl ChatService {
    pub fn new<M>(session_mgr: SessionManager, model: M, config: SharedConfig) -> Self
    where
        M: ChatModel + 'static,
    {
        Self {
            session_mgr,
            model: Arc::new(model),
            config,
        }
    }

    /// Asks the model to answer `prompt` in the context of the user's
    /// history. Never fails: errors are logged and turned into the
    /// configured apology text, in which case no reply is recorded.
    pub async fn generate_reply(&self, user_id: UserId, prompt: &str) -> String {
        let mut session = self.session_mgr.lock_session(user_id).await;
        session.ensure_system_message(&self.config.system_prompt);

        let user_msg = ChatMessage::user(prompt);
        let mut msgs = session.get_history_messages();
        msgs.push(user_msg.clone());

        match self.model.complete(&msgs).await {
            Ok(reply) => {
                session.extend([user_msg, ChatMessage::assistant(reply.clone())]);
                debug!("User {} has {} messages in history", user_id, session.len());
                reply
            }
            Err(err) => {
                error!("Failed to request the model for user {}: {}", user_id, err);
                session.extend([user_msg]);
                self.config.i18n.api_error_prompt.clone()
            }
        }
    }
}

/// Answers a text message of an already checked user.
pub(crate) async fn text_flow<S>(
    surface: &S,
    check: SubscriptionCheck,
    user_id: UserId,
    text: &str,
    channel: &str,
    chat_service: &ChatService,
) -> HandlerResult
where
    S: ChatSurface + ?Sized,
{
    let i18n = &chat_service.config.i18n;
    if !GatePolicy::Lenient.allows(check) {
        surface
            .send_text(&i18n.subscribe_reminder_for(channel), None)
            .await?;
        return Ok(());
    }

    let progress_msg_id = surface.send_text(&i18n.generating, None).await?;
    let reply = chat_service.generate_reply(user_id, text).await;
    if let Err(err) = surface.delete_message(progress_msg_id).await {
        error!("Failed to delete the progress message: {}", err);
    }
    // Model output is plain text, the surface speaks HTML.
    surface.send_text(&html::escape(&reply), None).await?;

    Ok(())
}

async fn handle_chat_message(
    bot: Bot,
    msg: Message,
    text: MessageText,
    gate: SubscriptionGate,
    chat_service: ChatService,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        warn!("Message ({}) has no sender", msg.id);
        return Ok(());
    };

    let check = gate.check(user.id).await;
    let surface = TelegramSurface::new(bot, msg.chat.id);
    text_flow(
        &surface,
        check,
        user.id,
        &text.0,
        &gate.channel().to_string(),
        &chat_service,
    )
    .await
}

fn text_messages() -> TeloxideHandler {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().map(|text| MessageText(text.to_owned())))
}

pub(crate) struct Chat;

#[async_trait]
impl Module for Chat {
    async fn register_dependency(&mut self, dep_map: &mut DependencyMap) -> Result<(), Error> {
        let config: Arc<SharedConfig> = dep_map.get();

        let session_mgr = SessionManager::new(config.history_limit);
        let openai_client = OpenAIClient::new(&config)?;
        dep_map.insert(ChatService::new(
            session_mgr,
            openai_client,
            config.as_ref().clone(),
        ));
        Ok(())
    }

    fn handler_chain(&self) -> TeloxideHandler {
        // Runs after the subscription module, so `/start` never gets here.
        dptree::entry().branch(text_messages().endpoint(handle_chat_message))
    }
}
