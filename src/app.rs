use anyhow::Error;
use teloxide::{prelude::*, types::MenuButton};

use crate::{
    config::SharedConfig,
    dispatcher::build_dispatcher,
    module_mgr::ModuleManager,
    modules::{chat::Chat, config::Config, subscription::Subscription},
};

async fn init_bot(config: &SharedConfig, module_mgr: &ModuleManager) -> Result<Bot, Error> {
    let bot = Bot::new(&config.telegram_bot_token);
    futures::try_join!(
        bot.set_chat_menu_button()
            .menu_button(MenuButton::Commands)
            .send(),
        bot.set_my_commands(module_mgr.commands()).send(),
    )?;
    Ok(bot)
}

/// Runs the bot until it's interrupted by Ctrl-C.
pub async fn run(config: SharedConfig) -> Result<(), Error> {
    debug!("Initializing modules...");
    let mut module_mgr = ModuleManager::new();
    module_mgr.register_module(Config::new(config.clone()));
    module_mgr.register_module(Subscription);
    module_mgr.register_module(Chat);

    info!("Initializing bot...");
    let bot = init_bot(&config, &module_mgr)
        .await
        .map_err(|err| anyhow!("Failed to init bot: {}", err))?;

    let mut built_dispatcher = build_dispatcher(bot, module_mgr).await?;
    info!("Bot is started!");
    built_dispatcher.dispatch().await;
    Ok(())
}
