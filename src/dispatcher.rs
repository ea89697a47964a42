use anyhow::Error;
use teloxide::prelude::*;
use teloxide::types::{UpdateKind, User};

use crate::{
    module_mgr::ModuleManager,
    types::{HandlerResult, TeloxideDispatcher},
};

fn describe_user(user: &User) -> String {
    let full_name = user.full_name();
    if full_name.is_empty() {
        user.id.to_string()
    } else {
        full_name
    }
}

fn update_filter(upd: Update) -> bool {
    match &upd.kind {
        UpdateKind::Message(msg) => {
            let from = msg
                .from()
                .map(describe_user)
                .unwrap_or("<unknown>".to_owned());

            if let Some(text) = msg.text() {
                info!("{} sent a message: {}", from, text);
            } else {
                info!("{} sent a message: {:#?}", from, msg.kind);
            }
        }
        UpdateKind::CallbackQuery(query) => {
            info!(
                "{} pressed a button: {}",
                describe_user(&query.from),
                query.data.as_deref().unwrap_or("<none>")
            );
        }
        _ => {
            debug!("Received update ({})", upd.id);
        }
    }

    true
}

async fn default_handler(msg: Message) -> HandlerResult {
    warn!("Message ({}) is not handled!", msg.id);
    Ok(())
}

async fn default_callback_handler(query: CallbackQuery) -> HandlerResult {
    warn!("Callback query ({}) is not handled!", query.id);
    Ok(())
}

pub(crate) async fn build_dispatcher(
    bot: Bot,
    mut module_mgr: ModuleManager,
) -> Result<TeloxideDispatcher, Error> {
    // Load dependencies.
    let mut dep_map = DependencyMap::new();
    dep_map.insert(bot.clone());
    module_mgr.register_dependencies(&mut dep_map).await?;

    // Build handler chain.
    let mut handler_chains = vec![];
    module_mgr.with_all_modules(|m| handler_chains.push(m.handler_chain()));
    let biz_handler = handler_chains
        .into_iter()
        .fold(dptree::entry(), |handler, chain| handler.branch(chain))
        .branch(Update::filter_message().endpoint(default_handler))
        .branch(Update::filter_callback_query().endpoint(default_callback_handler));
    let handler = dptree::filter(update_filter).chain(biz_handler);

    Ok(Dispatcher::builder(bot, handler)
        .dependencies(dep_map)
        .enable_ctrlc_handler()
        .build())
}
