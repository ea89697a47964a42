use anyhow::Error;
use teloxide::dispatching::{DefaultKey, DpHandlerDescription};
use teloxide::prelude::*;

pub(crate) type HandlerResult = Result<(), Error>;
pub(crate) type TeloxideHandler =
    Handler<'static, DependencyMap, HandlerResult, DpHandlerDescription>;
pub(crate) type TeloxideDispatcher = Dispatcher<Bot, Error, DefaultKey>;

/// The text of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageText(pub String);
