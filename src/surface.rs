//! Outbound operations available while handling a single update.
//!
//! Handlers talk to a [`ChatSurface`] instead of the [`Bot`] directly, which
//! keeps their flow independent of the Telegram transport.

use anyhow::Error;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};

#[async_trait]
pub(crate) trait ChatSurface: Send + Sync {
    /// Sends an HTML formatted text, returning the id of the sent message.
    async fn send_text(
        &self,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, Error>;

    async fn delete_message(&self, message_id: MessageId) -> Result<(), Error>;

    /// Shows a popup alert in response to the callback being handled.
    async fn alert(&self, text: &str) -> Result<(), Error>;

    /// Answers the callback being handled without showing anything.
    async fn answer_callback(&self) -> Result<(), Error>;
}

/// A [`ChatSurface`] bound to one Telegram chat.
pub(crate) struct TelegramSurface {
    bot: Bot,
    chat_id: ChatId,
    callback_id: Option<String>,
}

impl TelegramSurface {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            callback_id: None,
        }
    }

    pub fn for_callback(bot: Bot, chat_id: ChatId, callback_id: String) -> Self {
        Self {
            bot,
            chat_id,
            callback_id: Some(callback_id),
        }
    }
}

#[async_trait]
impl ChatSurface for TelegramSurface {
    async fn send_text(
        &self,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, Error> {
        let mut req = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            req = req.reply_markup(keyboard);
        }
        let sent = req.await?;
        Ok(sent.id)
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<(), Error> {
        self.bot.delete_message(self.chat_id, message_id).await?;
        Ok(())
    }

    async fn alert(&self, text: &str) -> Result<(), Error> {
        let callback_id = self
            .callback_id
            .clone()
            .ok_or_else(|| anyhow!("No callback query to answer"))?;
        self.bot
            .answer_callback_query(callback_id)
            .text(text)
            .show_alert(true)
            .await?;
        Ok(())
    }

    async fn answer_callback(&self) -> Result<(), Error> {
        if let Some(callback_id) = &self.callback_id {
            self.bot.answer_callback_query(callback_id.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Action {
        Send {
            text: String,
            keyboard: Option<InlineKeyboardMarkup>,
        },
        Delete(MessageId),
        Alert(String),
        AnswerCallback,
    }

    /// Records every outbound operation instead of performing it.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        actions: Mutex<Vec<Action>>,
    }

    impl RecordingSurface {
        pub fn actions(&self) -> Vec<Action> {
            self.actions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatSurface for RecordingSurface {
        async fn send_text(
            &self,
            text: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<MessageId, Error> {
            let mut actions = self.actions.lock().unwrap();
            actions.push(Action::Send {
                text: text.to_owned(),
                keyboard,
            });
            Ok(MessageId(100 + actions.len() as i32))
        }

        async fn delete_message(&self, message_id: MessageId) -> Result<(), Error> {
            self.actions.lock().unwrap().push(Action::Delete(message_id));
            Ok(())
        }

        async fn alert(&self, text: &str) -> Result<(), Error> {
            self.actions
                .lock()
                .unwrap()
                .push(Action::Alert(text.to_owned()));
            Ok(())
        }

        async fn answer_callback(&self) -> Result<(), Error> {
            self.actions.lock().unwrap().push(Action::AnswerCallback);
            Ok(())
        }
    }
}
