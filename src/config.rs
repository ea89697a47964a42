//! Configuration-related types.
//!
//! The bot is usually configured through the environment (`BOT_TOKEN`,
//! `AI_TOKEN` and `CHANNEL_USERNAME`, optionally read from a `.env` file),
//! see [`Config::from_env`]. It can also be represented in and deserialized
//! from JSON, here is an example:
//!
//! ```json
//! {
//!   "botToken": "8888888888:XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
//!   "aiAPIKey": "sk-or-v1-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
//!   "channel": "@smartgdz_news",
//!   "aiModel": "meta-llama/llama-4-maverick:free",
//!   "historyLimit": 10,
//!   "i18n": {
//!     "generating": "Thinking..."
//!   }
//! }
//! ```
//!
//! See [`Config`] for more detailed descriptions.

use std::env;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use anyhow::Error;
use paste::paste;
use serde::Deserialize;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable holding the completion API key.
pub const AI_TOKEN_ENV: &str = "AI_TOKEN";
/// Environment variable holding the gated channel (`@handle` or numeric id).
pub const CHANNEL_ENV: &str = "CHANNEL_USERNAME";

/// A thread-safe reference-counting object that represents
/// a [`Config`] instance.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    config: Arc<Config>,
}

impl SharedConfig {
    /// Constructs a new `SharedConfig`.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Deref for SharedConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        self.config.as_ref()
    }
}

/// Top-level config type for the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The token of your Telegram bot.
    /// JSON key: `botToken`
    #[serde(rename = "botToken")]
    pub telegram_bot_token: String,

    /// The API key of the completion service.
    /// JSON key: `aiAPIKey`
    #[serde(rename = "aiAPIKey")]
    pub ai_api_key: String,

    /// The channel users must subscribe to, either `@handle` or a
    /// numeric chat id.
    /// JSON key: `channel`
    pub channel: String,

    /// Base URL of the OpenAI-compatible completion API.
    /// Value is default to "https://openrouter.ai/api/v1".
    /// JSON key: `aiAPIBase`
    #[serde(default = "default_ai_api_base", rename = "aiAPIBase")]
    pub ai_api_base: String,

    /// The model requested for every completion.
    /// JSON key: `aiModel`
    #[serde(default = "default_ai_model", rename = "aiModel")]
    pub ai_model: String,

    /// Sent as the `HTTP-Referer` header to identify the bot.
    /// JSON key: `httpReferer`
    #[serde(default = "default_http_referer", rename = "httpReferer")]
    pub http_referer: String,

    /// Sent as the `X-Title` header to identify the bot.
    /// JSON key: `appTitle`
    #[serde(default = "default_app_title", rename = "appTitle")]
    pub app_title: String,

    /// Maximum number of entries kept in a user's history, the
    /// system entry included.
    /// JSON key: `historyLimit`
    #[serde(default = "default_history_limit", rename = "historyLimit")]
    pub history_limit: usize,

    /// The instruction prepended to every conversation.
    /// JSON key: `systemPrompt`
    #[serde(default = "default_system_prompt", rename = "systemPrompt")]
    pub system_prompt: String,

    /// Whether the welcome message carries the subscribe keyboard as well.
    /// JSON key: `welcomeKeyboard`
    #[serde(default = "default_welcome_keyboard", rename = "welcomeKeyboard")]
    pub welcome_keyboard: bool,

    /// Strings for I18N.
    /// JSON key: `i18n`
    #[serde(default)]
    pub i18n: I18nStrings,
}

impl Config {
    /// Builds a config from `BOT_TOKEN`, `AI_TOKEN` and `CHANNEL_USERNAME`,
    /// leaving everything else at its default value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads a config from a JSON file.
    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|err| anyhow!("Failed to open config file {}: {}", path.display(), err))?;
        Ok(serde_json::from_reader(file)?)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("Environment variable {} is not set", key))
        };

        let value = serde_json::json!({
            "botToken": required(BOT_TOKEN_ENV)?,
            "aiAPIKey": required(AI_TOKEN_ENV)?,
            "channel": required(CHANNEL_ENV)?,
        });
        Ok(serde_json::from_value(value)?)
    }
}

/// Strings for I18N.
#[derive(Debug, Clone, Deserialize)]
pub struct I18nStrings {
    /// Shown to users who are not subscribed when they press `/start`.
    /// JSON key: `subscribePrompt`
    #[serde(default = "default_subscribe_prompt", rename = "subscribePrompt")]
    pub subscribe_prompt: String,
    /// Label of the button linking to the channel.
    /// JSON key: `subscribeButton`
    #[serde(default = "default_subscribe_button", rename = "subscribeButton")]
    pub subscribe_button: String,
    /// Label of the button that re-checks the subscription.
    /// JSON key: `subscribedButton`
    #[serde(default = "default_subscribed_button", rename = "subscribedButton")]
    pub subscribed_button: String,
    /// The greeting sent once access is granted. HTML formatted.
    /// JSON key: `welcome`
    #[serde(default = "default_welcome", rename = "welcome")]
    pub welcome: String,
    /// Alert popup shown when the re-check still fails.
    /// JSON key: `subscribeAlert`
    #[serde(default = "default_subscribe_alert", rename = "subscribeAlert")]
    pub subscribe_alert: String,
    /// Sent instead of a reply to unsubscribed users. `{channel}` is
    /// replaced with the configured channel.
    /// JSON key: `subscribeReminder`
    #[serde(default = "default_subscribe_reminder", rename = "subscribeReminder")]
    pub subscribe_reminder: String,
    /// Placeholder shown while the reply is being generated.
    /// JSON key: `generating`
    #[serde(default = "default_generating", rename = "generating")]
    pub generating: String,
    /// A text to display when there are something wrong with the completion service.
    /// JSON key: `apiErrorPrompt`
    #[serde(default = "default_api_error_prompt", rename = "apiErrorPrompt")]
    pub api_error_prompt: String,
}

impl I18nStrings {
    pub fn subscribe_reminder_for(&self, channel: &str) -> String {
        self.subscribe_reminder.replace("{channel}", channel)
    }
}

macro_rules! define_defaults {
    ($ty_name:ident { $($name:ident: $ty:ty = $default:expr,)* }) => {
        define_defaults! { $($name: $ty = $default,)* }
        paste! {
            impl Default for $ty_name {
                fn default() -> Self {
                    Self {
                        $($name: [<default_ $name>](),)*
                    }
                }
            }
        }
    };
    ($($name:ident: $ty:ty = $default:expr,)*) => {
        paste! {
            $(
                fn [<default_ $name>]() -> $ty {
                    $default
                }
            )*
        }
    };
}

define_defaults! {
    ai_api_base: String = "https://openrouter.ai/api/v1".to_owned(),
    ai_model: String = "meta-llama/llama-4-maverick:free".to_owned(),
    http_referer: String = "https://t.me/SmartGDZ_Bot".to_owned(),
    app_title: String = "SmartGDZ Bot".to_owned(),
    history_limit: usize = 10,
    system_prompt: String = concat!(
        "Ти освічений і доброзичливий асистент, який допомагає школярам робити домашні завдання. ",
        "Твої відповіді мають бути короткими, зрозумілими й українською мовою. ",
        "Якщо запит поганий — поясни чому."
    )
    .to_owned(),
    welcome_keyboard: bool = true,
}

define_defaults!(I18nStrings {
    subscribe_prompt: String =
        "❗️Щоб користуватись ботом, потрібно підписатися на наш канал новин.".to_owned(),
    subscribe_button: String = "🔔 Підписатися на канал".to_owned(),
    subscribed_button: String = "✅ Я підписався".to_owned(),
    welcome: String = concat!(
        "👋 Привіт!\n\n",
        "Я — <b>SmartGDZ Бот</b>, і я допоможу тобі з домашкою! ✍️📚\n",
        "Просто напиши мені запитання, і я дам відповідь.\n\n",
        "🧠 Працюю на базі ШІ Llama 4 Maverick\n",
        "💬 Пиши будь-які шкільні задачі або теми\n\n",
        "🛠️ Бот працює у режимі бета-версії\n\n",
        "📞 Якщо є питання або знайшов баг — пиши @requnex_software"
    )
    .to_owned(),
    subscribe_alert: String =
        "❗ Щоб користуватись ботом, потрібно підписатись на канал!".to_owned(),
    subscribe_reminder: String = concat!(
        "🚫 Щоб користуватися ботом, підпишіться на канал: {channel}\n",
        "Після підписки напишіть будь-яке повідомлення знову."
    )
    .to_owned(),
    generating: String = "🔄 Генерую відповідь, зачекай...".to_owned(),
    api_error_prompt: String = concat!(
        "⚠️ Виникла помилка при генерації відповіді. ",
        "Спробуй ще раз або напиши розробнику: @requnex_software"
    )
    .to_owned(),
});

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    pub(crate) fn test_config() -> SharedConfig {
        let value = serde_json::json!({
            "botToken": "123:abc",
            "aiAPIKey": "sk-test",
            "channel": "@smartgdz_news",
        });
        SharedConfig::new(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (BOT_TOKEN_ENV, "123:abc"),
            (AI_TOKEN_ENV, "sk-test"),
            (CHANNEL_ENV, "@smartgdz_news"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.telegram_bot_token, "123:abc");
        assert_eq!(config.ai_api_key, "sk-test");
        assert_eq!(config.channel, "@smartgdz_news");
        assert_eq!(config.ai_api_base, "https://openrouter.ai/api/v1");
        assert_eq!(config.ai_model, "meta-llama/llama-4-maverick:free");
        assert_eq!(config.history_limit, 10);
        assert!(config.welcome_keyboard);
    }

    #[test]
    fn test_missing_env() {
        let err = Config::from_lookup(|key| {
            if key == CHANNEL_ENV {
                None
            } else {
                Some("value".to_owned())
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains(CHANNEL_ENV));

        let err = Config::from_lookup(|_| Some(String::new())).unwrap_err();
        assert!(err.to_string().contains(BOT_TOKEN_ENV));
    }

    #[test]
    fn test_json_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "botToken": "t",
                "aiAPIKey": "k",
                "channel": "-1001234567890",
                "historyLimit": 4,
                "welcomeKeyboard": false,
                "i18n": { "generating": "Thinking..." }
            }"#,
        )
        .unwrap();
        assert_eq!(config.history_limit, 4);
        assert!(!config.welcome_keyboard);
        assert_eq!(config.i18n.generating, "Thinking...");
        assert_eq!(config.i18n.subscribe_button, "🔔 Підписатися на канал");
    }

    #[test]
    fn test_subscribe_reminder() {
        let i18n = I18nStrings::default();
        let text = i18n.subscribe_reminder_for("@smartgdz_news");
        assert!(text.contains("@smartgdz_news"));
        assert!(!text.contains("{channel}"));
    }
}
