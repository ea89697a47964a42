//! A homework-helper chatbot for Telegram, available to the subscribers
//! of a channel.
//!
//! The bot is built on the [`teloxide`](https://docs.rs/teloxide/latest/teloxide/)
//! framework and talks to any OpenAI-compatible completion API (OpenRouter by
//! default) through [`async_openai`](https://docs.rs/async-openai/latest/async_openai/).
//!
//! ## Getting Started
//!
//! Set `BOT_TOKEN`, `AI_TOKEN` and `CHANNEL_USERNAME` (a `.env` file works
//! too) and run the binary:
//!
//! ```shell
//! $ /path/to/smartgdz
//! ```
//!
//! Alternatively, pass a JSON config with `-c your_config.json`. The
//! configuration is described in [`config`] module.
//!
//! ## How it works
//!
//! Every `/start` and every text message first goes through a subscription
//! check against the configured channel. Allowed text messages are forwarded
//! to the model together with the last few messages of the same user, kept
//! in memory only.

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate async_trait;

pub mod app;
pub mod config;
mod dispatcher;
mod module_mgr;
mod modules;
mod surface;
mod types;
mod utils;
