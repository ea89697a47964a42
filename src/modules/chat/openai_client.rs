use anyhow::Error;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::session::{ChatMessage, Role};
use crate::config::SharedConfig;

/// A service that continues a conversation with one reply.
#[async_trait]
pub(crate) trait ChatModel: Send + Sync {
    async fn complete(&self, msgs: &[ChatMessage]) -> Result<String, Error>;
}

/// Talks to an OpenAI-compatible chat completion endpoint.
pub(crate) struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    pub fn new(config: &SharedConfig) -> Result<Self, Error> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.ai_api_key)
            .with_api_base(&config.ai_api_base);

        // OpenRouter attributes requests to an app by these two headers.
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("http-referer"),
            HeaderValue::from_str(&config.http_referer)?,
        );
        headers.insert(
            HeaderName::from_static("x-title"),
            HeaderValue::from_str(&config.app_title)?,
        );
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.ai_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    async fn complete(&self, msgs: &[ChatMessage]) -> Result<String, Error> {
        let msgs = msgs
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;
        let req = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(msgs)
            .build()?;

        let resp = self.client.chat().create(req).await?;
        if let Some(usage) = &resp.usage {
            debug!(
                "Completion used {} tokens ({} prompt)",
                usage.total_tokens, usage.prompt_tokens
            );
        }

        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("Server responds with empty data"))
    }
}

fn to_request_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, Error> {
    let content = msg.content.clone();
    let req_msg = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(req_msg)
}
