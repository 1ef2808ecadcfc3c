use super::retry::{send_with_retry, RetryPolicy};
use super::{endpoint, read_json, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::toml_config::OpenAiConfig;
use crate::domain::model::ModelKind;
use crate::domain::ports::ChatModel;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Client for any OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            retry,
        })
    }

    pub fn from_config(config: &OpenAiConfig, retry: RetryPolicy) -> Result<Self> {
        Self::new(
            config.base_url(),
            config.api_key()?,
            config.model(),
            config.timeout(),
            retry,
        )
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    fn kind(&self) -> ModelKind {
        ModelKind::OpenAi
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = endpoint(&self.base_url, "chat/completions");
        tracing::debug!("POST {} (model {})", url, self.model);

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatCompletionRequest::single_user_message(&self.model, prompt));

        let response = send_with_retry("openai", request, &self.retry).await?;
        let body: ChatCompletionResponse = read_json("openai", response).await?;
        body.into_first_content("openai")
    }
}
