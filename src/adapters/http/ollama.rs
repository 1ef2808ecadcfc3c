use super::retry::{send_with_retry, RetryPolicy};
use super::{endpoint, read_json};
use crate::config::toml_config::OllamaConfig;
use crate::domain::model::ModelKind;
use crate::domain::ports::ChatModel;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server's non-streaming `/api/generate`.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            retry,
        })
    }

    pub fn from_config(config: &OllamaConfig, retry: RetryPolicy) -> Result<Self> {
        Self::new(config.base_url(), config.model(), config.timeout(), retry)
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn kind(&self) -> ModelKind {
        ModelKind::Ollama
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = endpoint(&self.base_url, "api/generate");
        tracing::debug!("POST {} (model {})", url, self.model);

        let request = self.client.post(&url).json(&GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        });

        let response = send_with_retry("ollama", request, &self.retry).await?;
        let body: GenerateResponse = read_json("ollama", response).await?;
        Ok(body.response)
    }
}
