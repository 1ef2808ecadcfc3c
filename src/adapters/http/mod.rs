// HTTP clients for the chat backends.

pub mod gigachat;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod retry;

use crate::utils::error::{Result, SaphireError};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// OpenAI-style chat completion request; GigaChat accepts the same shape.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn single_user_message(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn into_first_content(self, provider: &str) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SaphireError::ResponseFormatError {
                provider: provider.to_string(),
                message: "response has no choices[0].message.content".to_string(),
            })
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Decodes a JSON body, reporting shape mismatches as the provider's fault.
pub(crate) async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SaphireError::ResponseFormatError {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}
