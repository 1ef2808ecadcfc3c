//! GigaChat client.
//!
//! Calls need a short-lived access token obtained by exchanging the
//! authorization key at the OAuth endpoint. The token is cached and refreshed
//! a minute before `expires_at`, or immediately after a 401.

use super::retry::{send_with_retry, RetryPolicy};
use super::{endpoint, read_json, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::toml_config::GigaChatConfig;
use crate::domain::model::ModelKind;
use crate::domain::ports::ChatModel;
use crate::utils::error::{Result, SaphireError};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

const REFRESH_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Unix time in milliseconds.
    expires_at: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(REFRESH_MARGIN_SECONDS) < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct GigaChatSettings {
    pub base_url: String,
    pub auth_url: String,
    pub credentials: String,
    pub scope: String,
    pub model: String,
    pub verify_ssl_certs: bool,
    pub timeout: Duration,
}

pub struct GigaChatClient {
    client: Client,
    settings: GigaChatSettings,
    retry: RetryPolicy,
    token: Mutex<Option<AccessToken>>,
}

impl GigaChatClient {
    pub fn new(settings: GigaChatSettings, retry: RetryPolicy) -> Result<Self> {
        let mut builder = Client::builder().timeout(settings.timeout);
        if !settings.verify_ssl_certs {
            tracing::debug!("GigaChat TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            settings,
            retry,
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &GigaChatConfig, retry: RetryPolicy) -> Result<Self> {
        let settings = GigaChatSettings {
            base_url: config.base_url().to_string(),
            auth_url: config.auth_url().to_string(),
            credentials: config.credentials()?.to_string(),
            scope: config.scope().to_string(),
            model: config.model().to_string(),
            verify_ssl_certs: config.verify_ssl_certs(),
            timeout: config.timeout(),
        };
        Self::new(settings, retry)
    }

    async fn fetch_token(&self) -> Result<AccessToken> {
        tracing::debug!("Requesting GigaChat access token from {}", self.settings.auth_url);

        let request = self
            .client
            .post(&self.settings.auth_url)
            .header("Authorization", format!("Basic {}", self.settings.credentials))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", self.settings.scope.as_str())]);

        let response = send_with_retry("gigachat", request, &self.retry).await?;
        let token: TokenResponse = read_json("gigachat", response).await?;

        let expires_at = DateTime::from_timestamp_millis(token.expires_at).ok_or_else(|| {
            SaphireError::ResponseFormatError {
                provider: "gigachat".to_string(),
                message: format!("invalid expires_at: {}", token.expires_at),
            }
        })?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn chat(&self, token: &str, prompt: &str) -> Result<String> {
        let url = endpoint(&self.settings.base_url, "chat/completions");
        tracing::debug!("POST {} (model {})", url, self.settings.model);

        let request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&ChatCompletionRequest::single_user_message(
                &self.settings.model,
                prompt,
            ));

        let response = send_with_retry("gigachat", request, &self.retry).await?;
        let body: ChatCompletionResponse = read_json("gigachat", response).await?;
        body.into_first_content("gigachat")
    }
}

#[async_trait]
impl ChatModel for GigaChatClient {
    fn kind(&self) -> ModelKind {
        ModelKind::GigaChat
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let token = self.access_token().await?;
        match self.chat(&token, prompt).await {
            Err(SaphireError::ProviderError { status: 401, .. }) => {
                tracing::info!("GigaChat token rejected, refreshing");
                self.invalidate_token().await;
                let token = self.access_token().await?;
                self.chat(&token, prompt).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_margin() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + TimeDelta::seconds(30 * 60),
        };
        assert!(token.is_fresh(now));

        let expiring = AccessToken {
            value: "t".to_string(),
            expires_at: now + TimeDelta::seconds(30),
        };
        assert!(!expiring.is_fresh(now));
    }
}
