use super::gigachat::GigaChatClient;
use super::ollama::OllamaClient;
use super::openai::OpenAiClient;
use super::retry::RetryPolicy;
use crate::config::toml_config::CouncilConfig;
use crate::domain::model::ModelKind;
use crate::domain::ports::ChatModel;
use crate::utils::error::Result;
use std::sync::Arc;

pub fn build_model(config: &CouncilConfig, kind: ModelKind) -> Result<Arc<dyn ChatModel>> {
    let retry = RetryPolicy::from(&config.retry);
    let model: Arc<dyn ChatModel> = match kind {
        ModelKind::OpenAi => Arc::new(OpenAiClient::from_config(&config.openai, retry)?),
        ModelKind::Ollama => Arc::new(OllamaClient::from_config(&config.ollama, retry)?),
        ModelKind::GigaChat => Arc::new(GigaChatClient::from_config(&config.gigachat, retry)?),
    };
    tracing::debug!("Configured {} ({})", kind, model.model_name());
    Ok(model)
}

/// Clients for every configured speaker, in speaking order. Fails on the
/// first speaker whose credentials are missing.
pub fn build_panel(config: &CouncilConfig) -> Result<Vec<Arc<dyn ChatModel>>> {
    config
        .panel()
        .into_iter()
        .map(|kind| build_model(config, kind))
        .collect()
}
