use crate::domain::model::{DialogueEntry, ModelKind, RunSummary, StoredMessage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A chat backend answering one user prompt at a time.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Backend-side model identifier, e.g. `gpt-4o-mini`.
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait DialogueStore: Send + Sync {
    fn save_dialogue(&self, test_name: &str, entries: &[DialogueEntry]) -> Result<()>;
    fn get_dialogue(&self, test_name: &str) -> Result<Vec<StoredMessage>>;
    fn latest_runs(&self, limit: usize) -> Result<Vec<RunSummary>>;
}
