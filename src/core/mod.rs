pub mod checks;
pub mod conversation;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{DialogueEntry, MessageType, ModelKind, Reply, Transcript};
pub use crate::domain::ports::{ChatModel, DialogueStore};
pub use crate::utils::error::Result;
pub use conversation::{ConversationEngine, Panel, RunReport, Scenario};
