pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{build_panel, SqliteStore};
pub use config::CouncilConfig;
pub use crate::core::{ConversationEngine, Panel, RunReport, Scenario};
pub use domain::model::{DialogueEntry, MessageType, ModelKind, Reply, Transcript};
pub use utils::error::{Result, SaphireError};
