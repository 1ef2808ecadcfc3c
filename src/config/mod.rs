#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, RunArgs, ScenarioChoice};
pub use toml_config::{AspectAssignment, CouncilConfig};
