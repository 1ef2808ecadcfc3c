use crate::config::toml_config::CouncilConfig;
use crate::domain::model::ModelKind;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "saphire")]
#[command(about = "Let several language models hold a dialogue, check their replies and keep the transcripts")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides storage.database_path)
    #[arg(long)]
    pub db: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log CPU and memory usage between phases
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one or all dialogue scenarios
    Run(RunArgs),
    /// Print the most recent stored dialogues
    View {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Create the dialogue table if it does not exist
    InitDb,
    /// Validate and print the effective configuration
    CheckConfig,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = ScenarioChoice::All)]
    pub scenario: ScenarioChoice,

    /// Comma-separated speaking order, e.g. openai,ollama
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Override dialogue.rounds
    #[arg(long)]
    pub rounds: Option<usize>,

    /// Show what would run without calling any model
    #[arg(long)]
    pub dry_run: bool,

    /// Do not print each reply as it arrives
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioChoice {
    RussianDialogue,
    TaskSolving,
    All,
}

impl CliConfig {
    /// File (or defaults), then environment fallbacks, then command-line overrides.
    pub fn load_config(&self) -> Result<CouncilConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                CouncilConfig::from_file(path)?
            }
            None => CouncilConfig::default(),
        };
        config.apply_env_fallbacks();

        if let Some(db) = &self.db {
            config.storage.database_path = Some(db.clone());
        }

        if self.monitor {
            config.monitoring = Some(crate::config::toml_config::MonitoringConfig { enabled: true });
        }

        if let Command::Run(run) = &self.command {
            if !run.models.is_empty() {
                let models = run
                    .models
                    .iter()
                    .map(|m| m.parse::<ModelKind>())
                    .collect::<Result<Vec<_>>>()?;
                config.dialogue.models = Some(models);
            }
            if let Some(rounds) = run.rounds {
                config.dialogue.rounds = Some(rounds);
            }
        }

        Ok(config)
    }
}
