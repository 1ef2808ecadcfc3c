use crate::app::report::section_banner;
use crate::domain::model::{ModelKind, Reply, Transcript};
use crate::domain::ports::{ChatModel, DialogueStore};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The models taking part in a run, in speaking order.
pub struct Panel {
    models: Vec<Arc<dyn ChatModel>>,
    echo: bool,
}

impl Panel {
    pub fn new(models: Vec<Arc<dyn ChatModel>>) -> Self {
        Self {
            models,
            echo: false,
        }
    }

    /// Print each reply to stdout as it arrives.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn models(&self) -> &[Arc<dyn ChatModel>] {
        &self.models
    }

    pub fn kinds(&self) -> Vec<ModelKind> {
        self.models.iter().map(|m| m.kind()).collect()
    }

    pub fn get(&self, kind: ModelKind) -> Option<&Arc<dyn ChatModel>> {
        self.models.iter().find(|m| m.kind() == kind)
    }

    /// Never fails: a backend error comes back as `Reply::Failed`, which the
    /// reply checks reject whatever its text says.
    pub async fn ask(&self, model: &dyn ChatModel, prompt: &str) -> Reply {
        tracing::debug!("Prompting {} ({} chars)", model.kind(), prompt.chars().count());
        match model.complete(prompt).await {
            Ok(reply) => Reply::Answered(reply),
            Err(e) => {
                tracing::warn!("⚠️ {} call failed: {}", model.kind(), e);
                Reply::Failed(format!("Error getting response from {}: {}", model.kind(), e))
            }
        }
    }

    pub fn announce(&self, title: &str, body: &str) {
        if self.echo {
            println!("{}", section_banner(title, body));
        }
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    /// Prefix of the stored test name, e.g. `russian_dialogue`.
    fn name(&self) -> &str;

    /// Number of model calls a run will make with `panel`, for dry runs.
    fn planned_calls(&self, panel: &[ModelKind]) -> usize;

    /// `Err` aborts the run and nothing is stored.
    async fn run(&self, panel: &Panel) -> Result<Transcript>;

    /// Checks over the finished transcript. Runs after it has been stored,
    /// so a run that fails here is still kept for inspection.
    fn check_transcript(&self, _transcript: &Transcript) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub test_name: String,
    pub entries: usize,
    pub duration: Duration,
}

pub fn test_name_for(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Runs scenarios against a panel and stores each transcript that passes.
pub struct ConversationEngine<S: DialogueStore> {
    store: S,
    panel: Panel,
    monitor: SystemMonitor,
}

impl<S: DialogueStore> ConversationEngine<S> {
    pub fn new(store: S, panel: Panel) -> Self {
        Self::new_with_monitoring(store, panel, false)
    }

    pub fn new_with_monitoring(store: S, panel: Panel, monitor_enabled: bool) -> Self {
        Self {
            store,
            panel,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// A transcript is saved once every reply passed its checks, then
    /// checked as a whole.
    pub async fn run(&self, scenario: &dyn Scenario) -> Result<RunReport> {
        let test_name = test_name_for(scenario.name(), Local::now());
        let started = Instant::now();

        tracing::info!(
            "🚀 Starting {} with {} model(s)",
            test_name,
            self.panel.models().len()
        );
        self.monitor.log_stats("Before dialogue");

        let transcript = match scenario.run(&self.panel).await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::error!("❌ {} aborted: {}", test_name, e);
                self.monitor.log_final_stats();
                return Err(e);
            }
        };
        self.monitor.log_stats("After dialogue");

        self.store.save_dialogue(&test_name, transcript.entries())?;
        tracing::info!(
            "💾 Saved {} entries for {}",
            transcript.len(),
            test_name
        );
        self.monitor.log_final_stats();

        if let Err(e) = scenario.check_transcript(&transcript) {
            tracing::error!("❌ {} failed after saving: {}", test_name, e);
            return Err(e);
        }

        Ok(RunReport {
            test_name,
            entries: transcript.len(),
            duration: started.elapsed(),
        })
    }
}
