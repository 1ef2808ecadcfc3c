use crate::core::checks::ResponseChecks;
use crate::core::conversation::{Panel, Scenario};
use crate::core::prompts;
use crate::domain::model::{DialogueEntry, MessageType, ModelKind, Transcript};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Models take turns continuing a discussion in Russian, each seeing the
/// whole transcript so far.
pub struct RoundRobinDialogue {
    topic: String,
    rounds: usize,
    checks: ResponseChecks,
}

impl RoundRobinDialogue {
    pub fn new(topic: impl Into<String>, rounds: usize) -> Self {
        Self {
            topic: topic.into(),
            rounds,
            checks: ResponseChecks::dialogue_turn(),
        }
    }
}

#[async_trait]
impl Scenario for RoundRobinDialogue {
    fn name(&self) -> &str {
        "russian_dialogue"
    }

    fn planned_calls(&self, panel: &[ModelKind]) -> usize {
        self.rounds * panel.len()
    }

    async fn run(&self, panel: &Panel) -> Result<Transcript> {
        let mut transcript = Transcript::new();
        transcript.push(DialogueEntry::system(MessageType::Topic, self.topic.as_str()));

        for round in 1..=self.rounds {
            tracing::info!("🔁 Round {}/{}", round, self.rounds);

            for model in panel.models() {
                let prompt = prompts::continue_dialogue(&transcript.context());
                let reply = panel.ask(model.as_ref(), &prompt).await;

                self.checks.verify(model.kind(), &reply)?;

                panel.announce(&format!("Response from model {}", model.kind()), reply.text());
                transcript.push(DialogueEntry::reply(
                    model.kind(),
                    MessageType::Response,
                    reply.into_text(),
                ));
            }
        }

        Ok(transcript)
    }
}
