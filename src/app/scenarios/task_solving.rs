use crate::config::toml_config::AspectAssignment;
use crate::core::checks::{ensure_distinct, ResponseChecks};
use crate::core::conversation::{Panel, Scenario};
use crate::core::prompts;
use crate::domain::model::{DialogueEntry, MessageType, ModelKind, Speaker, Transcript};
use crate::utils::error::{Result, SaphireError};
use async_trait::async_trait;

/// Each model proposes a solution for its own aspect of a task, then every
/// model is asked to combine all proposals into one plan.
pub struct AspectTaskSolving {
    task: String,
    aspects: Vec<AspectAssignment>,
    proposal_checks: ResponseChecks,
    synthesis_checks: ResponseChecks,
}

impl AspectTaskSolving {
    pub fn new(task: impl Into<String>, aspects: Vec<AspectAssignment>, final_min_words: usize) -> Self {
        Self {
            task: task.into(),
            aspects,
            proposal_checks: ResponseChecks::aspect_proposal(),
            synthesis_checks: ResponseChecks::final_synthesis(final_min_words),
        }
    }

    /// Aspects whose model is on the panel, in configured order.
    fn assignments_for(&self, panel: &[ModelKind]) -> Vec<&AspectAssignment> {
        self.aspects
            .iter()
            .filter(|aspect| panel.contains(&aspect.model))
            .collect()
    }
}

#[async_trait]
impl Scenario for AspectTaskSolving {
    fn name(&self) -> &str {
        "task_solving"
    }

    fn planned_calls(&self, panel: &[ModelKind]) -> usize {
        self.assignments_for(panel).len() + panel.len()
    }

    async fn run(&self, panel: &Panel) -> Result<Transcript> {
        let kinds = panel.kinds();
        let assignments = self.assignments_for(&kinds);

        for skipped in self.aspects.iter().filter(|a| !kinds.contains(&a.model)) {
            tracing::warn!(
                "Skipping aspect '{}': {} is not on the panel",
                skipped.description,
                skipped.model
            );
        }
        if assignments.is_empty() {
            return Err(SaphireError::ScenarioError {
                message: "no aspect is assigned to a model on the panel".to_string(),
            });
        }

        let mut transcript = Transcript::new();
        transcript.push(DialogueEntry::system(MessageType::Task, self.task.as_str()));

        let mut solutions = Vec::with_capacity(assignments.len());
        for aspect in assignments {
            let Some(model) = panel.get(aspect.model) else {
                continue;
            };

            let prompt = prompts::propose_aspect(&self.task, &aspect.description);
            let reply = panel.ask(model.as_ref(), &prompt).await;

            self.proposal_checks.verify(aspect.model, &reply)?;

            let reply = reply.into_text();
            panel.announce(
                &format!("Response from model {} for aspect '{}'", aspect.model, aspect.description),
                &reply,
            );
            transcript.push(
                DialogueEntry::reply(aspect.model, MessageType::AspectResponse, reply.clone())
                    .with_aspect(aspect.description.as_str()),
            );
            solutions.push((aspect.label.clone(), reply));
        }

        tracing::info!("🧩 Final discussion of {} solution(s)", solutions.len());
        let final_prompt = prompts::synthesize(&solutions);

        for model in panel.models() {
            let reply = panel.ask(model.as_ref(), &final_prompt).await;

            self.synthesis_checks.verify(model.kind(), &reply)?;

            panel.announce(&format!("Final response from model {}", model.kind()), reply.text());
            transcript.push(DialogueEntry::reply(
                model.kind(),
                MessageType::FinalResponse,
                reply.into_text(),
            ));
        }

        Ok(transcript)
    }

    /// Every model must have written its own final plan.
    fn check_transcript(&self, transcript: &Transcript) -> Result<()> {
        let finals: Vec<(ModelKind, &str)> = transcript
            .replies_of_type(MessageType::FinalResponse)
            .into_iter()
            .filter_map(|entry| match entry.speaker {
                Speaker::Model(kind) => Some((kind, entry.content.as_str())),
                Speaker::System => None,
            })
            .collect();
        ensure_distinct(&finals)?;

        tracing::info!("✅ All models provided unique and meaningful responses in Russian");
        Ok(())
    }
}
