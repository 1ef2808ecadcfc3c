pub mod round_robin;
pub mod task_solving;

pub use round_robin::RoundRobinDialogue;
pub use task_solving::AspectTaskSolving;

use crate::config::toml_config::CouncilConfig;
use crate::core::conversation::Scenario;

pub fn russian_dialogue(config: &CouncilConfig) -> Box<dyn Scenario> {
    Box::new(RoundRobinDialogue::new(config.topic(), config.rounds()))
}

pub fn task_solving(config: &CouncilConfig) -> Box<dyn Scenario> {
    Box::new(AspectTaskSolving::new(
        config.task(),
        config.aspects(),
        config.final_min_words(),
    ))
}
