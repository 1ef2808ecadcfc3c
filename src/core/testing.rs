//! In-process `ChatModel` doubles for unit tests.

use crate::core::conversation::Panel;
use crate::domain::model::ModelKind;
use crate::domain::ports::ChatModel;
use crate::utils::error::{Result, SaphireError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub(crate) struct ScriptedModel {
    kind: ModelKind,
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Answers with `replies` in order; the last one repeats once exhausted.
    pub fn replying(kind: ModelKind, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            kind,
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ModelKind, message: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            replies: Mutex::new(VecDeque::new()),
            failure: Some(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(message) = &self.failure {
            return Err(SaphireError::ScenarioError {
                message: message.clone(),
            });
        }

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        Ok(reply.unwrap_or_default())
    }
}

pub(crate) fn panel_of(models: &[Arc<ScriptedModel>]) -> Panel {
    Panel::new(
        models
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn ChatModel>)
            .collect(),
    )
}
