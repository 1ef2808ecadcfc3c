use crate::utils::error::SaphireError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chat backend that can take part in a dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    #[serde(rename = "gigachat")]
    GigaChat,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::OpenAi, ModelKind::Ollama, ModelKind::GigaChat];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::OpenAi => "openai",
            ModelKind::Ollama => "ollama",
            ModelKind::GigaChat => "gigachat",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = SaphireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelKind::OpenAi),
            "ollama" => Ok(ModelKind::Ollama),
            "gigachat" => Ok(ModelKind::GigaChat),
            other => Err(SaphireError::InvalidConfigValueError {
                field: "model".to_string(),
                value: other.to_string(),
                reason: "Expected one of: openai, ollama, gigachat".to_string(),
            }),
        }
    }
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Speaker {
    #[default]
    System,
    Model(ModelKind),
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::System => "system",
            Speaker::Model(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    Topic,
    Task,
    Response,
    AspectResponse,
    FinalResponse,
    #[default]
    Message,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Topic => "topic",
            MessageType::Task => "task",
            MessageType::Response => "response",
            MessageType::AspectResponse => "aspect_response",
            MessageType::FinalResponse => "final_response",
            MessageType::Message => "message",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DialogueEntry {
    pub speaker: Speaker,
    pub message_type: MessageType,
    pub content: String,
    pub aspect: Option<String>,
}

impl DialogueEntry {
    pub fn system(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            message_type,
            content: content.into(),
            aspect: None,
        }
    }

    pub fn reply(model: ModelKind, message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Model(model),
            message_type,
            content: content.into(),
            aspect: None,
        }
    }

    pub fn with_aspect(mut self, aspect: impl Into<String>) -> Self {
        self.aspect = Some(aspect.into());
        self
    }
}

/// What came back from asking a model. A failed call keeps the error text
/// so it can be shown, but is never mistaken for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answered(String),
    Failed(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answered(text) | Reply::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Answered(text) | Reply::Failed(text) => text,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }
}

/// Ordered record of one scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<DialogueEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DialogueEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DialogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every message so far, one per line, as fed back to the next speaker.
    pub fn context(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn replies_of_type(&self, message_type: MessageType) -> Vec<&DialogueEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.message_type == message_type)
            .collect()
    }
}

/// A row of `model_dialogues` as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub test_name: String,
    pub timestamp: String,
    pub model_name: String,
    pub message_type: String,
    pub message_content: String,
    pub aspect: Option<String>,
    pub sequence_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub test_name: String,
    pub timestamp: String,
}
