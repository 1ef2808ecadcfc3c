use crate::domain::model::ModelKind;
use crate::utils::error::{Result, SaphireError};
use crate::utils::validation::{
    validate_aspects, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_unique_models, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
pub const DEFAULT_GIGACHAT_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_GIGACHAT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_GIGACHAT_MODEL: &str = "GigaChat";
pub const DEFAULT_GIGACHAT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_DATABASE_PATH: &str = "saphire.db";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

pub const DEFAULT_TOPIC: &str = "Let's discuss the importance of collaboration between different language models \
for solving complex tasks. How can we best utilize the strengths of each model?";

pub const DEFAULT_TASK: &str = "Task: Develop a concept for an educational platform for children.
Each model should propose a solution for the following aspects:
1. Technical aspect
2. Pedagogical aspect
3. User experience aspect";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouncilConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub gigachat: GigaChatConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub task: TaskConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GigaChatConfig {
    /// Base64 authorization key issued by the GigaChat developer console.
    pub credentials: Option<String>,
    pub base_url: Option<String>,
    pub auth_url: Option<String>,
    pub model: Option<String>,
    pub scope: Option<String>,
    pub verify_ssl_certs: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueConfig {
    pub topic: Option<String>,
    pub rounds: Option<usize>,
    pub models: Option<Vec<ModelKind>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    pub task: Option<String>,
    pub aspects: Option<Vec<AspectAssignment>>,
    pub final_min_words: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectAssignment {
    pub model: ModelKind,
    /// Short name used when quoting the solution back, e.g. "Technical".
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

/// `None` for unset, blank, or still-unsubstituted `${VAR}` values.
fn resolved(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.contains("${"))
}

fn fill_from(slot: &mut Option<String>, var: &str, lookup: &impl Fn(&str) -> Option<String>) {
    if resolved(slot).is_some() {
        return;
    }
    if let Some(value) = lookup(var) {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

pub fn default_aspects() -> Vec<AspectAssignment> {
    vec![
        AspectAssignment {
            model: ModelKind::OpenAi,
            label: "Technical".to_string(),
            description: "technical aspect of the platform".to_string(),
        },
        AspectAssignment {
            model: ModelKind::Ollama,
            label: "Pedagogical".to_string(),
            description: "pedagogical aspect of the platform".to_string(),
        },
        AspectAssignment {
            model: ModelKind::GigaChat,
            label: "UX".to_string(),
            description: "user experience aspect".to_string(),
        },
    ]
}

impl OpenAiConfig {
    pub fn api_key(&self) -> Result<&str> {
        resolved(&self.api_key).ok_or_else(|| SaphireError::MissingConfigError {
            field: "openai.api_key (OPENAI_API_KEY)".to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        resolved(&self.base_url).unwrap_or(DEFAULT_OPENAI_URL)
    }

    pub fn model(&self) -> &str {
        resolved(&self.model).unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> &str {
        resolved(&self.base_url).unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn model(&self) -> &str {
        resolved(&self.model).unwrap_or(DEFAULT_OLLAMA_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl GigaChatConfig {
    pub fn credentials(&self) -> Result<&str> {
        resolved(&self.credentials).ok_or_else(|| SaphireError::MissingConfigError {
            field: "gigachat.credentials (GIGACHAT_API_KEY)".to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        resolved(&self.base_url).unwrap_or(DEFAULT_GIGACHAT_URL)
    }

    pub fn auth_url(&self) -> &str {
        resolved(&self.auth_url).unwrap_or(DEFAULT_GIGACHAT_AUTH_URL)
    }

    pub fn model(&self) -> &str {
        resolved(&self.model).unwrap_or(DEFAULT_GIGACHAT_MODEL)
    }

    pub fn scope(&self) -> &str {
        resolved(&self.scope).unwrap_or(DEFAULT_GIGACHAT_SCOPE)
    }

    /// Off unless enabled: the public endpoints use a certificate chain most
    /// system trust stores do not carry.
    pub fn verify_ssl_certs(&self) -> bool {
        self.verify_ssl_certs.unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl CouncilConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SaphireError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Defaults plus whatever the environment provides.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_fallbacks(lookup);
        config
    }

    /// 替換環境變數 (例如 ${API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Fills settings the file left unset from the conventional environment
    /// variables. Values present in the file win.
    pub fn apply_env_fallbacks(&mut self) {
        self.apply_fallbacks(|var| std::env::var(var).ok());
    }

    /// `apply_env_fallbacks` with an arbitrary variable source.
    pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fill_from(&mut self.openai.api_key, "OPENAI_API_KEY", &lookup);
        fill_from(&mut self.openai.base_url, "OPENAI_API_URL", &lookup);
        fill_from(&mut self.openai.model, "OPENAI_MODEL", &lookup);
        fill_from(&mut self.ollama.base_url, "OLLAMA_API_URL", &lookup);
        fill_from(&mut self.ollama.model, "OLLAMA_MODEL", &lookup);
        fill_from(&mut self.gigachat.credentials, "GIGACHAT_API_KEY", &lookup);
        fill_from(&mut self.gigachat.base_url, "GIGACHAT_API_URL", &lookup);
        fill_from(&mut self.gigachat.model, "MYGIGACHAT_MODEL", &lookup);
        fill_from(&mut self.storage.database_path, "SAPHIRE_DB", &lookup);
    }

    pub fn database_path(&self) -> &str {
        resolved(&self.storage.database_path).unwrap_or(DEFAULT_DATABASE_PATH)
    }

    /// Speaking order for every scenario.
    pub fn panel(&self) -> Vec<ModelKind> {
        match &self.dialogue.models {
            Some(models) if !models.is_empty() => models.clone(),
            _ => ModelKind::ALL.to_vec(),
        }
    }

    pub fn topic(&self) -> &str {
        resolved(&self.dialogue.topic).unwrap_or(DEFAULT_TOPIC)
    }

    pub fn rounds(&self) -> usize {
        self.dialogue.rounds.unwrap_or(3)
    }

    pub fn task(&self) -> &str {
        resolved(&self.task.task).unwrap_or(DEFAULT_TASK)
    }

    pub fn aspects(&self) -> Vec<AspectAssignment> {
        match &self.task.aspects {
            Some(aspects) if !aspects.is_empty() => aspects.clone(),
            _ => default_aspects(),
        }
    }

    pub fn final_min_words(&self) -> usize {
        self.task.final_min_words.unwrap_or(20)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("openai.base_url", self.openai.base_url())?;
        validate_url("ollama.base_url", self.ollama.base_url())?;
        validate_url("gigachat.base_url", self.gigachat.base_url())?;
        validate_url("gigachat.auth_url", self.gigachat.auth_url())?;
        validate_path("storage.database_path", self.database_path())?;

        validate_positive_number("dialogue.rounds", self.rounds(), 1)?;
        validate_non_empty_string("dialogue.topic", self.topic())?;
        validate_non_empty_string("task.task", self.task())?;

        if let Some(attempts) = self.retry.attempts {
            validate_range("retry.attempts", attempts, 0, 10)?;
        }

        validate_unique_models("dialogue.models", &self.panel())?;
        validate_aspects("task.aspects", &self.aspects())?;

        Ok(())
    }
}

impl Validate for CouncilConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
