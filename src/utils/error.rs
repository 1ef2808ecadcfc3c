use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaphireError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("{provider} request failed with status {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected response format from {provider}: {message}")]
    ResponseFormatError { provider: String, message: String },

    #[error("Reply from {model} failed check '{check}': {detail}")]
    CheckFailed {
        model: String,
        check: String,
        detail: String,
    },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Scenario error: {message}")]
    ScenarioError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Provider,
    Storage,
    Configuration,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Transient; running again later may succeed.
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that ended with this severity.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SaphireError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SaphireError::HttpError(_) => ErrorCategory::Network,
            SaphireError::ProviderError { .. } | SaphireError::ResponseFormatError { .. } => {
                ErrorCategory::Provider
            }
            SaphireError::DatabaseError(_)
            | SaphireError::IoError(_)
            | SaphireError::StorageError { .. } => ErrorCategory::Storage,
            SaphireError::ConfigError { .. }
            | SaphireError::ConfigValidationError { .. }
            | SaphireError::InvalidConfigValueError { .. }
            | SaphireError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SaphireError::CheckFailed { .. } => ErrorCategory::Validation,
            SaphireError::SerializationError(_) | SaphireError::ScenarioError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SaphireError::HttpError(_) => ErrorSeverity::Medium,
            SaphireError::ProviderError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            SaphireError::DatabaseError(_)
            | SaphireError::IoError(_)
            | SaphireError::StorageError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SaphireError::HttpError(_) => {
                "Check that the model endpoint is reachable and try again".to_string()
            }
            SaphireError::ProviderError { provider, status, .. } => match status {
                401 | 403 => format!("Check the API credentials configured for {}", provider),
                404 => format!("Check the base URL and model name configured for {}", provider),
                429 => format!("{} is rate limiting requests; wait and retry", provider),
                _ => format!("{} is unavailable; retry later", provider),
            },
            SaphireError::ResponseFormatError { provider, .. } => format!(
                "Make sure the endpoint configured for {} speaks the expected API",
                provider
            ),
            SaphireError::DatabaseError(_) | SaphireError::StorageError { .. } => {
                "Check that the database file is writable and not locked by another process"
                    .to_string()
            }
            SaphireError::IoError(_) => "Check file paths and permissions".to_string(),
            SaphireError::MissingConfigError { field } => format!(
                "Set '{}' in the config file or through the matching environment variable",
                field
            ),
            SaphireError::ConfigError { .. }
            | SaphireError::ConfigValidationError { .. }
            | SaphireError::InvalidConfigValueError { .. } => {
                "Run `saphire check-config` to inspect the effective configuration".to_string()
            }
            SaphireError::CheckFailed { model, .. } => format!(
                "Inspect the reply from {} with --verbose; the model may need a different prompt or model version",
                model
            ),
            SaphireError::SerializationError(_) | SaphireError::ScenarioError { .. } => {
                "Re-run with --verbose for details".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a model endpoint: {}", self),
            ErrorCategory::Provider => format!("A model backend returned an error: {}", self),
            ErrorCategory::Storage => format!("Dialogue storage failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Validation => format!("A model reply was rejected: {}", self),
            ErrorCategory::Internal => format!("Unexpected error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SaphireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_severity_depends_on_status() {
        let rate_limited = SaphireError::ProviderError {
            provider: "openai".to_string(),
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(rate_limited.severity(), ErrorSeverity::Medium);
        assert!(rate_limited.is_retryable());

        let unauthorized = SaphireError::ProviderError {
            provider: "openai".to_string(),
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(unauthorized.severity(), ErrorSeverity::High);
        assert!(unauthorized.recovery_suggestion().contains("credentials"));
    }

    #[test]
    fn test_check_failure_is_validation() {
        let err = SaphireError::CheckFailed {
            model: "ollama".to_string(),
            check: "has_cyrillic".to_string(),
            detail: "no Cyrillic letters".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_friendly_message().contains("ollama"));
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let failed_check = SaphireError::CheckFailed {
            model: "gigachat".to_string(),
            check: "backend_ok".to_string(),
            detail: "backend call failed".to_string(),
        };
        let unavailable = SaphireError::ProviderError {
            provider: "ollama".to_string(),
            status: 503,
            message: "loading model".to_string(),
        };
        let storage = SaphireError::StorageError {
            message: "disk full".to_string(),
        };

        assert_eq!(failed_check.severity().exit_code(), 1);
        assert_eq!(unavailable.severity().exit_code(), 2);
        assert_eq!(storage.severity().exit_code(), 3);
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = SaphireError::StorageError {
            message: "poisoned".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Storage);
    }
}
