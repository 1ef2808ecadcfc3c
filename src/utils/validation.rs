use crate::config::toml_config::AspectAssignment;
use crate::domain::model::ModelKind;
use crate::utils::error::{Result, SaphireError};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SaphireError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SaphireError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// A model may speak only once per turn of the panel.
pub fn validate_unique_models(field_name: &str, models: &[ModelKind]) -> Result<()> {
    let mut seen = HashSet::new();
    for model in models {
        if !seen.insert(*model) {
            return Err(SaphireError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: model.to_string(),
                reason: "Each model may appear only once".to_string(),
            });
        }
    }
    Ok(())
}

/// Labels name each proposal in the synthesis prompt, so they must be set
/// and distinct.
pub fn validate_aspects(field_name: &str, aspects: &[AspectAssignment]) -> Result<()> {
    let mut labels = HashSet::new();
    for aspect in aspects {
        validate_non_empty_string(&format!("{}.label", field_name), &aspect.label)?;
        validate_non_empty_string(&format!("{}.description", field_name), &aspect.description)?;

        if !labels.insert(aspect.label.trim().to_lowercase()) {
            return Err(SaphireError::InvalidConfigValueError {
                field: format!("{}.label", field_name),
                value: aspect.label.clone(),
                reason: "Aspect labels must be unique".to_string(),
            });
        }
    }
    Ok(())
}
