use crate::domain::model::{ModelKind, Reply};
use crate::utils::error::{Result, SaphireError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CYRILLIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[а-яА-Я]").expect("cyrillic pattern is valid"));

/// A textual property a model reply must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The backend answered at all.
    BackendOk,
    NonEmpty,
    HasLetters,
    HasCyrillic,
    MinWords(usize),
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::BackendOk => "backend_ok",
            Check::NonEmpty => "non_empty",
            Check::HasLetters => "has_letters",
            Check::HasCyrillic => "has_cyrillic",
            Check::MinWords(_) => "min_words",
        }
    }

    /// `Err` carries a human-readable reason.
    pub fn evaluate(&self, reply: &Reply) -> std::result::Result<(), String> {
        if let Reply::Failed(error) = reply {
            return Err(format!("backend call failed: {}", error));
        }
        let reply = reply.text();

        match self {
            Check::BackendOk => Ok(()),
            Check::NonEmpty => {
                if reply.trim().is_empty() {
                    Err("reply is empty".to_string())
                } else {
                    Ok(())
                }
            }
            Check::HasLetters => {
                if reply.chars().any(char::is_alphabetic) {
                    Ok(())
                } else {
                    Err("reply contains no letters".to_string())
                }
            }
            Check::HasCyrillic => {
                if CYRILLIC.is_match(reply) {
                    Ok(())
                } else {
                    Err("reply is not in Russian (no Cyrillic letters)".to_string())
                }
            }
            Check::MinWords(min) => {
                let words = reply.split_whitespace().count();
                if words >= *min {
                    Ok(())
                } else {
                    Err(format!("reply is too short ({} words, need at least {})", words, min))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChecks {
    checks: Vec<Check>,
}

impl ResponseChecks {
    pub fn new(checks: impl Into<Vec<Check>>) -> Self {
        Self {
            checks: checks.into(),
        }
    }

    pub fn dialogue_turn() -> Self {
        Self::new([
            Check::BackendOk,
            Check::NonEmpty,
            Check::HasLetters,
            Check::HasCyrillic,
        ])
    }

    pub fn aspect_proposal() -> Self {
        Self::new([Check::BackendOk, Check::NonEmpty, Check::HasCyrillic])
    }

    pub fn final_synthesis(min_words: usize) -> Self {
        Self::new([
            Check::BackendOk,
            Check::NonEmpty,
            Check::HasCyrillic,
            Check::MinWords(min_words),
        ])
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Stops at the first failing check. A failed call fails the first check
    /// whatever its error text contains.
    pub fn verify(&self, model: ModelKind, reply: &Reply) -> Result<()> {
        for check in &self.checks {
            if let Err(detail) = check.evaluate(reply) {
                tracing::warn!("❌ {} failed {}: {}", model, check.name(), detail);
                return Err(SaphireError::CheckFailed {
                    model: model.to_string(),
                    check: check.name().to_string(),
                    detail,
                });
            }
        }
        tracing::debug!("✅ {} passed {} checks", model, self.checks.len());
        Ok(())
    }
}

/// Every model must have said something different.
pub fn ensure_distinct(replies: &[(ModelKind, &str)]) -> Result<()> {
    let mut seen = HashSet::new();
    for (model, reply) in replies {
        if !seen.insert(*reply) {
            return Err(SaphireError::CheckFailed {
                model: model.to_string(),
                check: "all_unique".to_string(),
                detail: "final reply repeats another model's reply".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(text: &str) -> Reply {
        Reply::Answered(text.to_string())
    }

    #[test]
    fn test_non_empty_and_letters() {
        assert!(Check::NonEmpty.evaluate(&answered("")).is_err());
        assert!(Check::NonEmpty.evaluate(&answered("  \n")).is_err());
        assert!(Check::NonEmpty.evaluate(&answered("ok")).is_ok());

        assert!(Check::HasLetters.evaluate(&answered("1234 !!")).is_err());
        assert!(Check::HasLetters.evaluate(&answered("42 ответа")).is_ok());
    }

    #[test]
    fn test_cyrillic_detection() {
        assert!(Check::HasCyrillic.evaluate(&answered("Давайте обсудим")).is_ok());
        assert!(Check::HasCyrillic.evaluate(&answered("Let's discuss")).is_err());
    }

    #[test]
    fn test_min_words() {
        assert!(Check::MinWords(3).evaluate(&answered("один два три")).is_ok());
        let err = Check::MinWords(3).evaluate(&answered("один два")).unwrap_err();
        assert!(err.contains("2 words"));
    }

    #[test]
    fn test_verify_reports_first_failure() {
        let checks = ResponseChecks::final_synthesis(20);
        match checks.verify(ModelKind::GigaChat, &answered("Коротко.")) {
            Err(SaphireError::CheckFailed { model, check, .. }) => {
                assert_eq!(model, "gigachat");
                assert_eq!(check, "min_words");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(ResponseChecks::dialogue_turn()
            .verify(ModelKind::OpenAi, &answered("Предлагаю разделить задачи."))
            .is_ok());
    }

    #[test]
    fn test_failed_call_with_russian_error_text_is_rejected() {
        let reply = Reply::Failed(
            "Error getting response from gigachat: gigachat request failed with status 500: \
             Внутренняя ошибка сервера, попробуйте позже"
                .to_string(),
        );

        for checks in [
            ResponseChecks::dialogue_turn(),
            ResponseChecks::aspect_proposal(),
            ResponseChecks::final_synthesis(3),
        ] {
            match checks.verify(ModelKind::GigaChat, &reply) {
                Err(SaphireError::CheckFailed { check, detail, .. }) => {
                    assert_eq!(check, "backend_ok");
                    assert!(detail.contains("Внутренняя ошибка"));
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_ensure_distinct() {
        let unique = [(ModelKind::OpenAi, "а"), (ModelKind::Ollama, "б")];
        assert!(ensure_distinct(&unique).is_ok());

        let repeated = [
            (ModelKind::OpenAi, "план"),
            (ModelKind::Ollama, "другой план"),
            (ModelKind::GigaChat, "план"),
        ];
        match ensure_distinct(&repeated) {
            Err(SaphireError::CheckFailed { model, check, .. }) => {
                assert_eq!(model, "gigachat");
                assert_eq!(check, "all_unique");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
