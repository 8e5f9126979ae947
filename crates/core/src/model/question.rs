use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

//
// ─── VALIDATOR ────────────────────────────────────────────────────────────────
//

/// Predicate deciding whether a raw answer is acceptable for a question.
///
/// The same predicate gates recording (a rejected answer is not stored) and
/// scoring (a stored answer counts as correct only if it still passes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    /// Any answer with at least one non-whitespace character.
    NonEmpty,
    /// The trimmed answer must equal `expected`.
    Exact {
        expected: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    /// The trimmed answer must equal one of `options`.
    OneOf {
        options: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
    /// The trimmed answer must parse as an integer within the optional bounds.
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    /// Arbitrary predicate supplied in code. Not representable in a catalog file.
    #[serde(skip)]
    Custom(CustomValidator),
}

impl Validator {
    /// Wrap a closure as a validator.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(CustomValidator(Arc::new(predicate)))
    }

    #[must_use]
    pub fn exact(expected: impl Into<String>) -> Self {
        Self::Exact {
            expected: expected.into(),
            case_sensitive: false,
        }
    }

    #[must_use]
    pub fn one_of<I, T>(options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::OneOf {
            options: options.into_iter().map(Into::into).collect(),
            case_sensitive: false,
        }
    }

    /// Returns true if `answer` passes this validator.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        match self {
            Validator::NonEmpty => !answer.trim().is_empty(),
            Validator::Exact {
                expected,
                case_sensitive,
            } => text_matches(answer, expected, *case_sensitive),
            Validator::OneOf {
                options,
                case_sensitive,
            } => options
                .iter()
                .any(|option| text_matches(answer, option, *case_sensitive)),
            Validator::Integer { min, max } => match answer.trim().parse::<i64>() {
                Ok(value) => {
                    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
                }
                Err(_) => false,
            },
            Validator::Custom(custom) => (custom.0)(answer),
        }
    }
}

fn text_matches(answer: &str, expected: &str, case_sensitive: bool) -> bool {
    let answer = answer.trim();
    let expected = expected.trim();
    if case_sensitive {
        answer == expected
    } else {
        answer.to_lowercase() == expected.to_lowercase()
    }
}

/// Shared closure behind `Validator::Custom`.
#[derive(Clone)]
pub struct CustomValidator(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Immutable catalog entry. Its id is its position in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validator: Option<Validator>,
}

impl Question {
    /// A question without a validator; every answer is accepted but none is scored.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            validator: None,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }
}
