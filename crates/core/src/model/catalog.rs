use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, Validator};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid question catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fixed, ordered sequence of questions shared read-only by every dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parse a catalog from its JSON form: `{"questions": [{"prompt": ..., "validator": ...}]}`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document is not a valid catalog.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(id.value())
    }

    /// Returns true if `id` indexes a question in this catalog.
    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        id.value() < self.questions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .map(|(idx, question)| (QuestionId::new(idx), question))
    }

    /// Built-in Rust fundamentals quiz used when no catalog file is configured.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Question::new(
                "Which keyword declares a variable binding in Rust?\n\
                 1. var\n2. let\n3. def\n4. val",
            )
            .with_validator(Validator::one_of(["2", "let"])),
            Question::new(
                "Which type represents an optional value?\n\
                 1. Result\n2. Maybe\n3. Option\n4. Nullable",
            )
            .with_validator(Validator::one_of(["3", "Option"])),
            Question::new(
                "Which trait must a type implement to be printed with `{}`?\n\
                 1. Debug\n2. Display\n3. ToString\n4. Format",
            )
            .with_validator(Validator::one_of(["2", "Display"])),
            Question::new(
                "How many bits does a `u16` hold? (enter a number)",
            )
            .with_validator(Validator::Integer {
                min: Some(16),
                max: Some(16),
            }),
            Question::new(
                "Which operator propagates an error from a function returning Result?\n\
                 1. !\n2. ?\n3. ::\n4. &",
            )
            .with_validator(Validator::one_of(["2", "?"])),
        ])
    }
}
