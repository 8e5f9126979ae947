use serde::Serialize;
use serde_json::Value;

use quiz_core::model::session::{ANSWERS_KEY, current_question_id};
use quiz_core::model::{QuestionCatalog, QuestionId, SessionError, SessionSnapshot, SessionStore};

/// Aggregated view of dialogue progress, useful for status commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueProgress {
    pub total: usize,
    pub answered: usize,
    pub current_question_id: Option<QuestionId>,
    pub is_started: bool,
}

impl DialogueProgress {
    /// Summarize a stored session against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Malformed` if the stored cursor is not an integer.
    pub fn from_session(
        catalog: &QuestionCatalog,
        session: &SessionSnapshot,
    ) -> Result<Self, SessionError> {
        let current = current_question_id(session)?;
        let answered = match session.get(ANSWERS_KEY) {
            Some(Value::Object(answers)) => answers
                .keys()
                .filter_map(|key| key.parse::<QuestionId>().ok())
                .filter(|id| catalog.contains(*id))
                .count(),
            _ => 0,
        };

        Ok(Self {
            total: catalog.len(),
            answered,
            current_question_id: current
                .and_then(|raw| usize::try_from(raw).ok())
                .map(QuestionId::new)
                .filter(|id| catalog.contains(*id)),
            is_started: current.is_some(),
        })
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}
