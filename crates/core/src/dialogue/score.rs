use std::fmt;

use serde_json::Value;
use tracing::warn;

use crate::model::session::ANSWERS_KEY;
use crate::model::{QuestionCatalog, QuestionId, SessionStore};

/// Reply sent instead of a score when the catalog has no questions.
pub const EMPTY_CATALOG_MESSAGE: &str = "No questions configured.";

/// Result of re-checking every stored answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    correct: usize,
    total: usize,
}

impl Score {
    /// Build a score; `None` when `total` is zero.
    #[must_use]
    pub fn new(correct: usize, total: usize) -> Option<Self> {
        (total > 0).then_some(Self { correct, total })
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        self.correct as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quiz Completed!\nYou answered {} out of {} questions correctly.\nYour score is {:.2}%.",
            self.correct,
            self.total,
            self.percentage()
        )
    }
}

/// Count stored answers that still pass their question's validator.
///
/// Questions without a validator never count. Entries that do not map to a
/// catalog question are skipped. Returns `None` for an empty catalog.
#[must_use]
pub fn score<S>(catalog: &QuestionCatalog, session: &S) -> Option<Score>
where
    S: SessionStore + ?Sized,
{
    let correct = match session.get(ANSWERS_KEY) {
        Some(Value::Object(answers)) => answers
            .iter()
            .filter(|(key, answer)| is_correct(catalog, key, answer))
            .count(),
        _ => 0,
    };
    Score::new(correct, catalog.len())
}

fn is_correct(catalog: &QuestionCatalog, key: &str, answer: &Value) -> bool {
    let Some(question) = key
        .parse::<QuestionId>()
        .ok()
        .and_then(|id| catalog.get(id))
    else {
        warn!(key, "skipping answer for unknown question");
        return false;
    };
    let Some(answer) = answer.as_str() else {
        warn!(key, "skipping non-text answer");
        return false;
    };
    question
        .validator()
        .is_some_and(|validator| validator.accepts(answer))
}

/// Render the final report for the answers stored in `session`.
#[must_use]
pub fn finalize<S>(catalog: &QuestionCatalog, session: &S) -> String
where
    S: SessionStore + ?Sized,
{
    score(catalog, session).map_or_else(|| EMPTY_CATALOG_MESSAGE.to_owned(), |s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, SessionSnapshot, Validator};
    use serde_json::json;

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            Question::new("Q0").with_validator(Validator::exact("a")),
            Question::new("Q1").with_validator(Validator::exact("b")),
            Question::new("Q2"),
        ])
    }

    #[test]
    fn counts_only_validated_answers() {
        let mut session = SessionSnapshot::new();
        session.set(ANSWERS_KEY, json!({"0": "a", "1": "wrong", "2": "free text"}));

        let score = score(&catalog(), &session).unwrap();

        assert_eq!(score.correct(), 1);
        assert_eq!(score.total(), 3);
        assert_eq!(
            finalize(&catalog(), &session),
            "Quiz Completed!\nYou answered 1 out of 3 questions correctly.\nYour score is 33.33%."
        );
    }

    #[test]
    fn missing_answers_score_zero() {
        let session = SessionSnapshot::new();
        assert_eq!(
            finalize(&catalog(), &session),
            "Quiz Completed!\nYou answered 0 out of 3 questions correctly.\nYour score is 0.00%."
        );
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let catalog = QuestionCatalog::new(
            (0..3)
                .map(|_| Question::new("Q").with_validator(Validator::NonEmpty))
                .collect(),
        );
        let mut session = SessionSnapshot::new();
        session.set(ANSWERS_KEY, json!({"0": "x", "1": "y"}));

        assert!(finalize(&catalog, &session).ends_with("Your score is 66.67%."));
    }

    #[test]
    fn skips_unknown_keys_and_non_text_answers() {
        let mut session = SessionSnapshot::new();
        session.set(ANSWERS_KEY, json!({"7": "a", "zero": "a", "0": 1, "1": "b"}));

        assert_eq!(score(&catalog(), &session).map(|s| s.correct()), Some(1));
    }

    #[test]
    fn finalize_is_deterministic() {
        let mut session = SessionSnapshot::new();
        session.set(ANSWERS_KEY, json!({"0": "a", "1": "b"}));

        assert_eq!(finalize(&catalog(), &session), finalize(&catalog(), &session));
    }

    #[test]
    fn empty_catalog_is_guarded() {
        let session = SessionSnapshot::new();
        assert_eq!(score(&QuestionCatalog::default(), &session), None);
        assert_eq!(
            finalize(&QuestionCatalog::default(), &session),
            EMPTY_CATALOG_MESSAGE
        );
    }
}
