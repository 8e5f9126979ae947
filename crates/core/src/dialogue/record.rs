use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::model::session::ANSWERS_KEY;
use crate::model::{QuestionCatalog, QuestionId, SessionStore};

/// Reasons an answer is not recorded. `Display` is the reply shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("Invalid question ID.")]
    InvalidQuestionId,

    #[error("Invalid answer format for question ID {question_id}.")]
    InvalidAnswerFormat { question_id: QuestionId },
}

/// Validate `answer` against the pending question and store it under `answers`.
///
/// Only `answers` is written, and only on success. `current_question_id` is
/// never touched here.
///
/// # Errors
///
/// Returns `RecordError::InvalidQuestionId` if `current_question_id` is absent,
/// negative, or past the end of the catalog, and
/// `RecordError::InvalidAnswerFormat` if the question's validator rejects the answer.
pub fn record<S>(
    catalog: &QuestionCatalog,
    answer: &str,
    current_question_id: Option<i64>,
    session: &mut S,
) -> Result<QuestionId, RecordError>
where
    S: SessionStore + ?Sized,
{
    let question_id = current_question_id
        .and_then(|raw| usize::try_from(raw).ok())
        .map(QuestionId::new)
        .filter(|id| catalog.contains(*id))
        .ok_or(RecordError::InvalidQuestionId)?;
    let question = catalog
        .get(question_id)
        .ok_or(RecordError::InvalidQuestionId)?;

    if question
        .validator()
        .is_some_and(|validator| !validator.accepts(answer))
    {
        return Err(RecordError::InvalidAnswerFormat { question_id });
    }

    let mut answers = match session.get(ANSWERS_KEY) {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!(value = %other, "discarding malformed answers map");
            Map::new()
        }
    };
    answers.insert(question_id.to_string(), Value::String(answer.to_owned()));
    session.set(ANSWERS_KEY, Value::Object(answers));

    Ok(question_id)
}
