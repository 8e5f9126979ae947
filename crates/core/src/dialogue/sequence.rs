use crate::model::{QuestionCatalog, QuestionId};

/// The question to ask after the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextQuestion {
    pub id: QuestionId,
    pub prompt: String,
}

/// Work out which question follows `current_question_id`.
///
/// Absent or negative ids start the sequence at question 0. Returns `None`
/// once the sequence runs past the last question; there is no other way out.
#[must_use]
pub fn next(catalog: &QuestionCatalog, current_question_id: Option<i64>) -> Option<NextQuestion> {
    let id = match current_question_id {
        None => QuestionId::new(0),
        Some(raw) if raw < 0 => QuestionId::new(0),
        Some(raw) => QuestionId::new(usize::try_from(raw).ok()?).next(),
    };

    catalog.get(id).map(|question| NextQuestion {
        id,
        prompt: question.prompt().to_owned(),
    })
}
