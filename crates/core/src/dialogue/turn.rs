use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::record::{RecordError, record};
use super::score::finalize;
use super::sequence::next;
use crate::model::session::{CURRENT_QUESTION_ID_KEY, current_question_id};
use crate::model::{QuestionCatalog, SessionError, SessionStore};

pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Welcome to the quiz! Answer each question to get your score at the end.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueConfig {
    /// Sent ahead of the first question whenever a dialogue (re)starts.
    pub welcome_message: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_owned(),
        }
    }
}

/// Drives one linear question sequence, one inbound message at a time.
#[derive(Debug, Clone)]
pub struct Dialogue {
    catalog: Arc<QuestionCatalog>,
    config: DialogueConfig,
}

impl Dialogue {
    #[must_use]
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            catalog,
            config: DialogueConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DialogueConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Process one inbound message and return the replies in order.
    ///
    /// A dialogue that has not started gets the welcome message and the first
    /// prompt; `message` is not treated as an answer in that case. Otherwise
    /// `message` answers the pending question. A rejected answer returns only
    /// the rejection text and leaves the session untouched. Every other path
    /// writes the next question id (or clears it on completion) and calls
    /// `save` exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only if the session's `save` fails.
    pub fn advance<S>(&self, message: &str, session: &mut S) -> Result<Vec<String>, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let mut replies = Vec::new();

        let current = match current_question_id(&*session) {
            Ok(current) => current,
            Err(err) => {
                warn!(error = %err, "rejecting turn for malformed session");
                replies.push(RecordError::InvalidQuestionId.to_string());
                return Ok(replies);
            }
        };

        match current {
            None => {
                debug!("dialogue not started; sending welcome");
                replies.push(self.config.welcome_message.clone());
            }
            Some(_) => {
                if let Err(err) = record(&self.catalog, message, current, session) {
                    debug!(error = %err, ?current, "answer not recorded");
                    replies.push(err.to_string());
                    return Ok(replies);
                }
            }
        }

        let next_id = match next(&self.catalog, current) {
            Some(question) => {
                debug!(next = %question.id, "asking next question");
                replies.push(question.prompt);
                Value::from(question.id.value())
            }
            None => {
                debug!("question sequence complete");
                replies.push(finalize(&self.catalog, &*session));
                Value::Null
            }
        };

        session.set(CURRENT_QUESTION_ID_KEY, next_id);
        session.save()?;

        Ok(replies)
    }
}
