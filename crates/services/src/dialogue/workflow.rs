use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::model::{SessionId, SessionSnapshot};
use quiz_core::{Dialogue, RecordError};
use storage::repository::{SessionRepository, StorageError};

use super::progress::DialogueProgress;
use crate::error::DialogueError;

/// Replies for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub replies: Vec<String>,
    /// Whether the turn committed session changes to the repository.
    pub persisted: bool,
}

/// Runs dialogue turns against sessions kept in a repository.
#[derive(Clone)]
pub struct DialogueService {
    dialogue: Dialogue,
    sessions: Arc<dyn SessionRepository>,
}

impl DialogueService {
    #[must_use]
    pub fn new(dialogue: Dialogue, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { dialogue, sessions }
    }

    /// Load the session, advance it by one message, and write it back.
    ///
    /// Unknown ids start from an empty session. The session is written only
    /// when the turn saved it, so a rejected answer leaves the stored row alone.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Storage` if loading or persisting fails.
    pub async fn handle_message(
        &self,
        id: SessionId,
        message: &str,
    ) -> Result<TurnOutcome, DialogueError> {
        let mut session = self.sessions.load_session(id).await?.unwrap_or_default();

        let replies = self.dialogue.advance(message, &mut session)?;

        let persisted = session.save_count() > 0;
        if persisted {
            self.sessions.save_session(id, &session).await?;
        }
        debug!(session = %id, persisted, replies = replies.len(), "turn handled");

        Ok(TurnOutcome { replies, persisted })
    }

    /// Replies to show when a client (re)connects to a session.
    ///
    /// A session that has not started runs its first turn. A session in
    /// progress repeats the pending prompt without touching stored state. A
    /// session whose cursor cannot be read gets the invalid-question reply so
    /// the client can still reach `reset`.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Storage` if the repository fails.
    pub async fn open(&self, id: SessionId) -> Result<TurnOutcome, DialogueError> {
        let progress = match self.progress(id).await {
            Ok(progress) => progress,
            Err(DialogueError::Session(err)) => {
                warn!(session = %id, error = %err, "stored session is unreadable");
                return Ok(TurnOutcome {
                    replies: vec![RecordError::InvalidQuestionId.to_string()],
                    persisted: false,
                });
            }
            Err(err) => return Err(err),
        };

        if !progress.is_started {
            return self.handle_message(id, "").await;
        }

        let replies = progress
            .current_question_id
            .and_then(|qid| self.dialogue.catalog().get(qid))
            .map(|question| vec![question.prompt().to_owned()])
            .unwrap_or_default();
        Ok(TurnOutcome {
            replies,
            persisted: false,
        })
    }

    /// Report how far the given session has progressed.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Storage` if loading fails, or
    /// `DialogueError::Session` if the stored cursor is malformed.
    pub async fn progress(&self, id: SessionId) -> Result<DialogueProgress, DialogueError> {
        let session = self
            .sessions
            .load_session(id)
            .await?
            .unwrap_or_else(SessionSnapshot::new);
        Ok(DialogueProgress::from_session(
            self.dialogue.catalog(),
            &session,
        )?)
    }

    /// Forget a session so its next message starts over. Returns false if
    /// nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Storage` if the repository fails.
    pub async fn reset(&self, id: SessionId) -> Result<bool, DialogueError> {
        match self.sessions.delete_session(id).await {
            Ok(()) => {
                info!(session = %id, "session reset");
                Ok(true)
            }
            Err(StorageError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
