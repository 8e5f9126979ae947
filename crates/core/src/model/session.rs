use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Session key holding the index of the question awaiting an answer.
pub const CURRENT_QUESTION_ID_KEY: &str = "current_question_id";

/// Session key holding the recorded answers, keyed by decimal question id.
pub const ANSWERS_KEY: &str = "answers";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session save failed: {0}")]
    Save(String),

    #[error("session value for `{key}` is malformed")]
    Malformed { key: String },

    #[error("session serialization error: {0}")]
    Serialization(String),
}

/// Narrow capability a dialogue turn needs from the caller's session.
///
/// The core only reads and writes keys through this trait and calls `save`
/// once at the end of a successful turn. Where the data lives is up to the
/// implementor.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<&Value>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn set(&mut self, key: &str, value: Value);

    /// Flush pending changes to the backing store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing store rejects the write.
    fn save(&mut self) -> Result<(), SessionError>;
}

/// Read `current_question_id`, treating a missing key and `null` as "not started".
///
/// # Errors
///
/// Returns `SessionError::Malformed` if the stored value is not an integer.
pub fn current_question_id<S>(session: &S) -> Result<Option<i64>, SessionError>
where
    S: SessionStore + ?Sized,
{
    match session.get(CURRENT_QUESTION_ID_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| SessionError::Malformed {
                key: CURRENT_QUESTION_ID_KEY.to_owned(),
            }),
    }
}

//
// ─── IN-MEMORY SNAPSHOT ───────────────────────────────────────────────────────
//

/// Plain key/value session held in memory.
///
/// `save` only records that the turn asked for a flush; callers that own a
/// persistent backend check `save_count` and write the snapshot out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSnapshot {
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    saves: u32,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a snapshot from its persisted JSON object form.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if `raw` is not a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        serde_json::from_str(raw).map_err(|err| SessionError::Serialization(err.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if a value cannot be encoded.
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|err| SessionError::Serialization(err.to_string()))
    }

    /// Number of times `save` was called since this snapshot was created or loaded.
    #[must_use]
    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl SessionStore for SessionSnapshot {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn save(&mut self) -> Result<(), SessionError> {
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}
