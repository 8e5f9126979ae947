use async_trait::async_trait;
use quiz_core::model::{SessionId, SessionSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for per-user dialogue sessions.
///
/// Sessions are stored whole; there is no versioning, so concurrent turns for
/// the same id are last-writer-wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a session by ID, or `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored data is unreadable.
    async fn load_session(&self, id: SessionId) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Persist or replace a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn save_session(&self, id: SessionId, session: &SessionSnapshot)
    -> Result<(), StorageError>;

    /// Remove a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no session exists for `id`.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Sessions are kept in their serialized form so a load never hands back
/// state that a real backend would not have persisted.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn load_session(&self, id: SessionId) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&id)
            .map(|raw| SessionSnapshot::from_json(raw))
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn save_session(
        &self,
        id: SessionId,
        session: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let raw = session
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, raw);
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

/// Session repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let sessions: Arc<dyn SessionRepository> = Arc::new(InMemoryRepository::new());
        Self { sessions }
    }
}
