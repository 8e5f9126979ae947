use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::{SessionId, SessionSnapshot};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{SessionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SessionRepository for SqliteRepository {
    async fn load_session(&self, id: SessionId) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT data FROM sessions WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: String = row.try_get("data").map_err(ser)?;
        SessionSnapshot::from_json(&data).map(Some).map_err(ser)
    }

    async fn save_session(
        &self,
        id: SessionId,
        session: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let data = session.to_json().map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO sessions (id, data, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id.to_string())
        .bind(data)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
