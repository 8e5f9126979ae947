use quiz_core::model::{SessionId, SessionSnapshot, SessionStore};
use serde_json::json;
use storage::repository::{SessionRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_persists_session_values() {
    let repo = connect("memdb_session_roundtrip").await;
    let id = SessionId::new_v4();

    let mut session = SessionSnapshot::new();
    session.set("current_question_id", json!(2));
    session.set("answers", json!({"0": "let", "1": "Option"}));
    repo.save_session(id, &session).await.unwrap();

    let loaded = repo.load_session(id).await.unwrap().expect("session stored");
    assert_eq!(loaded.get("current_question_id"), Some(&json!(2)));
    assert_eq!(
        loaded.get("answers"),
        Some(&json!({"0": "let", "1": "Option"}))
    );
}

#[tokio::test]
async fn sqlite_save_overwrites_existing_row() {
    let repo = connect("memdb_session_overwrite").await;
    let id = SessionId::new_v4();

    let mut session = SessionSnapshot::new();
    session.set("current_question_id", json!(0));
    repo.save_session(id, &session).await.unwrap();

    session.set("current_question_id", serde_json::Value::Null);
    repo.save_session(id, &session).await.unwrap();

    let loaded = repo.load_session(id).await.unwrap().expect("session stored");
    assert_eq!(
        loaded.get("current_question_id"),
        Some(&serde_json::Value::Null)
    );
}

#[tokio::test]
async fn sqlite_missing_and_deleted_sessions() {
    let repo = connect("memdb_session_delete").await;
    let id = SessionId::new_v4();

    assert!(repo.load_session(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_session(id).await,
        Err(StorageError::NotFound)
    ));

    repo.save_session(id, &SessionSnapshot::new()).await.unwrap();
    repo.delete_session(id).await.unwrap();
    assert!(repo.load_session(id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_migrate_is_idempotent() {
    let repo = connect("memdb_session_migrate").await;
    repo.migrate().await.expect("second migrate");
}
