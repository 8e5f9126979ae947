use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{SessionId, SessionSnapshot, SessionStore};
use quiz_core::{Dialogue, DialogueConfig, Question, QuestionCatalog, SessionError, Validator};
use serde_json::json;
use services::{AppServices, DialogueError, DialogueService};
use storage::repository::{InMemoryRepository, SessionRepository, StorageError};

fn catalog() -> QuestionCatalog {
    QuestionCatalog::new(vec![
        Question::new("question 0").with_validator(Validator::NonEmpty),
        Question::new("question 1").with_validator(Validator::NonEmpty),
    ])
}

fn config() -> DialogueConfig {
    DialogueConfig {
        welcome_message: "welcome".into(),
    }
}

#[tokio::test]
async fn dialogue_persists_progress_between_turns() {
    let services = AppServices::in_memory(catalog(), config());
    let dialogue = services.dialogue();
    let id = SessionId::new_v4();

    let turn = dialogue.handle_message(id, "ignored").await.unwrap();
    assert_eq!(turn.replies, vec!["welcome", "question 0"]);
    assert!(turn.persisted);

    let turn = dialogue.handle_message(id, "answer1").await.unwrap();
    assert_eq!(turn.replies, vec!["question 1"]);

    let turn = dialogue.handle_message(id, "").await.unwrap();
    assert_eq!(turn.replies, vec!["Invalid answer format for question ID 1."]);
    assert!(!turn.persisted);

    let progress = dialogue.progress(id).await.unwrap();
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.remaining(), 1);

    let turn = dialogue.handle_message(id, "answer2").await.unwrap();
    assert_eq!(
        turn.replies,
        vec!["Quiz Completed!\nYou answered 2 out of 2 questions correctly.\nYour score is 100.00%."]
    );

    let progress = dialogue.progress(id).await.unwrap();
    assert!(!progress.is_started);
    assert_eq!(progress.answered, 2);
}

#[tokio::test]
async fn sessions_are_independent() {
    let services = AppServices::in_memory(catalog(), config());
    let dialogue = services.dialogue();
    let alice = SessionId::new_v4();
    let bob = SessionId::new_v4();

    dialogue.handle_message(alice, "start").await.unwrap();
    dialogue.handle_message(alice, "a").await.unwrap();
    let turn = dialogue.handle_message(bob, "start").await.unwrap();

    assert_eq!(turn.replies, vec!["welcome", "question 0"]);
    assert_eq!(dialogue.progress(alice).await.unwrap().answered, 1);
    assert_eq!(dialogue.progress(bob).await.unwrap().answered, 0);
}

#[tokio::test]
async fn reset_restarts_dialogue() {
    let services = AppServices::in_memory(catalog(), config());
    let dialogue = services.dialogue();
    let id = SessionId::new_v4();

    dialogue.handle_message(id, "start").await.unwrap();
    assert!(dialogue.reset(id).await.unwrap());
    assert!(!dialogue.reset(id).await.unwrap());

    let turn = dialogue.handle_message(id, "again").await.unwrap();
    assert_eq!(turn.replies, vec!["welcome", "question 0"]);
}

#[tokio::test]
async fn sqlite_backed_dialogue_survives_reconnect() {
    let url = "sqlite:file:memdb_dialogue_flow?mode=memory&cache=shared";
    let first = AppServices::new_sqlite(url, catalog(), config())
        .await
        .expect("sqlite services");
    let id = SessionId::new_v4();
    first.dialogue().handle_message(id, "start").await.unwrap();

    let second = AppServices::new_sqlite(url, catalog(), config())
        .await
        .expect("sqlite services");
    let turn = second.dialogue().handle_message(id, "a").await.unwrap();

    assert_eq!(turn.replies, vec!["question 1"]);
    drop(first);
}

struct ReadOnlyRepository(InMemoryRepository);

#[async_trait]
impl SessionRepository for ReadOnlyRepository {
    async fn load_session(&self, id: SessionId) -> Result<Option<SessionSnapshot>, StorageError> {
        self.0.load_session(id).await
    }

    async fn save_session(
        &self,
        _id: SessionId,
        _session: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        self.0.delete_session(id).await
    }
}

#[tokio::test]
async fn save_failure_is_propagated() {
    let dialogue = DialogueService::new(
        Dialogue::new(Arc::new(catalog())),
        Arc::new(ReadOnlyRepository(InMemoryRepository::new())),
    );

    let err = dialogue
        .handle_message(SessionId::new_v4(), "hi")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DialogueError::Storage(StorageError::Connection(_))
    ));
}

#[tokio::test]
async fn open_starts_or_resumes_session() {
    let services = AppServices::in_memory(catalog(), config());
    let dialogue = services.dialogue();
    let id = SessionId::new_v4();

    let turn = dialogue.open(id).await.unwrap();
    assert_eq!(turn.replies, vec!["welcome", "question 0"]);
    assert!(turn.persisted);

    dialogue.handle_message(id, "a").await.unwrap();
    let turn = dialogue.open(id).await.unwrap();
    assert_eq!(turn.replies, vec!["question 1"]);
    assert!(!turn.persisted);
    assert_eq!(dialogue.progress(id).await.unwrap().answered, 1);
}

#[tokio::test]
async fn malformed_cursor_recovers_after_reset() {
    let sessions = Arc::new(InMemoryRepository::new());
    let dialogue = DialogueService::new(
        Dialogue::new(Arc::new(catalog())).with_config(config()),
        sessions.clone(),
    );
    let id = SessionId::new_v4();
    let mut broken = SessionSnapshot::new();
    broken.set("current_question_id", json!("0"));
    sessions.save_session(id, &broken).await.unwrap();

    let turn = dialogue.open(id).await.unwrap();
    assert_eq!(turn.replies, vec!["Invalid question ID."]);
    assert!(!turn.persisted);

    let turn = dialogue.handle_message(id, "answer").await.unwrap();
    assert_eq!(turn.replies, vec!["Invalid question ID."]);
    assert!(!turn.persisted);

    let err = dialogue.progress(id).await.unwrap_err();
    assert!(matches!(err, DialogueError::Session(SessionError::Malformed { .. })));

    assert!(dialogue.reset(id).await.unwrap());
    let turn = dialogue.handle_message(id, "again").await.unwrap();
    assert_eq!(turn.replies, vec!["welcome", "question 0"]);
    assert_eq!(dialogue.progress(id).await.unwrap().answered, 0);
}
