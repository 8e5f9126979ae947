#![forbid(unsafe_code)]

pub mod dialogue;
pub mod model;

pub use dialogue::{Dialogue, DialogueConfig, RecordError, Score};
pub use model::{
    CatalogError, Question, QuestionCatalog, QuestionId, SessionError, SessionId, SessionSnapshot,
    SessionStore, Validator,
};
