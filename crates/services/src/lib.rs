#![forbid(unsafe_code)]

pub mod app_services;
pub mod dialogue;
pub mod error;

pub use app_services::AppServices;
pub use dialogue::{DialogueProgress, DialogueService, TurnOutcome};
pub use error::{AppServicesError, DialogueError};
