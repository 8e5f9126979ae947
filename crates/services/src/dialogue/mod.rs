mod progress;
mod workflow;

pub use progress::DialogueProgress;
pub use workflow::{DialogueService, TurnOutcome};
