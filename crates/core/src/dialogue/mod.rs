//! Per-turn question sequencing: record the answer, pick the next question,
//! score the run once the sequence is exhausted.

mod record;
mod score;
mod sequence;
mod turn;

pub use record::{RecordError, record};
pub use score::{EMPTY_CATALOG_MESSAGE, Score, finalize, score};
pub use sequence::{NextQuestion, next};
pub use turn::{DEFAULT_WELCOME_MESSAGE, Dialogue, DialogueConfig};
