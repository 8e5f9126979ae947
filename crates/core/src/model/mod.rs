mod catalog;
mod ids;
mod question;
pub mod session;

pub use catalog::{CatalogError, QuestionCatalog};
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use question::{CustomValidator, Question, Validator};
pub use session::{SessionError, SessionSnapshot, SessionStore};
