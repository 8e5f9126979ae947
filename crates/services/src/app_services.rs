use std::sync::Arc;

use quiz_core::{Dialogue, DialogueConfig, QuestionCatalog};
use storage::repository::Storage;

use crate::dialogue::DialogueService;
use crate::error::AppServicesError;

/// Assembles app-facing services around one catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<QuestionCatalog>,
    dialogue: Arc<DialogueService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: QuestionCatalog,
        config: DialogueConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(&storage, catalog, config))
    }

    /// Build services over an in-memory repository.
    #[must_use]
    pub fn in_memory(catalog: QuestionCatalog, config: DialogueConfig) -> Self {
        Self::with_storage(&Storage::in_memory(), catalog, config)
    }

    fn with_storage(storage: &Storage, catalog: QuestionCatalog, config: DialogueConfig) -> Self {
        let catalog = Arc::new(catalog);
        let dialogue = Dialogue::new(Arc::clone(&catalog)).with_config(config);
        let dialogue = Arc::new(DialogueService::new(
            dialogue,
            Arc::clone(&storage.sessions),
        ));
        Self { catalog, dialogue }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<QuestionCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn dialogue(&self) -> Arc<DialogueService> {
        Arc::clone(&self.dialogue)
    }
}
