use async_trait::async_trait;
use tokio::sync::Mutex;

use super::document::PersistedDocument;
use super::trait_def::{Store, StoreResult};

/// Store that keeps the document in process memory only
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<Option<PersistedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: PersistedDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> StoreResult<Option<PersistedDocument>> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &PersistedDocument) -> StoreResult<()> {
        *self.document.lock().await = Some(document.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
