use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, warn};

use super::document::PersistedDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored document exists but cannot be decoded
    #[error("persisted document is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of the persisted document. Loads and saves are always of
/// the whole document.
#[async_trait]
pub trait Store: Send + Sync {
    /// Load the document; `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> StoreResult<Option<PersistedDocument>>;

    /// Replace the stored document
    async fn save(&self, document: &PersistedDocument) -> StoreResult<()>;

    /// Move an undecodable document aside so later saves cannot overwrite
    /// it. Returns where it went, if anywhere.
    async fn quarantine(&self) -> StoreResult<Option<String>> {
        Ok(None)
    }

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Load the document, treating an absent or unreadable store as empty.
pub async fn load_or_empty(store: &dyn Store) -> PersistedDocument {
    match store.load().await {
        Ok(Some(document)) => document,
        Ok(None) => PersistedDocument::default(),
        Err(e) => {
            warn!(
                store = %store.describe(),
                error = %e,
                "could not load persisted links, starting with an empty registry"
            );
            if matches!(e, StoreError::Corrupt(_)) {
                match store.quarantine().await {
                    Ok(Some(moved_to)) => warn!(moved_to = %moved_to, "kept unreadable document"),
                    Ok(None) => {}
                    Err(e) => error!(
                        store = %store.describe(),
                        error = %e,
                        "failed to move unreadable document aside"
                    ),
                }
            }
            PersistedDocument::default()
        }
    }
}
