use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use super::trait_def::Store;
use crate::registry::Registry;

/// Background writer that mirrors the registry into a `Store`.
///
/// Wakes on every registry change, waits out the debounce window so bursts
/// coalesce into one write, then saves a full snapshot. Save failures are
/// logged; the in-memory registry stays authoritative.
pub struct Persister {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Persister {
    pub fn spawn(registry: Arc<Registry>, store: Arc<dyn Store>, debounce: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut changes = registry.subscribe_changes();
        // Baseline taken with the subscription; anything after it is unsaved
        let mut saved_generation = registry.generation();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // Collect the rest of the burst, unless shutdown arrives first
                        let stopping = tokio::select! {
                            _ = time::sleep(debounce) => false,
                            _ = shutdown_rx.changed() => true,
                        };
                        changes.borrow_and_update();
                        saved_generation = flush(&registry, store.as_ref(), saved_generation).await;
                        if stopping {
                            break;
                        }
                    }
                    stop = shutdown_rx.changed() => {
                        if stop.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Shutdown signal received, flushing links...");
                            flush(&registry, store.as_ref(), saved_generation).await;
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Flush pending changes and stop the background task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Persister task failed: {}", e);
        }
    }
}

/// Save a snapshot if anything changed since `saved_generation`; returns the
/// generation now on disk.
async fn flush(registry: &Registry, store: &dyn Store, saved_generation: u64) -> u64 {
    let generation = registry.generation();
    if generation == saved_generation {
        return saved_generation;
    }

    let document = registry.snapshot();
    match store.save(&document).await {
        Ok(()) => {
            tracing::debug!(
                generation,
                links = document.links.len(),
                store = %store.describe(),
                "persisted links"
            );
            generation
        }
        Err(e) => {
            tracing::error!(store = %store.describe(), error = %e, "Failed to persist links");
            saved_generation
        }
    }
}
