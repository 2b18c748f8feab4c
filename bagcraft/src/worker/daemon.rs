//! The worker's message loop.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{CraftingCache, Pickup};
use crate::protocol::{visit_request, RequestId, RequestVisitor, WorkerRequest, WorkerResponse};
use crate::store::BlobStore;

use super::bootstrap::{load_or_create_cache, BootstrapError};
use super::WorkerConfig;

/// What the loop should do after handling one request.
enum Step {
    /// Send this response; re-persist the cache first if `persist`.
    Respond {
        response: WorkerResponse,
        persist: bool,
    },
    /// Release the cache and terminate.
    Shutdown,
}

/// Applies one request to the cache.
struct RequestHandler<'a> {
    cache: &'a mut CraftingCache,
}

impl RequestVisitor<Step> for RequestHandler<'_> {
    fn visit_craft(&mut self, request_id: RequestId, pickups: Vec<Pickup>) -> Step {
        match self.cache.craft(&pickups) {
            Ok((item_id, mutated)) => Step::Respond {
                response: WorkerResponse::craft(request_id, item_id),
                persist: mutated,
            },
            Err(e) => Step::Respond {
                response: WorkerResponse::craft_failed(request_id, e.to_string()),
                persist: false,
            },
        }
    }

    fn visit_shutdown(&mut self) -> Step {
        Step::Shutdown
    }
}

/// Background executor owning the crafting cache.
///
/// Boots the cache from the durable store, announces readiness, then
/// answers craft requests one at a time. Handling is synchronous
/// end-to-end within each message, so no two crafts ever run against the
/// cache concurrently and responses follow request order.
pub struct CraftWorker {
    config: WorkerConfig,
    request_rx: mpsc::Receiver<WorkerRequest>,
    response_tx: mpsc::Sender<WorkerResponse>,
}

impl CraftWorker {
    pub fn new(
        config: WorkerConfig,
        request_rx: mpsc::Receiver<WorkerRequest>,
        response_tx: mpsc::Sender<WorkerResponse>,
    ) -> Self {
        Self {
            config,
            request_rx,
            response_tx,
        }
    }

    /// Runs the worker until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error only when bootstrap fails; once `Ready` has been
    /// sent the loop runs to completion.
    pub async fn run(mut self) -> Result<(), BootstrapError> {
        info!("crafting worker booting");
        let store = BlobStore::open(self.config.store.clone()).await?;
        let mut cache = load_or_create_cache(&store).await?;

        // The single "I am alive" signal. The caller must not send craft
        // requests before observing it.
        if self.response_tx.send(WorkerResponse::ready()).await.is_err() {
            debug!("caller went away during boot");
            return Ok(());
        }
        info!(recipes = cache.len(), "crafting worker ready");

        while let Some(request) = self.request_rx.recv().await {
            let step = visit_request(request, &mut RequestHandler { cache: &mut cache });
            match step {
                Step::Respond { response, persist } => {
                    if persist && self.config.persist_after_craft {
                        Self::persist(&store, &cache).await;
                    }
                    if self.response_tx.send(response).await.is_err() {
                        debug!("caller went away, stopping worker");
                        break;
                    }
                }
                Step::Shutdown => {
                    info!("crafting worker shutting down");
                    break;
                }
            }
        }

        // Dispose of the cache before the thread exits. Requests still
        // queued behind a shutdown are dropped unanswered.
        drop(cache);
        info!("crafting worker terminated");
        Ok(())
    }

    /// Best-effort re-persist after a mutating craft.
    ///
    /// A failed write loses at most the results computed since the last
    /// successful one; crafting itself keeps working.
    async fn persist(store: &BlobStore, cache: &CraftingCache) {
        let blob = match cache.serialize() {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "failed to encode cache, skipping persist");
                return;
            }
        };
        if let Err(e) = store.put(&blob).await {
            warn!(error = %e, "failed to persist cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ItemId;
    use crate::store::StoreConfig;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> WorkerConfig {
        WorkerConfig {
            store: StoreConfig {
                root: dir.path().to_path_buf(),
                ..StoreConfig::default()
            },
            ..WorkerConfig::default()
        }
    }

    async fn start_worker(
        config: WorkerConfig,
    ) -> (
        mpsc::Sender<WorkerRequest>,
        mpsc::Receiver<WorkerResponse>,
        tokio::task::JoinHandle<Result<(), BootstrapError>>,
    ) {
        let (request_tx, request_rx) = mpsc::channel(8);
        let (response_tx, mut response_rx) = mpsc::channel(8);
        let worker = CraftWorker::new(config, request_rx, response_tx);
        let join = tokio::spawn(worker.run());

        assert_eq!(response_rx.recv().await, Some(WorkerResponse::Ready));
        (request_tx, response_rx, join)
    }

    #[tokio::test]
    async fn test_ready_precedes_all_craft_responses() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx, join) = start_worker(test_config(&dir)).await;

        tx.send(WorkerRequest::craft(1, vec![Pickup::Penny; 8]))
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            WorkerResponse::Craft { request_id, .. } => assert_eq!(request_id, 1),
            other => panic!("unexpected response: {other:?}"),
        }

        tx.send(WorkerRequest::shutdown()).await.unwrap();
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_fifo_request_processing() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx, join) = start_worker(test_config(&dir)).await;

        for id in 1..=3u64 {
            tx.send(WorkerRequest::craft(id, vec![Pickup::Rune; 8]))
                .await
                .unwrap();
        }
        for expected in 1..=3u64 {
            match rx.recv().await.unwrap() {
                WorkerResponse::Craft { request_id, .. } => assert_eq!(request_id, expected),
                other => panic!("unexpected response: {other:?}"),
            }
        }

        drop(tx);
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_engine_error_yields_craft_failed() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx, join) = start_worker(test_config(&dir)).await;

        tx.send(WorkerRequest::craft(9, vec![Pickup::Penny]))
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            WorkerResponse::CraftFailed { request_id, .. } => assert_eq!(request_id, 9),
            other => panic!("unexpected response: {other:?}"),
        }

        drop(tx);
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_no_responses_after_shutdown() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx, join) = start_worker(test_config(&dir)).await;

        tx.send(WorkerRequest::shutdown()).await.unwrap();
        // Sent after shutdown: silently lost.
        let _ = tx
            .send(WorkerRequest::craft(5, vec![Pickup::Key; 8]))
            .await;

        join.await.unwrap().unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_results_survive_a_worker_restart() {
        let dir = TempDir::new().unwrap();
        let bag = vec![Pickup::SoulHeart; 8];

        let first_id: ItemId;
        {
            let (tx, mut rx, join) = start_worker(test_config(&dir)).await;
            tx.send(WorkerRequest::craft(1, bag.clone())).await.unwrap();
            first_id = match rx.recv().await.unwrap() {
                WorkerResponse::Craft { item_id, .. } => item_id,
                other => panic!("unexpected response: {other:?}"),
            };
            tx.send(WorkerRequest::shutdown()).await.unwrap();
            join.await.unwrap().unwrap();
        }

        // Fresh worker over the same store answers identically.
        let (tx, mut rx, join) = start_worker(test_config(&dir)).await;
        tx.send(WorkerRequest::craft(1, bag)).await.unwrap();
        match rx.recv().await.unwrap() {
            WorkerResponse::Craft { item_id, .. } => assert_eq!(item_id, first_id),
            other => panic!("unexpected response: {other:?}"),
        }
        tx.send(WorkerRequest::shutdown()).await.unwrap();
        join.await.unwrap().unwrap();
    }
}
