//! Worker-backed crafter proxy (the request correlator).
//!
//! Implements [`Crafter`] by exchanging tagged messages with the
//! background worker, hiding asynchrony and correlation from the caller:
//! each outbound craft gets a fresh request id and a pending-table entry;
//! the matching inbound response resolves the entry and removes it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{ItemId, Pickup};
use crate::protocol::{visit_response, RequestId, ResponseVisitor, WorkerRequest};
use crate::worker::WorkerHandle;

use super::{CraftError, CraftOutcome, Crafter, Priority};

/// Configuration for the worker-backed proxy.
#[derive(Debug, Clone)]
pub struct RemoteCrafterConfig {
    /// Deadline per craft request. A request with no response by then is
    /// evicted from the pending table and fails with
    /// [`CraftError::TimedOut`]. `None` disables the deadline, leaving a
    /// lost response pending forever.
    pub request_timeout: Option<Duration>,
}

impl Default for RemoteCrafterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Resolver callbacks for requests sent but not yet answered.
///
/// An entry exists from the moment a request is sent until its response
/// (or deadline) is observed. Absence means "never sent" or "already
/// resolved" - the two are indistinguishable by design.
type PendingTable = Arc<Mutex<HashMap<RequestId, oneshot::Sender<CraftOutcome>>>>;

/// Crafter implementation backed by the background worker.
///
/// Created via [`RemoteCrafter::connect`], which takes over the worker's
/// response stream. Supersedes [`LocalCrafter`] in the registry once the
/// worker's `ready` signal has fired.
///
/// [`LocalCrafter`]: super::LocalCrafter
pub struct RemoteCrafter {
    request_tx: mpsc::Sender<WorkerRequest>,
    next_request_id: AtomicU64,
    pending: PendingTable,
    config: RemoteCrafterConfig,
}

impl RemoteCrafter {
    /// Wires a proxy to a spawned worker.
    ///
    /// Spawns a listener task over the worker's response channel:
    /// `ready` invokes `on_ready` with the proxy exactly once per worker
    /// lifetime; craft responses resolve their pending entries. When the
    /// response channel closes (worker terminated), all still-pending
    /// requests fail with [`CraftError::WorkerGone`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect<F>(handle: WorkerHandle, config: RemoteCrafterConfig, on_ready: F) -> Arc<Self>
    where
        F: FnOnce(Arc<RemoteCrafter>) + Send + 'static,
    {
        let WorkerHandle {
            request_tx,
            mut response_rx,
            thread,
        } = handle;
        // The worker thread exits on its own after a shutdown request or
        // when the request channel closes; nobody blocks on it.
        drop(thread);

        let crafter = Arc::new(Self {
            request_tx,
            next_request_id: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
            config,
        });

        let listener = Arc::clone(&crafter);
        tokio::spawn(async move {
            let mut handler = ResponseHandler {
                crafter: listener,
                on_ready: Some(Box::new(on_ready)),
            };
            while let Some(response) = response_rx.recv().await {
                visit_response(response, &mut handler);
            }
            debug!("worker response channel closed");
            handler.crafter.fail_all(CraftError::WorkerGone);
        });

        crafter
    }

    /// Resolves and removes a pending entry.
    ///
    /// A response for an id that is unknown (or already resolved, e.g.
    /// after a timeout eviction) is logged and ignored.
    fn resolve(&self, request_id: RequestId, outcome: CraftOutcome) {
        let entry = self.pending.lock().unwrap().remove(&request_id);
        match entry {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => {
                warn!(request_id, "response for unknown or already-resolved request");
            }
        }
    }

    /// Fails every in-flight request with the given error.
    fn fail_all(&self, error: CraftError) {
        let mut pending = self.pending.lock().unwrap();
        if !pending.is_empty() {
            warn!(count = pending.len(), "failing in-flight craft requests");
        }
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Arms the per-request deadline, if configured.
    fn arm_timeout(&self, request_id: RequestId) {
        let Some(timeout) = self.config.request_timeout else {
            return;
        };
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = pending.lock().unwrap().remove(&request_id) {
                warn!(request_id, "craft request timed out, evicting");
                let _ = tx.send(Err(CraftError::TimedOut));
            }
        });
    }
}

impl Crafter for RemoteCrafter {
    fn priority(&self) -> Priority {
        Priority::REMOTE
    }

    fn craft(&self, pickups: Vec<Pickup>) -> oneshot::Receiver<CraftOutcome> {
        // Pre-increment: ids start at 1 and never repeat for this proxy.
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();

        // Register before sending so a fast response can't race the
        // table entry.
        self.pending.lock().unwrap().insert(request_id, tx);

        let request = WorkerRequest::craft(request_id, pickups);
        match self.request_tx.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                // Backpressure: wait for channel capacity off the caller's
                // path. The entry is already registered, so the eventual
                // response still correlates.
                let sender = self.request_tx.clone();
                let pending = Arc::clone(&self.pending);
                tokio::spawn(async move {
                    if sender.send(request).await.is_err() {
                        if let Some(tx) = pending.lock().unwrap().remove(&request_id) {
                            let _ = tx.send(Err(CraftError::WorkerGone));
                        }
                    }
                });
            }
            Err(TrySendError::Closed(_)) => {
                if let Some(tx) = self.pending.lock().unwrap().remove(&request_id) {
                    let _ = tx.send(Err(CraftError::WorkerGone));
                }
                return rx;
            }
        }

        self.arm_timeout(request_id);
        rx
    }

    /// Asks the worker to terminate.
    ///
    /// Queued craft requests are still answered first (the worker is
    /// strictly FIFO); anything left unanswered fails with
    /// [`CraftError::WorkerGone`] once the response channel closes.
    fn shutdown(&self) {
        info!("shutting down crafting worker");
        if self.request_tx.try_send(WorkerRequest::shutdown()).is_err() {
            let sender = self.request_tx.clone();
            tokio::spawn(async move {
                let _ = sender.send(WorkerRequest::shutdown()).await;
            });
        }
    }
}

/// Visits worker responses on the listener task.
struct ResponseHandler {
    crafter: Arc<RemoteCrafter>,
    on_ready: Option<Box<dyn FnOnce(Arc<RemoteCrafter>) + Send>>,
}

impl ResponseVisitor<()> for ResponseHandler {
    fn visit_ready(&mut self) {
        match self.on_ready.take() {
            Some(on_ready) => on_ready(Arc::clone(&self.crafter)),
            None => warn!("duplicate ready signal from worker"),
        }
    }

    fn visit_craft(&mut self, request_id: RequestId, item_id: ItemId) {
        self.crafter.resolve(request_id, Ok(item_id));
    }

    fn visit_craft_failed(&mut self, request_id: RequestId, reason: String) {
        self.crafter.resolve(request_id, Err(CraftError::Engine(reason)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WorkerResponse;
    use std::sync::atomic::AtomicUsize;

    /// Hand-built worker handle whose far end is driven by the test.
    fn fake_worker() -> (
        WorkerHandle,
        mpsc::Receiver<WorkerRequest>,
        mpsc::Sender<WorkerResponse>,
    ) {
        let (request_tx, request_rx) = mpsc::channel(8);
        let (response_tx, response_rx) = mpsc::channel(8);
        let handle = WorkerHandle {
            request_tx,
            response_rx,
            thread: std::thread::spawn(|| {}),
        };
        (handle, request_rx, response_tx)
    }

    fn no_timeout() -> RemoteCrafterConfig {
        RemoteCrafterConfig {
            request_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_ready_fires_handler_exactly_once() {
        let (handle, _request_rx, response_tx) = fake_worker();
        let fired = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&fired);
        let _crafter = RemoteCrafter::connect(handle, no_timeout(), move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        response_tx.send(WorkerResponse::ready()).await.unwrap();
        response_tx.send(WorkerResponse::ready()).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_ids_are_strictly_increasing() {
        let (handle, mut request_rx, _response_tx) = fake_worker();
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        let _rx1 = crafter.craft(vec![Pickup::Penny; 8]);
        let _rx2 = crafter.craft(vec![Pickup::Key; 8]);
        let _rx3 = crafter.craft(vec![Pickup::Bomb; 8]);

        let mut last = 0;
        for _ in 0..3 {
            match request_rx.recv().await.unwrap() {
                WorkerRequest::Craft { request_id, .. } => {
                    assert!(request_id > last);
                    last = request_id;
                }
                other => panic!("unexpected request: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_out_of_order_responses_correlate() {
        let (handle, mut request_rx, response_tx) = fake_worker();
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        let rx1 = crafter.craft(vec![Pickup::Penny; 8]);
        let rx2 = crafter.craft(vec![Pickup::Key; 8]);
        let id1 = match request_rx.recv().await.unwrap() {
            WorkerRequest::Craft { request_id, .. } => request_id,
            other => panic!("unexpected request: {other:?}"),
        };
        let id2 = match request_rx.recv().await.unwrap() {
            WorkerRequest::Craft { request_id, .. } => request_id,
            other => panic!("unexpected request: {other:?}"),
        };

        // Answer the second request first.
        response_tx
            .send(WorkerResponse::craft(id2, ItemId(200)))
            .await
            .unwrap();
        response_tx
            .send(WorkerResponse::craft(id1, ItemId(100)))
            .await
            .unwrap();

        assert_eq!(rx2.await.unwrap(), Ok(ItemId(200)));
        assert_eq!(rx1.await.unwrap(), Ok(ItemId(100)));
        assert!(crafter.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_request_id_is_ignored() {
        let (handle, _request_rx, response_tx) = fake_worker();
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        response_tx
            .send(WorkerResponse::craft(42, ItemId(1)))
            .await
            .unwrap();
        tokio::task::yield_now().await;

        // Nothing pending, nothing resolved, nothing panicked.
        assert!(crafter.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_craft_failed_resolves_with_engine_error() {
        let (handle, mut request_rx, response_tx) = fake_worker();
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        let rx = crafter.craft(vec![Pickup::Penny]);
        let id = match request_rx.recv().await.unwrap() {
            WorkerRequest::Craft { request_id, .. } => request_id,
            other => panic!("unexpected request: {other:?}"),
        };
        response_tx
            .send(WorkerResponse::craft_failed(id, "bad bag"))
            .await
            .unwrap();

        assert_eq!(
            rx.await.unwrap(),
            Err(CraftError::Engine("bad bag".to_string()))
        );
    }

    #[tokio::test]
    async fn test_request_times_out_and_is_evicted() {
        let (handle, _request_rx, _response_tx) = fake_worker();
        let config = RemoteCrafterConfig {
            request_timeout: Some(Duration::from_millis(50)),
        };
        let crafter = RemoteCrafter::connect(handle, config, |_| {});

        let rx = crafter.craft(vec![Pickup::Penny; 8]);
        assert_eq!(rx.await.unwrap(), Err(CraftError::TimedOut));
        assert!(crafter.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_fails_fast() {
        let (handle, request_rx, _response_tx) = fake_worker();
        drop(request_rx);
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        let rx = crafter.craft(vec![Pickup::Penny; 8]);
        assert_eq!(rx.await.unwrap(), Err(CraftError::WorkerGone));
    }

    #[tokio::test]
    async fn test_worker_termination_fails_in_flight_requests() {
        let (handle, mut request_rx, response_tx) = fake_worker();
        let crafter = RemoteCrafter::connect(handle, no_timeout(), |_| {});

        let rx = crafter.craft(vec![Pickup::Penny; 8]);
        let _ = request_rx.recv().await.unwrap();

        // Worker dies without answering.
        drop(response_tx);

        assert_eq!(rx.await.unwrap(), Err(CraftError::WorkerGone));
    }
}
