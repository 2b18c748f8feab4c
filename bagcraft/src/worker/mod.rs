//! Background crafting worker.
//!
//! The worker is an isolated execution context: a dedicated OS thread
//! running its own single-threaded runtime, owning the [`CraftingCache`]
//! exclusively. The only things crossing the boundary are the tagged
//! messages of [`crate::protocol`], carried over a pair of channels.
//!
//! ```text
//! ┌────────────────┐                          ┌─────────────────────┐
//! │ RemoteCrafter  │ ──── WorkerRequest ────► │ CraftWorker thread  │
//! │ (caller side)  │ ◄─── WorkerResponse ──── │ cache + blob store  │
//! └────────────────┘                          └─────────────────────┘
//! ```
//!
//! Lifecycle: boot (open store, load or create the cache), announce
//! `Ready`, then serve requests strictly in FIFO order until a
//! `Shutdown` message arrives or the request channel closes.
//!
//! [`CraftingCache`]: crate::engine::CraftingCache

mod bootstrap;
mod daemon;

pub use bootstrap::{load_or_create_cache, BootstrapError};
pub use daemon::CraftWorker;

use tokio::sync::mpsc;
use tracing::error;

use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::store::StoreConfig;

/// Configuration for a [`CraftWorker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Durable store holding the serialized cache blob.
    pub store: StoreConfig,
    /// Capacity of the request and response channels.
    pub channel_capacity: usize,
    /// Re-persist the cache after every mutating craft. Without this,
    /// results computed since bootstrap are lost on abrupt termination.
    pub persist_after_craft: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            channel_capacity: 32,
            persist_after_craft: true,
        }
    }
}

/// Caller-side handle to a spawned worker.
///
/// Holds the two channel endpoints and the thread handle. Usually handed
/// straight to [`RemoteCrafter::connect`], which takes over the response
/// stream.
///
/// [`RemoteCrafter::connect`]: crate::crafter::RemoteCrafter::connect
pub struct WorkerHandle {
    /// Sends requests into the worker.
    pub request_tx: mpsc::Sender<WorkerRequest>,
    /// Receives responses from the worker.
    pub response_rx: mpsc::Receiver<WorkerResponse>,
    /// The worker thread itself.
    pub thread: std::thread::JoinHandle<()>,
}

impl WorkerHandle {
    /// Waits for the worker thread to terminate.
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

/// Spawns a crafting worker on a dedicated thread.
///
/// The thread runs a current-thread tokio runtime so the worker's message
/// handling stays strictly sequential. A bootstrap failure (store cannot
/// be opened) is logged and terminates the thread; the caller observes
/// this as the response channel closing without a `Ready`.
pub fn spawn_worker(config: WorkerConfig) -> WorkerHandle {
    let (request_tx, request_rx) = mpsc::channel(config.channel_capacity);
    let (response_tx, response_rx) = mpsc::channel(config.channel_capacity);

    let thread = std::thread::Builder::new()
        .name("craft-worker".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "failed to build worker runtime");
                    return;
                }
            };

            let worker = CraftWorker::new(config, request_rx, response_tx);
            if let Err(e) = runtime.block_on(worker.run()) {
                error!(error = %e, "crafting worker aborted");
            }
        })
        .expect("failed to spawn craft-worker thread");

    WorkerHandle {
        request_tx,
        response_rx,
        thread,
    }
}
