//! Bagcraft - Bag of Crafting calculator core
//!
//! This library provides the background-execution core of a crafting
//! calculator: an isolated worker that owns a persistent crafting cache,
//! a caller-side proxy that correlates concurrent requests with their
//! responses, and a priority-based selector that always exposes the best
//! available crafter implementation.
//!
//! # High-Level API
//!
//! ```ignore
//! use bagcraft::crafter::{CrafterPointer, LocalCrafter, RemoteCrafter, RemoteCrafterConfig};
//! use bagcraft::worker::{spawn_worker, WorkerConfig};
//! use std::sync::Arc;
//!
//! let pointer = Arc::new(CrafterPointer::new());
//!
//! // Synchronous fallback, available immediately.
//! pointer.update(Arc::new(LocalCrafter::new()));
//!
//! // Worker-backed proxy takes over once the worker signals ready.
//! let handle = spawn_worker(WorkerConfig::default());
//! let registry = Arc::clone(&pointer);
//! RemoteCrafter::connect(handle, RemoteCrafterConfig::default(), move |crafter| {
//!     registry.update(crafter);
//! });
//!
//! // Callers always go through the pointer.
//! if let Some(crafter) = pointer.get() {
//!     let item_id = crafter.craft(pickups).await??;
//! }
//! ```

pub mod crafter;
pub mod engine;
pub mod logging;
pub mod protocol;
pub mod store;
pub mod worker;

/// Version of the bagcraft library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
