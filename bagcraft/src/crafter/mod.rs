//! The crafter capability and its implementations.
//!
//! A [`Crafter`] turns a bag of pickups into an item id, asynchronously,
//! behind a priority-ranked registry:
//!
//! - [`LocalCrafter`] computes in-process and is available immediately
//!   (priority [`Priority::LOCAL`]).
//! - [`RemoteCrafter`] proxies to the background worker and registers
//!   itself once the worker is ready (priority [`Priority::REMOTE`]).
//! - [`CrafterPointer`] always exposes the highest-priority
//!   implementation registered so far.

mod local;
mod pointer;
mod remote;

pub use local::LocalCrafter;
pub use pointer::CrafterPointer;
pub use remote::{RemoteCrafter, RemoteCrafterConfig};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::engine::{ItemId, Pickup};

/// Scheduling rank of a crafter implementation.
///
/// A candidate replaces the incumbent in the [`CrafterPointer`] only when
/// its priority is strictly higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    /// In-process synchronous fallback.
    pub const LOCAL: Priority = Priority(1);
    /// Worker-backed proxy; supersedes the fallback once ready.
    pub const REMOTE: Priority = Priority(2);
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a craft call did not produce an item id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CraftError {
    /// The engine rejected the bag.
    #[error("engine error: {0}")]
    Engine(String),

    /// The worker is gone (shut down or crashed); the request can no
    /// longer be answered.
    #[error("crafting worker is gone")]
    WorkerGone,

    /// No response arrived within the configured deadline.
    #[error("craft request timed out")]
    TimedOut,
}

/// Result delivered through a craft promise.
pub type CraftOutcome = Result<ItemId, CraftError>;

/// The crafter capability.
///
/// `craft` returns a oneshot receiver resolving to the outcome; awaiting
/// it is the caller's suspension point. A dropped receiver simply
/// abandons interest in the result — in-flight work is not cancelled.
pub trait Crafter: Send + Sync {
    /// Rank used by [`CrafterPointer`] when arbitrating replacement.
    fn priority(&self) -> Priority;

    /// Starts a craft and returns the pending outcome.
    fn craft(&self, pickups: Vec<Pickup>) -> oneshot::Receiver<CraftOutcome>;

    /// Releases any resources held by this implementation.
    ///
    /// Called exactly once when the implementation is replaced or the
    /// registry is cleared. The default does nothing.
    fn shutdown(&self) {}
}
