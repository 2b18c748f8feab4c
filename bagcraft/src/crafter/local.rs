//! In-process fallback crafter.

use tokio::sync::oneshot;
use tracing::debug;

use crate::engine::{BasicCrafter, CraftEngine, Pickup};

use super::{CraftError, CraftOutcome, Crafter, Priority};

/// Synchronous, always-available crafter.
///
/// Registers first during bootstrap so the UI can craft before the
/// background worker has announced itself. Every call resolves on the
/// spot; the returned receiver is already fulfilled.
#[derive(Debug, Default)]
pub struct LocalCrafter {
    engine: BasicCrafter,
}

impl LocalCrafter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Crafter for LocalCrafter {
    fn priority(&self) -> Priority {
        Priority::LOCAL
    }

    fn craft(&self, pickups: Vec<Pickup>) -> oneshot::Receiver<CraftOutcome> {
        let (tx, rx) = oneshot::channel();
        let outcome = self
            .engine
            .craft(&pickups)
            .map_err(|e| CraftError::Engine(e.to_string()));
        let _ = tx.send(outcome);
        rx
    }

    fn shutdown(&self) {
        debug!("local crafter released");
    }
}
