//! Priority-based crafter registry.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::{Crafter, Priority};

/// Holds the single currently-active [`Crafter`].
///
/// Candidates register via [`update`]; a candidate replaces the incumbent
/// only when its priority is strictly higher. The replaced incumbent's
/// `shutdown()` runs exactly once, before the replacement becomes visible
/// through [`get`]. An empty pointer is a legitimate transient state
/// during bootstrap.
///
/// [`update`]: CrafterPointer::update
/// [`get`]: CrafterPointer::get
#[derive(Default)]
pub struct CrafterPointer {
    inner: Mutex<Option<Arc<dyn Crafter>>>,
}

impl CrafterPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active crafter, if any has registered yet.
    pub fn get(&self) -> Option<Arc<dyn Crafter>> {
        self.inner.lock().unwrap().clone()
    }

    /// Offers a candidate implementation.
    ///
    /// Installs it only if strictly higher priority than the incumbent;
    /// otherwise the call has no observable effect.
    pub fn update(&self, candidate: Arc<dyn Crafter>) {
        let mut slot = self.inner.lock().unwrap();
        match slot.as_ref() {
            Some(incumbent) if incumbent.priority() >= candidate.priority() => {
                debug!(
                    incumbent = %incumbent.priority(),
                    candidate = %candidate.priority(),
                    "crafter candidate rejected"
                );
            }
            _ => {
                if let Some(replaced) = slot.take() {
                    replaced.shutdown();
                }
                info!(priority = %candidate.priority(), "crafter installed");
                *slot = Some(candidate);
            }
        }
    }

    /// Tears down the incumbent unconditionally.
    ///
    /// Used at application shutdown; independent of priority comparison.
    pub fn clear(&self) {
        if let Some(incumbent) = self.inner.lock().unwrap().take() {
            incumbent.shutdown();
        }
    }
}
