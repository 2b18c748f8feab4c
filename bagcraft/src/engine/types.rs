//! Core types for the crafting engine.

use thiserror::Error;

use super::Pickup;

/// Number of pickups consumed by a single craft.
pub const RECIPE_SIZE: usize = 8;

/// Opaque identifier of a crafting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u16);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Engine-related errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A craft was attempted with the wrong number of pickups.
    #[error("expected exactly 8 pickups, got {0}")]
    WrongPickupCount(usize),

    /// The serialized cache blob could not be encoded or decoded.
    #[error("cache blob codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A crafting computation engine.
///
/// Implementations must be deterministic and order-insensitive: the same
/// multiset of pickups always yields the same item id.
pub trait CraftEngine {
    /// Computes the item produced by crafting the given pickups.
    ///
    /// Exactly [`RECIPE_SIZE`] pickups are required.
    fn craft(&self, pickups: &[Pickup]) -> Result<ItemId, EngineError>;
}
