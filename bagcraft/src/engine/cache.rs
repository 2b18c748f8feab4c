//! Memoizing crafting cache.
//!
//! The cache is exclusively owned by the background worker; only its
//! serialized byte form ever crosses the persistence boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{CraftEngine, EngineError, ItemId, RECIPE_SIZE};
use super::{BasicCrafter, Pickup};

/// One memoized craft result, as stored in the serialized blob.
///
/// HashMap keys can't be JSON object keys here (they're arrays), so the
/// blob is a flat sequence of these entries.
#[derive(Debug, Serialize, Deserialize)]
struct BlobEntry {
    pickups: [Pickup; RECIPE_SIZE],
    item_id: ItemId,
}

/// Memoizing wrapper around the crafting engine.
///
/// Results are computed lazily and recorded, so every cache miss mutates
/// the memo table. The table can be serialized to bytes and restored in a
/// later session; a restored cache answers the same bags with the same
/// item ids it originally computed.
#[derive(Debug, Clone, Default)]
pub struct CraftingCache {
    engine: BasicCrafter,
    memo: HashMap<[Pickup; RECIPE_SIZE], ItemId>,
}

impl CraftingCache {
    /// Creates an empty cache backed by a fresh engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Crafts the given pickups, memoizing the result.
    ///
    /// Returns the item id and whether the memo table was mutated (a
    /// cache miss). The caller uses the flag to decide when to
    /// re-persist.
    pub fn craft(&mut self, pickups: &[Pickup]) -> Result<(ItemId, bool), EngineError> {
        let mut bag: [Pickup; RECIPE_SIZE] = pickups
            .try_into()
            .map_err(|_| EngineError::WrongPickupCount(pickups.len()))?;
        bag.sort();

        if let Some(&item_id) = self.memo.get(&bag) {
            return Ok((item_id, false));
        }

        let item_id = self.engine.craft(&bag)?;
        self.memo.insert(bag, item_id);
        Ok((item_id, true))
    }

    /// Number of memoized recipes.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// True if no recipe has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Serializes the memo table to bytes for the durable store.
    pub fn serialize(&self) -> Result<Vec<u8>, EngineError> {
        let entries: Vec<BlobEntry> = self
            .memo
            .iter()
            .map(|(&pickups, &item_id)| BlobEntry { pickups, item_id })
            .collect();
        Ok(serde_json::to_vec(&entries)?)
    }

    /// Restores a cache from bytes previously produced by [`serialize`].
    ///
    /// [`serialize`]: CraftingCache::serialize
    pub fn deserialize(data: &[u8]) -> Result<Self, EngineError> {
        let entries: Vec<BlobEntry> = serde_json::from_slice(data)?;
        let memo = entries
            .into_iter()
            .map(|e| (e.pickups, e.item_id))
            .collect();
        Ok(Self {
            engine: BasicCrafter::new(),
            memo,
        })
    }
}
