//! Crafting computation engine.
//!
//! This module carries the engine-side contract the rest of the crate is
//! built against: a [`CraftEngine`] turns a fixed-size bag of pickups into
//! an item id, and a [`CraftingCache`] memoizes those results and can be
//! round-tripped through bytes for persistence.
//!
//! The item-pool tables of the full game are deliberately not reproduced
//! here; [`BasicCrafter`] is a deterministic computation with the same
//! shape (sorted bag in, stable item id out), which is all the execution
//! core needs.

mod basic;
mod cache;
mod pickup;
mod types;

pub use basic::BasicCrafter;
pub use cache::CraftingCache;
pub use pickup::Pickup;
pub use types::{CraftEngine, EngineError, ItemId, RECIPE_SIZE};
