//! Synchronous, deterministic crafting computation.

use super::types::{CraftEngine, EngineError, ItemId, RECIPE_SIZE};
use super::Pickup;

/// Highest item id the engine will produce.
const ITEM_ID_RANGE: u16 = 730;

/// Xorshift generator seeded per craft.
///
/// The shift triple is swapped in for each pickup mixed into the state,
/// so the final state depends on the whole bag.
struct Rng {
    seed: u32,
    shifts: (u32, u32, u32),
}

impl Default for Rng {
    fn default() -> Self {
        Rng {
            seed: 0x7777_7770,
            shifts: (0, 0, 0),
        }
    }
}

impl Rng {
    fn next(&mut self) -> u32 {
        let mut num = self.seed;
        num ^= num >> self.shifts.0;
        num ^= num << self.shifts.1;
        num ^= num >> self.shifts.2;
        self.seed = num;
        self.seed
    }
}

/// Deterministic crafting engine.
///
/// Stands in for the full item-pool computation: it mixes every pickup's
/// shift parameters and the bag's total weight into a xorshift state and
/// maps the result onto the item id range. Same bag in, same item out,
/// regardless of pickup order.
#[derive(Debug, Clone, Default)]
pub struct BasicCrafter;

impl BasicCrafter {
    pub fn new() -> Self {
        Self
    }

    fn craft_sorted(&self, pickups: &[Pickup; RECIPE_SIZE]) -> ItemId {
        let mut rng = Rng::default();
        for pickup in pickups {
            rng.shifts = pickup.shifts();
            rng.next();
        }

        let weight_total: u32 = pickups.iter().map(|p| p.weight()).sum();
        rng.shifts = (1, 21, 20);
        let roll = rng.next().wrapping_add(weight_total);

        ItemId((roll % u32::from(ITEM_ID_RANGE)) as u16 + 1)
    }
}

impl CraftEngine for BasicCrafter {
    fn craft(&self, pickups: &[Pickup]) -> Result<ItemId, EngineError> {
        let mut bag: [Pickup; RECIPE_SIZE] = pickups
            .try_into()
            .map_err(|_| EngineError::WrongPickupCount(pickups.len()))?;
        bag.sort();
        Ok(self.craft_sorted(&bag))
    }
}
