//! Slab stacking: a slab placed on a slab merges into one double slab.

use crate::level::Level;
use crate::registry::{tiles, TileHooks};
use blockworld_core::{TilePos, AIR};

pub(crate) const HOOKS: TileHooks = TileHooks {
    on_place: Some(merge_with_lower),
    on_neighbor_change: None,
    update: None,
    on_removed: None,
};

fn merge_with_lower(level: &mut Level, pos: TilePos) {
    if level.get_tile(pos.below()) != tiles::SLAB {
        return;
    }
    level.set_tile(pos, AIR);
    level.set_tile(pos.below(), tiles::DOUBLE_SLAB);
}
