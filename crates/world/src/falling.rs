//! Gravity tiles (sand, gravel).
//!
//! A gravity tile drops as soon as it is placed or a neighbour changes. The
//! fall is resolved synchronously: the tile scans straight down through air
//! and liquid, destroys any liquid in its landing cell and swaps into it.

use crate::level::Level;
use crate::registry::TileHooks;
use blockworld_core::{TileId, TilePos, AIR};

pub(crate) const HOOKS: TileHooks = TileHooks {
    on_place: Some(on_place),
    on_neighbor_change: Some(on_neighbor_change),
    update: None,
    on_removed: None,
};

fn on_place(level: &mut Level, pos: TilePos) {
    fall(level, pos);
}

fn on_neighbor_change(level: &mut Level, pos: TilePos, _changed: TileId) {
    fall(level, pos);
}

fn passable(level: &Level, pos: TilePos) -> bool {
    let tile = level.get_tile(pos);
    tile == AIR || level.registry().liquid(tile).is_some()
}

/// Lowest cell a gravity tile at `pos` would come to rest in.
pub fn landing_cell(level: &Level, pos: TilePos) -> TilePos {
    let mut dest = pos;
    while dest.y > 0 && passable(level, dest.below()) {
        dest = dest.below();
    }
    dest
}

fn fall(level: &mut Level, pos: TilePos) {
    let dest = landing_cell(level, pos);
    if dest == pos {
        return;
    }
    if level.liquid_at(dest).is_some() {
        level.set_tile_no_update(dest, AIR);
    }
    level.swap(pos, dest);
}
