//! Sponge: dries out water around it and lets it back in when removed.

use crate::fluid::SPONGE_RADIUS;
use crate::level::Level;
use crate::registry::{LiquidKind, TileHooks};
use blockworld_core::{TilePos, AIR};

pub(crate) const HOOKS: TileHooks = TileHooks {
    on_place: Some(absorb),
    on_neighbor_change: None,
    update: None,
    on_removed: Some(release),
};

fn absorb(level: &mut Level, pos: TilePos) {
    for p in pos.cube_around(SPONGE_RADIUS) {
        if level.liquid_at(p) == Some(LiquidKind::Water) {
            level.set_tile_no_neighbor_change(p, AIR);
        }
    }
}

fn release(level: &mut Level, pos: TilePos) {
    for p in pos.cube_around(SPONGE_RADIUS) {
        let tile = level.get_tile(p);
        level.update_neighbors_at(p, tile);
    }
}
