//! Grass, flowers, mushrooms and saplings.
//!
//! These tiles only act on random ticks. Each checks its light level and the
//! tile beneath it; plants whose conditions fail simply disappear.

use crate::level::{Level, TreeGrower};
use crate::registry::{tiles, TileHooks};
use blockworld_core::{TileId, TilePos, AIR};
use rand::{rngs::StdRng, Rng};

pub(crate) const GRASS_HOOKS: TileHooks = TileHooks {
    update: Some(grass_update),
    ..TileHooks::NONE
};

pub(crate) const FLOWER_HOOKS: TileHooks = TileHooks {
    update: Some(flower_update),
    ..TileHooks::NONE
};

pub(crate) const MUSHROOM_HOOKS: TileHooks = TileHooks {
    update: Some(mushroom_update),
    ..TileHooks::NONE
};

pub(crate) const SAPLING_HOOKS: TileHooks = TileHooks {
    update: Some(sapling_update),
    ..TileHooks::NONE
};

fn on_soil(level: &Level, pos: TilePos) -> bool {
    matches!(level.get_tile(pos.below()), tiles::DIRT | tiles::GRASS)
}

fn grass_update(level: &mut Level, pos: TilePos, rng: &mut StdRng) {
    if rng.gen_range(0..4) != 0 {
        return;
    }
    if !level.is_lit(pos) {
        level.set_tile(pos, tiles::DIRT);
        return;
    }
    for _ in 0..4 {
        let target = pos.offset(
            rng.gen_range(-1..=1),
            rng.gen_range(-3..=1),
            rng.gen_range(-1..=1),
        );
        if level.get_tile(target) == tiles::DIRT && level.is_lit(target) {
            level.set_tile(target, tiles::GRASS);
        }
    }
}

fn flower_update(level: &mut Level, pos: TilePos, _rng: &mut StdRng) {
    if !level.is_lit(pos) || !on_soil(level, pos) {
        level.set_tile(pos, AIR);
    }
}

fn mushroom_update(level: &mut Level, pos: TilePos, _rng: &mut StdRng) {
    let rock = matches!(
        level.get_tile(pos.below()),
        tiles::STONE | tiles::GRAVEL | tiles::COBBLESTONE
    );
    if level.is_lit(pos) || !rock {
        level.set_tile(pos, AIR);
    }
}

fn sapling_update(level: &mut Level, pos: TilePos, rng: &mut StdRng) {
    if !level.is_lit(pos) || !on_soil(level, pos) {
        level.set_tile(pos, AIR);
        return;
    }
    if rng.gen_range(0..5) != 0 {
        return;
    }
    let sapling = level.get_tile(pos);
    level.set_tile_no_update(pos, AIR);
    if !level.maybe_grow_tree(pos, rng) {
        level.set_tile_no_update(pos, sapling);
    }
}

/// The classic tree: a 4 to 6 tall log trunk under a rounded leaf canopy.
///
/// Needs grass under the trunk and free space for the whole shape inside
/// the level; the grass is turned into dirt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicTreeGrower;

impl ClassicTreeGrower {
    fn has_room(level: &Level, base: TilePos, height: i32) -> bool {
        let top = base.y + 1 + height;
        (base.y..=top).all(|y| {
            let radius = if y == base.y {
                0
            } else if y >= top - 2 {
                2
            } else {
                1
            };
            (-radius..=radius).all(|dx| {
                (-radius..=radius).all(|dz| {
                    let p = TilePos::new(base.x + dx, y, base.z + dz);
                    level.grid().in_bounds(p) && level.get_tile(p) == AIR
                })
            })
        })
    }

    fn place(level: &mut Level, pos: TilePos, tile: TileId) {
        level.set_tile(pos, tile);
    }
}

impl TreeGrower for ClassicTreeGrower {
    fn grow_tree(&mut self, level: &mut Level, base: TilePos, rng: &mut StdRng) -> bool {
        let height = rng.gen_range(4..=6);
        if !Self::has_room(level, base, height) {
            return false;
        }
        if level.get_tile(base.below()) != tiles::GRASS
            || base.y >= level.dims()[1] - height - 1
        {
            return false;
        }

        level.set_tile(base.below(), tiles::DIRT);
        let crown = base.y + height;
        for y in (crown - 3)..=crown {
            let dy = y - crown;
            let radius = 1 - dy / 2;
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    let corner = dx.abs() == radius && dz.abs() == radius;
                    if !corner || (rng.gen_range(0..2) != 0 && dy != 0) {
                        Self::place(level, TilePos::new(base.x + dx, y, base.z + dz), tiles::LEAVES);
                    }
                }
            }
        }
        for dy in 0..height {
            Self::place(level, base.offset(0, dy, 0), tiles::LOG);
        }
        true
    }
}
