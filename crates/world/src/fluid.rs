//! Water and lava.
//!
//! Flowing liquid falls into empty cells below it (water keeps falling, lava
//! stops after one cell), then spreads to the four horizontal neighbours.
//! A flowing cell that made no progress turns still; a still cell turns back
//! into flowing when a neighbour change opens an empty cell beside or below
//! it. Water and lava touching each other turn into stone.

use crate::level::Level;
use crate::registry::{tiles, LiquidKind, TileHooks};
use blockworld_core::{TileId, TilePos, AIR};
use rand::rngs::StdRng;

/// Water never flows into a cell with a sponge this close.
pub const SPONGE_RADIUS: i32 = 2;

pub(crate) const FLOWING_HOOKS: TileHooks = TileHooks {
    on_place: Some(schedule_self),
    on_neighbor_change: Some(flowing_neighbor_changed),
    update: Some(flow),
    on_removed: None,
};

pub(crate) const STILL_HOOKS: TileHooks = TileHooks {
    on_place: None,
    on_neighbor_change: Some(still_neighbor_changed),
    update: None,
    on_removed: None,
};

fn schedule_self(level: &mut Level, pos: TilePos) {
    let tile = level.get_tile(pos);
    level.schedule(pos, tile);
}

fn is_opposite(level: &Level, kind: LiquidKind, tile: TileId) -> bool {
    level.registry().liquid(tile) == Some(kind.opposite())
}

fn touches_opposite(level: &Level, pos: TilePos, kind: LiquidKind) -> bool {
    pos.neighbors()
        .into_iter()
        .any(|n| is_opposite(level, kind, level.get_tile(n)))
}

/// Whether `kind` may move into `pos`.
pub fn can_flow_into(level: &Level, pos: TilePos, kind: LiquidKind) -> bool {
    match kind {
        LiquidKind::Lava => true,
        LiquidKind::Water => !pos
            .cube_around(SPONGE_RADIUS)
            .any(|p| level.get_tile(p) == tiles::SPONGE),
    }
}

fn spread_into(level: &mut Level, pos: TilePos, kind: LiquidKind) -> bool {
    level.get_tile(pos) == AIR
        && can_flow_into(level, pos, kind)
        && level.set_tile(pos, kind.flowing_tile())
}

fn flow(level: &mut Level, pos: TilePos, _rng: &mut StdRng) {
    let Some(kind) = level.liquid_at(pos) else {
        return;
    };
    if touches_opposite(level, pos, kind) {
        level.set_tile(pos, tiles::STONE);
        return;
    }

    let mut cursor = pos;
    let mut fell = false;
    loop {
        let below = cursor.below();
        if !level.grid().in_bounds(below) || !spread_into(level, below, kind) {
            break;
        }
        fell = true;
        cursor = below;
        if kind == LiquidKind::Lava {
            break;
        }
    }

    let mut progressed = fell;
    if kind == LiquidKind::Water || !fell {
        for neighbor in cursor.horizontal_neighbors() {
            progressed |= spread_into(level, neighbor, kind);
        }
    }

    if progressed {
        level.schedule(cursor, kind.flowing_tile());
    } else {
        level.set_tile_no_update(cursor, kind.still_tile());
    }
}

fn flowing_neighbor_changed(level: &mut Level, pos: TilePos, changed: TileId) {
    let Some(kind) = level.liquid_at(pos) else {
        return;
    };
    if is_opposite(level, kind, changed) {
        level.set_tile(pos, tiles::STONE);
        return;
    }
    schedule_self(level, pos);
}

fn still_neighbor_changed(level: &mut Level, pos: TilePos, changed: TileId) {
    let Some(kind) = level.liquid_at(pos) else {
        return;
    };
    if is_opposite(level, kind, changed) {
        level.set_tile(pos, tiles::STONE);
        return;
    }
    let opened = pos
        .horizontal_neighbors()
        .into_iter()
        .chain([pos.below()])
        .any(|n| level.grid().in_bounds(n) && level.get_tile(n) == AIR);
    if opened {
        level.set_tile_no_update(pos, kind.flowing_tile());
        level.schedule(pos, kind.flowing_tile());
    }
}
