//! The deterministic demo level the headless driver runs.

use anyhow::{bail, Context, Result};
use blockworld_core::{scoped_rng, SimTick, TilePos};
use blockworld_world::{tiles, Entity, Level, LevelConfig, SpatialEntityIndex, TileRegistry, VoxelGrid};
use glam::Vec3;
use rand::Rng;
use tracing::info;

use crate::config::WorldSize;

const SPAWN_DOMAIN: u64 = 0x5EA_D0E5;

/// Height of the grass layer.
pub fn surface_height(size: WorldSize) -> i32 {
    size.size_y / 2
}

/// Layered terrain with a water pool, a buried lava pocket, sand columns,
/// plants and a slab stack. Active features are placed through the level so
/// their behaviour kicks in on the first step.
pub fn build_level(size: WorldSize, config: LevelConfig) -> Result<Level> {
    let WorldSize { size_x: sx, size_y: sy, size_z: sz } = size;
    if sx < 32 || sz < 32 || sy < 16 {
        bail!("demo level needs at least 32x16x32 cells, got {sx}x{sy}x{sz}");
    }
    let top = surface_height(size);
    let mut grid = VoxelGrid::new(sx, sy, sz).context("allocating voxel grid")?;
    grid.fill(TilePos::new(0, 0, 0), TilePos::new(sx - 1, 0, sz - 1), tiles::BEDROCK);
    grid.fill(TilePos::new(0, 1, 0), TilePos::new(sx - 1, top - 4, sz - 1), tiles::STONE);
    grid.fill(TilePos::new(0, top - 3, 0), TilePos::new(sx - 1, top - 1, sz - 1), tiles::DIRT);
    grid.fill(TilePos::new(0, top, 0), TilePos::new(sx - 1, top, sz - 1), tiles::GRASS);

    let pool = TilePos::new(sx / 4, top, sz / 4);
    grid.fill(pool.offset(-3, -2, -3), pool.offset(3, 0, 3), tiles::AIR);
    let lava = TilePos::new(3 * sx / 4, top - 5, 3 * sz / 4);
    grid.fill(lava.offset(-1, -1, -1), lava.offset(1, 1, 1), tiles::AIR);
    let seed = config.seed;
    let mut level = Level::new(grid, TileRegistry::classic(), config);

    level.set_tile(pool, tiles::WATER);
    level.set_tile(lava.offset(0, 1, 0), tiles::LAVA);
    for i in 0..3 {
        let column = TilePos::new(sx / 2 - 2 + i * 2, top + 6 + i, sz / 4);
        level.set_tile(column, tiles::SAND);
        level.set_tile(column.above(), tiles::GRAVEL);
    }
    for i in 0..6 {
        let x = 4 + i * 4;
        level.set_tile(TilePos::new(x, top + 1, sz - 6), tiles::SAPLING);
        let flower = if i % 2 == 0 { tiles::ROSE } else { tiles::DANDELION };
        level.set_tile(TilePos::new(x + 2, top + 1, sz - 4), flower);
    }
    let slabs = TilePos::new(sx / 2, top + 1, 3 * sz / 4);
    for _ in 0..3 {
        let mut pos = slabs;
        while level.get_tile(pos) != tiles::AIR {
            pos = pos.above();
        }
        level.set_tile(pos, tiles::SLAB);
    }
    info!(sx, sy, sz, seed, "demo level built");
    Ok(level)
}

/// Spawn `count` entities at seeded positions above the surface.
pub fn spawn_walkers(index: &mut SpatialEntityIndex, size: WorldSize, count: usize, seed: u64) {
    let mut rng = scoped_rng(seed, SPAWN_DOMAIN, SimTick::ZERO);
    let y = (surface_height(size) + 3) as f32;
    for _ in 0..count {
        let x = rng.gen_range(1.0..(size.size_x - 1) as f32);
        let z = rng.gen_range(1.0..(size.size_z - 1) as f32);
        index.insert(Entity::new(Vec3::new(x, y, z), 0.3, 1.8));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_level_has_every_feature() {
        let size = WorldSize::default();
        let level = build_level(size, LevelConfig::default()).unwrap();
        let grid = level.grid();
        assert_eq!(grid.count(tiles::WATER), 1);
        assert_eq!(grid.count(tiles::LAVA), 1);
        assert_eq!(grid.count(tiles::SAND), 3);
        assert_eq!(grid.count(tiles::SAPLING), 6);
        assert_eq!(grid.count(tiles::DOUBLE_SLAB), 1);
        assert_eq!(grid.count(tiles::SLAB), 1);
        assert!(level.scheduler().pending_count() > 0);
    }

    #[test]
    fn too_small_levels_are_refused() {
        let size = WorldSize {
            size_x: 16,
            size_y: 16,
            size_z: 16,
        };
        assert!(build_level(size, LevelConfig::default()).is_err());
    }

    #[test]
    fn walkers_spawn_inside_the_level() {
        let size = WorldSize::default();
        let mut index = SpatialEntityIndex::new([size.size_x, size.size_y, size.size_z]);
        spawn_walkers(&mut index, size, 10, 7);
        assert_eq!(index.len(), 10);
        for (_, e) in index.iter() {
            assert!((1.0..63.0).contains(&e.position.x));
            assert!((1.0..63.0).contains(&e.position.z));
            assert_eq!(e.position.y, 19.0);
        }
    }
}
