//! The level: voxel grid plus the single mutator context every write goes through.
//!
//! All tile writes route through [`Level`] so that light, dirty-chunk
//! tracking and neighbour notification stay in one place. Behaviour hooks
//! receive `&mut Level` and may write recursively; there is no other path to
//! the grid.

use crate::error::WorldError;
use crate::grid::VoxelGrid;
use crate::lighting::LightMap;
use crate::registry::{LiquidKind, TileDef, TileDrop, TileRegistry};
use crate::scheduler::TickScheduler;
use crate::vegetation::ClassicTreeGrower;
use blockworld_core::{scoped_rng, ChunkCoord, SimTick, TileId, TilePos, AIR};
use blockworld_physics::Aabb;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace};

pub(crate) const SCHEDULED_DOMAIN: u64 = 0x5C4E_D01E;
const RANDOM_TICK_DOMAIN: u64 = 0x7A9D_0071;

/// Tunables for the tile simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Seed for every random decision the simulation makes.
    pub seed: u64,
    /// Random ticks per step are `volume / random_tick_divisor`; 0 disables them.
    pub random_tick_divisor: u32,
    /// Cap on scheduled events processed per step; 0 means unlimited.
    pub max_scheduled_per_step: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            random_tick_divisor: 200,
            max_scheduled_per_step: 0,
        }
    }
}

/// External collaborator that turns a sapling position into a tree.
pub trait TreeGrower {
    /// Try to grow a tree rooted at `base`. Returns `false` if nothing was placed.
    fn grow_tree(&mut self, level: &mut Level, base: TilePos, rng: &mut StdRng) -> bool;
}

/// Counters for one [`Level::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Tick that was simulated.
    pub tick: SimTick,
    /// Scheduled events whose tile still matched and were run.
    pub processed: usize,
    /// Scheduled events discarded because the tile had changed.
    pub stale: usize,
    /// Random ticks that hit a tile with random-tick behaviour.
    pub random_updates: usize,
    /// Events left in the queue after the step.
    pub pending: usize,
}

/// Voxel level and tile simulation state.
pub struct Level {
    grid: VoxelGrid,
    light: LightMap,
    registry: TileRegistry,
    scheduler: TickScheduler,
    dirty_chunks: BTreeSet<ChunkCoord>,
    tree_grower: Option<Box<dyn TreeGrower>>,
    config: LevelConfig,
    tick: SimTick,
}

impl Level {
    /// Build a level around an already materialized grid.
    pub fn new(grid: VoxelGrid, registry: TileRegistry, config: LevelConfig) -> Self {
        let light = LightMap::compute(&grid, &registry);
        debug!(
            size_x = grid.size_x(),
            size_y = grid.size_y(),
            size_z = grid.size_z(),
            seed = config.seed,
            "level created"
        );
        Self {
            grid,
            light,
            registry,
            scheduler: TickScheduler::new(),
            dirty_chunks: BTreeSet::new(),
            tree_grower: Some(Box::new(ClassicTreeGrower)),
            config,
            tick: SimTick::ZERO,
        }
    }

    /// All-air level with the classic tile set.
    pub fn empty(size_x: i32, size_y: i32, size_z: i32) -> Result<Self, WorldError> {
        Ok(Self::new(
            VoxelGrid::new(size_x, size_y, size_z)?,
            TileRegistry::classic(),
            LevelConfig::default(),
        ))
    }

    /// Replace the tree-growth collaborator.
    pub fn with_tree_grower(mut self, grower: impl TreeGrower + 'static) -> Self {
        self.tree_grower = Some(Box::new(grower));
        self
    }

    /// Replace the simulation config.
    pub fn with_config(mut self, config: LevelConfig) -> Self {
        self.config = config;
        self
    }

    /// Read-only grid access.
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Tile behaviours.
    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    /// Pending-update queue.
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Simulation config.
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Last simulated tick.
    pub fn tick(&self) -> SimTick {
        self.tick
    }

    /// World bounds `[x, y, z]`.
    pub fn dims(&self) -> [i32; 3] {
        [self.grid.size_x(), self.grid.size_y(), self.grid.size_z()]
    }

    /// Tile at `pos` (air outside the grid).
    pub fn get_tile(&self, pos: TilePos) -> TileId {
        self.grid.get(pos)
    }

    /// Behaviour of the tile at `pos`.
    pub fn tile_def(&self, pos: TilePos) -> &TileDef {
        self.registry.get(self.get_tile(pos))
    }

    /// Liquid family at `pos`.
    pub fn liquid_at(&self, pos: TilePos) -> Option<LiquidKind> {
        self.registry.liquid(self.get_tile(pos))
    }

    /// Whether the tile at `pos` is solid.
    pub fn is_solid_tile(&self, pos: TilePos) -> bool {
        self.tile_def(pos).solid
    }

    /// Whether `pos` receives sky light.
    pub fn is_lit(&self, pos: TilePos) -> bool {
        self.light.is_lit(pos)
    }

    /// Shading factor at `pos`.
    pub fn brightness(&self, pos: TilePos) -> f32 {
        self.light.brightness(pos)
    }

    /// Write `tile`, run removal/placement hooks and notify the six neighbours.
    ///
    /// Returns whether the cell changed.
    pub fn set_tile(&mut self, pos: TilePos, tile: TileId) -> bool {
        if !self.set_tile_no_neighbor_change(pos, tile) {
            return false;
        }
        self.update_neighbors_at(pos, tile);
        true
    }

    /// Write `tile` and run removal/placement hooks without notifying neighbours.
    pub fn set_tile_no_neighbor_change(&mut self, pos: TilePos, tile: TileId) -> bool {
        let Some(old) = self.write(pos, tile) else {
            return false;
        };
        let on_removed = self.registry.get(old).hooks.on_removed;
        if let (true, Some(hook)) = (old != AIR, on_removed) {
            hook(self, pos);
        }
        let on_place = self.registry.get(tile).hooks.on_place;
        if let (true, Some(hook)) = (tile != AIR, on_place) {
            hook(self, pos);
        }
        true
    }

    /// Write `tile` with no hooks and no notification. Light and dirty
    /// tracking are still updated.
    pub fn set_tile_no_update(&mut self, pos: TilePos, tile: TileId) -> bool {
        self.write(pos, tile).is_some()
    }

    /// Exchange the tiles of two cells, then notify around both.
    pub fn swap(&mut self, a: TilePos, b: TilePos) {
        let tile_a = self.get_tile(a);
        let tile_b = self.get_tile(b);
        self.set_tile_no_neighbor_change(a, tile_b);
        self.set_tile_no_neighbor_change(b, tile_a);
        self.update_neighbors_at(a, tile_b);
        self.update_neighbors_at(b, tile_a);
    }

    /// Tell the six neighbours of `pos` that it now holds `changed`.
    pub fn update_neighbors_at(&mut self, pos: TilePos, changed: TileId) {
        for neighbor in pos.neighbors() {
            self.notify(neighbor, changed);
        }
    }

    fn notify(&mut self, pos: TilePos, changed: TileId) {
        if !self.grid.in_bounds(pos) {
            return;
        }
        let on_neighbor_change = self.tile_def(pos).hooks.on_neighbor_change;
        if let Some(hook) = on_neighbor_change {
            hook(self, pos, changed);
        }
    }

    fn write(&mut self, pos: TilePos, tile: TileId) -> Option<TileId> {
        let old = self.grid.set(pos, tile)?;
        self.mark_region_dirty(pos.offset(-1, -1, -1), pos.offset(1, 1, 1));
        if let Some((before, after)) =
            self.light
                .recompute_column(&self.grid, &self.registry, pos.x, pos.z)
        {
            let (low, high) = (before.min(after), before.max(after));
            self.mark_region_dirty(
                TilePos::new(pos.x - 1, low, pos.z - 1),
                TilePos::new(pos.x + 1, high, pos.z + 1),
            );
        }
        Some(old)
    }

    /// Flag every chunk overlapping the inclusive voxel box for recompilation.
    pub fn mark_region_dirty(&mut self, min: TilePos, max: TilePos) {
        let [cx, cy, cz] = self.grid.chunk_dims();
        let lo = min.chunk();
        let hi = max.chunk();
        for y in lo.y.max(0)..=hi.y.min(cy - 1) {
            for z in lo.z.max(0)..=hi.z.min(cz - 1) {
                for x in lo.x.max(0)..=hi.x.min(cx - 1) {
                    self.dirty_chunks.insert(ChunkCoord::new(x, y, z));
                }
            }
        }
    }

    /// Drain chunks edited since the last call, in coordinate order.
    pub fn take_dirty_chunks(&mut self) -> BTreeSet<ChunkCoord> {
        std::mem::take(&mut self.dirty_chunks)
    }

    /// Queue an update for the tile currently at `pos`, using `tile`'s delay.
    pub fn schedule(&mut self, pos: TilePos, tile: TileId) -> bool {
        if tile == AIR || !self.grid.in_bounds(pos) {
            return false;
        }
        let delay = self.registry.get(tile).tick_delay;
        self.scheduler.schedule(pos, tile, self.tick, delay)
    }

    /// Run the update hook of the tile at `pos`.
    pub fn update_tile(&mut self, pos: TilePos, rng: &mut StdRng) {
        let update = self.tile_def(pos).hooks.update;
        if let Some(hook) = update {
            hook(self, pos, rng);
        }
    }

    /// Ask the tree collaborator to grow a tree at `base`.
    pub fn maybe_grow_tree(&mut self, base: TilePos, rng: &mut StdRng) -> bool {
        let Some(mut grower) = self.tree_grower.take() else {
            return false;
        };
        let grown = grower.grow_tree(self, base, rng);
        self.tree_grower = Some(grower);
        grown
    }

    /// Break the tile at `pos` and roll its drop.
    pub fn destroy_tile(&mut self, pos: TilePos, rng: &mut StdRng) -> Option<TileDrop> {
        let tile = self.get_tile(pos);
        if tile == AIR || !self.set_tile(pos, AIR) {
            return None;
        }
        self.registry.get(tile).drop.roll(rng)
    }

    /// Collision boxes of every tile overlapping `region`.
    ///
    /// Cells beside or below the grid count as full solid cubes; the space
    /// above the grid is open.
    pub fn collision_boxes(&self, region: &Aabb) -> Vec<Aabb> {
        let x0 = region.min.x.floor() as i32;
        let y0 = region.min.y.floor() as i32;
        let z0 = region.min.z.floor() as i32;
        let x1 = (region.max.x + 1.0).floor() as i32;
        let y1 = (region.max.y + 1.0).floor() as i32;
        let z1 = (region.max.z + 1.0).floor() as i32;
        let [sx, _, sz] = self.dims();

        let mut boxes = Vec::new();
        for x in x0..x1 {
            for y in y0..y1 {
                for z in z0..z1 {
                    let pos = TilePos::new(x, y, z);
                    if self.grid.in_bounds(pos) {
                        boxes.extend(self.tile_def(pos).collision_box(pos));
                    } else if x < 0 || y < 0 || z < 0 || x >= sx || z >= sz {
                        boxes.push(Aabb::unit_cube(x, y, z));
                    }
                }
            }
        }
        boxes
    }

    /// Advance one tick: run due scheduled updates, then random ticks.
    pub fn step(&mut self) -> StepReport {
        self.tick = self.tick.advance(1);
        let now = self.tick;
        let mut report = StepReport {
            tick: now,
            ..StepReport::default()
        };

        let limit = (self.config.max_scheduled_per_step > 0)
            .then_some(self.config.max_scheduled_per_step);
        let mut rng = scoped_rng(self.config.seed, SCHEDULED_DOMAIN, now);
        for event in self.scheduler.drain_due(now, limit) {
            if self.get_tile(event.pos) != event.tile {
                trace!(pos = %event.pos, tile = event.tile, "stale tick discarded");
                report.stale += 1;
                continue;
            }
            self.update_tile(event.pos, &mut rng);
            report.processed += 1;
        }

        if self.config.random_tick_divisor > 0 {
            let mut rng = scoped_rng(self.config.seed, RANDOM_TICK_DOMAIN, now);
            let count = self.grid.volume() / self.config.random_tick_divisor as usize;
            let [sx, sy, sz] = self.dims();
            for _ in 0..count {
                let pos = TilePos::new(rng.gen_range(0..sx), rng.gen_range(0..sy), rng.gen_range(0..sz));
                if self.tile_def(pos).random_ticks {
                    self.update_tile(pos, &mut rng);
                    report.random_updates += 1;
                }
            }
        }

        report.pending = self.scheduler.pending_count();
        trace!(
            tick = now.0,
            processed = report.processed,
            stale = report.stale,
            pending = report.pending,
            "level step"
        );
        report
    }

    /// Step until the scheduler is idle or `max_steps` ran. Returns the steps taken.
    pub fn run_until_idle(&mut self, max_steps: u64) -> u64 {
        let mut steps = 0;
        while steps < max_steps && !self.scheduler.is_idle() {
            self.step();
            steps += 1;
        }
        steps
    }
}
