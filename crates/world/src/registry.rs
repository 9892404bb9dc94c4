//! Tile-type registry: one behaviour record per tile id.
//!
//! Behaviour is flattened into data (flags, shape, drop policy) plus a small
//! table of hook function pointers. The classic tile set is provided by
//! [`TileRegistry::classic`]; custom tiles can be registered before the
//! registry is handed to a [`Level`].

use crate::error::WorldError;
use crate::level::Level;
use crate::{falling, fluid, slab, sponge, vegetation};
use blockworld_core::{TileId, TilePos};
use blockworld_physics::Aabb;
use glam::Vec3;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// Classic tile ids.
#[allow(missing_docs)]
pub mod tiles {
    use blockworld_core::TileId;

    pub const AIR: TileId = 0;
    pub const STONE: TileId = 1;
    pub const GRASS: TileId = 2;
    pub const DIRT: TileId = 3;
    pub const COBBLESTONE: TileId = 4;
    pub const PLANKS: TileId = 5;
    pub const SAPLING: TileId = 6;
    pub const BEDROCK: TileId = 7;
    pub const WATER: TileId = 8;
    pub const STILL_WATER: TileId = 9;
    pub const LAVA: TileId = 10;
    pub const STILL_LAVA: TileId = 11;
    pub const SAND: TileId = 12;
    pub const GRAVEL: TileId = 13;
    pub const GOLD_ORE: TileId = 14;
    pub const IRON_ORE: TileId = 15;
    pub const COAL_ORE: TileId = 16;
    pub const LOG: TileId = 17;
    pub const LEAVES: TileId = 18;
    pub const SPONGE: TileId = 19;
    pub const GLASS: TileId = 20;
    /// First of the 16 cloth colours.
    pub const CLOTH_FIRST: TileId = 21;
    /// Last of the 16 cloth colours.
    pub const CLOTH_LAST: TileId = 36;
    pub const DANDELION: TileId = 37;
    pub const ROSE: TileId = 38;
    pub const BROWN_MUSHROOM: TileId = 39;
    pub const RED_MUSHROOM: TileId = 40;
    pub const GOLD_BLOCK: TileId = 41;
    pub const IRON_BLOCK: TileId = 42;
    pub const DOUBLE_SLAB: TileId = 43;
    pub const SLAB: TileId = 44;
    pub const BRICK: TileId = 45;
    pub const TNT: TileId = 46;
    pub const BOOKSHELF: TileId = 47;
    pub const MOSSY_COBBLESTONE: TileId = 48;
    pub const OBSIDIAN: TileId = 49;
}

const CLOTH_NAMES: [&str; 16] = [
    "red_cloth",
    "orange_cloth",
    "yellow_cloth",
    "chartreuse_cloth",
    "green_cloth",
    "spring_green_cloth",
    "cyan_cloth",
    "capri_cloth",
    "ultramarine_cloth",
    "violet_cloth",
    "purple_cloth",
    "magenta_cloth",
    "rose_cloth",
    "dark_gray_cloth",
    "light_gray_cloth",
    "white_cloth",
];

/// Render pass a tile's faces are compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderPass {
    /// Drawn first, depth-writing.
    Opaque = 0,
    /// Drawn second, back to front.
    Translucent = 1,
}

impl RenderPass {
    /// Both passes in draw order.
    pub const ALL: [RenderPass; 2] = [RenderPass::Opaque, RenderPass::Translucent];

    /// Pass index (0 or 1).
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Liquid family of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidKind {
    /// Spreads every tick and cascades downward.
    Water,
    /// Spreads slowly and falls one cell per update.
    Lava,
}

impl LiquidKind {
    /// Id of the flowing variant.
    pub const fn flowing_tile(self) -> TileId {
        match self {
            LiquidKind::Water => tiles::WATER,
            LiquidKind::Lava => tiles::LAVA,
        }
    }

    /// Id of the still variant (flowing id + 1).
    pub const fn still_tile(self) -> TileId {
        self.flowing_tile() + 1
    }

    /// The liquid that turns this one into rock on contact.
    pub const fn opposite(self) -> LiquidKind {
        match self {
            LiquidKind::Water => LiquidKind::Lava,
            LiquidKind::Lava => LiquidKind::Water,
        }
    }
}

/// Geometry family used by the mesher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileShape {
    /// Nothing to draw.
    Empty,
    /// Box faces spanning the tile's bounds (full cubes, slabs).
    Block,
    /// Two crossed diagonal quads (plants).
    Cross,
    /// Box faces that hide against the same liquid.
    Liquid,
}

/// What a tile contributes to collision queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collision {
    /// Passable.
    None,
    /// The tile's bounds.
    Bounds,
}

/// Face-culling rule used when deciding whether a face is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullRule {
    /// Hidden only against solid neighbours.
    Solid,
    /// Also hidden against the same tile (glass, leaves, slabs).
    SameTile,
    /// Hidden against either variant of the same liquid.
    SameLiquid,
}

/// Item produced when a tile is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDrop {
    /// Dropped tile id.
    pub tile: TileId,
    /// Stack size.
    pub count: u32,
}

/// Drop id and count policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPolicy {
    /// Tile id dropped.
    pub tile: TileId,
    /// Minimum count (inclusive).
    pub min: u32,
    /// Maximum count (inclusive).
    pub max: u32,
    /// A drop happens with probability `1 / chance`.
    pub chance: u32,
}

impl DropPolicy {
    /// Never drops anything.
    pub const NONE: DropPolicy = DropPolicy {
        tile: tiles::AIR,
        min: 0,
        max: 0,
        chance: 1,
    };

    /// Drops one of `tile`.
    pub const fn single(tile: TileId) -> Self {
        Self {
            tile,
            min: 1,
            max: 1,
            chance: 1,
        }
    }

    /// Drops `min..=max` of `tile`.
    pub const fn range(tile: TileId, min: u32, max: u32) -> Self {
        Self {
            tile,
            min,
            max,
            chance: 1,
        }
    }

    /// Drops one of `tile` with probability `1 / chance`.
    pub const fn rare(tile: TileId, chance: u32) -> Self {
        Self {
            tile,
            min: 1,
            max: 1,
            chance,
        }
    }

    /// Roll the policy.
    pub fn roll(&self, rng: &mut StdRng) -> Option<TileDrop> {
        if self.tile == tiles::AIR || self.max == 0 {
            return None;
        }
        if self.chance > 1 && rng.gen_range(0..self.chance) != 0 {
            return None;
        }
        let count = if self.min >= self.max {
            self.max
        } else {
            rng.gen_range(self.min..=self.max)
        };
        (count > 0).then_some(TileDrop {
            tile: self.tile,
            count,
        })
    }
}

/// Called after a tile is written into a cell through a notifying setter.
pub type PlaceHook = fn(&mut Level, TilePos);
/// Called on a tile when one of its six neighbours changed to the given id.
pub type NeighborHook = fn(&mut Level, TilePos, TileId);
/// Called for scheduled and random ticks.
pub type UpdateHook = fn(&mut Level, TilePos, &mut StdRng);
/// Called after a tile was overwritten through a notifying setter.
pub type RemovedHook = fn(&mut Level, TilePos);

/// Behaviour hooks. Absent hooks are no-ops.
#[derive(Clone, Copy, Default)]
pub struct TileHooks {
    /// See [`PlaceHook`].
    pub on_place: Option<PlaceHook>,
    /// See [`NeighborHook`].
    pub on_neighbor_change: Option<NeighborHook>,
    /// See [`UpdateHook`].
    pub update: Option<UpdateHook>,
    /// See [`RemovedHook`].
    pub on_removed: Option<RemovedHook>,
}

impl TileHooks {
    /// No behaviour at all.
    pub const NONE: TileHooks = TileHooks {
        on_place: None,
        on_neighbor_change: None,
        update: None,
        on_removed: None,
    };
}

impl std::fmt::Debug for TileHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileHooks")
            .field("on_place", &self.on_place.is_some())
            .field("on_neighbor_change", &self.on_neighbor_change.is_some())
            .field("update", &self.update.is_some())
            .field("on_removed", &self.on_removed.is_some())
            .finish()
    }
}

/// Behaviour record for one tile id.
#[derive(Debug, Clone)]
pub struct TileDef {
    /// Registry name.
    pub name: String,
    /// Hides neighbour faces and counts as ground for placement rules.
    pub solid: bool,
    /// Blocks sky light.
    pub opaque: bool,
    /// Occupies the whole cell.
    pub cube: bool,
    /// Pass the tile's faces are compiled into.
    pub render_pass: RenderPass,
    /// Extra ticks before a scheduled update of this tile fires.
    pub tick_delay: u32,
    /// Liquid family, if any.
    pub liquid: Option<LiquidKind>,
    /// What breaking the tile yields.
    pub drop: DropPolicy,
    /// Mesher geometry.
    pub shape: TileShape,
    /// Face-culling rule.
    pub cull: CullRule,
    /// Bounds within the unit cell.
    pub bounds: Aabb,
    /// Collision contribution.
    pub collision: Collision,
    /// Receives random ticks.
    pub random_ticks: bool,
    /// Behaviour hooks.
    pub hooks: TileHooks,
}

impl TileDef {
    /// A plain solid, opaque cube that drops itself.
    pub fn cube(name: impl Into<String>, id: TileId) -> Self {
        Self {
            name: name.into(),
            solid: true,
            opaque: true,
            cube: true,
            render_pass: RenderPass::Opaque,
            tick_delay: 0,
            liquid: None,
            drop: DropPolicy::single(id),
            shape: TileShape::Block,
            cull: CullRule::Solid,
            bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
            collision: Collision::Bounds,
            random_ticks: false,
            hooks: TileHooks::NONE,
        }
    }

    /// The empty tile.
    pub fn air() -> Self {
        Self {
            solid: false,
            opaque: false,
            cube: false,
            drop: DropPolicy::NONE,
            shape: TileShape::Empty,
            collision: Collision::None,
            ..Self::cube("air", tiles::AIR)
        }
    }

    /// A cross-shaped plant of the given footprint.
    pub fn plant(name: impl Into<String>, id: TileId, radius: f32, height: f32) -> Self {
        Self {
            solid: false,
            opaque: false,
            cube: false,
            shape: TileShape::Cross,
            bounds: Aabb::from_bounds(0.5 - radius, 0.0, 0.5 - radius, 0.5 + radius, height, 0.5 + radius),
            collision: Collision::None,
            random_ticks: true,
            ..Self::cube(name, id)
        }
    }

    /// Flowing or still variant of a liquid.
    pub fn liquid(name: impl Into<String>, kind: LiquidKind, still: bool) -> Self {
        let id = if still { kind.still_tile() } else { kind.flowing_tile() };
        let (render_pass, tick_delay) = match kind {
            LiquidKind::Water => (RenderPass::Translucent, 0),
            LiquidKind::Lava => (RenderPass::Opaque, 5),
        };
        let hooks = if still {
            fluid::STILL_HOOKS
        } else {
            fluid::FLOWING_HOOKS
        };
        Self {
            solid: false,
            opaque: true,
            cube: false,
            render_pass,
            tick_delay,
            liquid: Some(kind),
            drop: DropPolicy::NONE,
            shape: TileShape::Liquid,
            cull: CullRule::SameLiquid,
            bounds: Aabb::from_bounds(0.0, 0.0, 0.0, 1.0, 0.9, 1.0),
            collision: Collision::None,
            hooks,
            ..Self::cube(name, id)
        }
    }

    /// Replace the drop policy.
    pub fn with_drop(mut self, drop: DropPolicy) -> Self {
        self.drop = drop;
        self
    }

    /// Replace the hooks.
    pub fn with_hooks(mut self, hooks: TileHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Non-solid, non-opaque cube that hides faces against itself.
    pub fn see_through(mut self) -> Self {
        self.solid = false;
        self.opaque = false;
        self.cull = CullRule::SameTile;
        self
    }

    /// World-space collision box at `pos`, if the tile collides.
    pub fn collision_box(&self, pos: TilePos) -> Option<Aabb> {
        match self.collision {
            Collision::None => None,
            Collision::Bounds => Some(
                self.bounds
                    .translated(Vec3::new(pos.x as f32, pos.y as f32, pos.z as f32)),
            ),
        }
    }
}

/// Fixed 256-slot table of tile behaviours. Unregistered ids behave as air.
#[derive(Debug, Clone)]
pub struct TileRegistry {
    defs: Vec<Option<TileDef>>,
    air: TileDef,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl TileRegistry {
    /// Registry holding only air.
    pub fn empty() -> Self {
        let air = TileDef::air();
        let mut defs = vec![None; 256];
        defs[tiles::AIR as usize] = Some(air.clone());
        Self { defs, air }
    }

    /// The classic tile set (ids 0..=49).
    pub fn classic() -> Self {
        use tiles::*;

        let mut reg = Self::empty();
        let mut put = |id: TileId, def: TileDef| {
            reg.defs[id as usize] = Some(def);
        };

        put(STONE, TileDef::cube("stone", STONE).with_drop(DropPolicy::single(COBBLESTONE)));
        put(
            GRASS,
            TileDef {
                random_ticks: true,
                ..TileDef::cube("grass", GRASS)
            }
            .with_drop(DropPolicy::single(DIRT))
            .with_hooks(vegetation::GRASS_HOOKS),
        );
        put(DIRT, TileDef::cube("dirt", DIRT));
        put(COBBLESTONE, TileDef::cube("cobblestone", COBBLESTONE));
        put(PLANKS, TileDef::cube("planks", PLANKS));
        put(
            SAPLING,
            TileDef::plant("sapling", SAPLING, 0.4, 0.8).with_hooks(vegetation::SAPLING_HOOKS),
        );
        put(BEDROCK, TileDef::cube("bedrock", BEDROCK));
        put(WATER, TileDef::liquid("water", LiquidKind::Water, false));
        put(STILL_WATER, TileDef::liquid("still_water", LiquidKind::Water, true));
        put(LAVA, TileDef::liquid("lava", LiquidKind::Lava, false));
        put(STILL_LAVA, TileDef::liquid("still_lava", LiquidKind::Lava, true));
        put(SAND, TileDef::cube("sand", SAND).with_hooks(falling::HOOKS));
        put(GRAVEL, TileDef::cube("gravel", GRAVEL).with_hooks(falling::HOOKS));
        put(GOLD_ORE, TileDef::cube("gold_ore", GOLD_ORE).with_drop(DropPolicy::range(GOLD_ORE, 1, 3)));
        put(IRON_ORE, TileDef::cube("iron_ore", IRON_ORE).with_drop(DropPolicy::range(IRON_ORE, 1, 3)));
        put(COAL_ORE, TileDef::cube("coal_ore", COAL_ORE).with_drop(DropPolicy::range(COAL_ORE, 1, 3)));
        put(LOG, TileDef::cube("log", LOG).with_drop(DropPolicy::range(LOG, 3, 5)));
        put(
            LEAVES,
            TileDef::cube("leaves", LEAVES)
                .see_through()
                .with_drop(DropPolicy::rare(SAPLING, 10)),
        );
        put(SPONGE, TileDef::cube("sponge", SPONGE).with_hooks(sponge::HOOKS));
        put(GLASS, TileDef::cube("glass", GLASS).see_through().with_drop(DropPolicy::NONE));
        for (offset, name) in CLOTH_NAMES.iter().enumerate() {
            let id = CLOTH_FIRST + offset as TileId;
            put(id, TileDef::cube(*name, id));
        }
        put(
            DANDELION,
            TileDef::plant("dandelion", DANDELION, 0.2, 0.6).with_hooks(vegetation::FLOWER_HOOKS),
        );
        put(ROSE, TileDef::plant("rose", ROSE, 0.2, 0.6).with_hooks(vegetation::FLOWER_HOOKS));
        put(
            BROWN_MUSHROOM,
            TileDef::plant("brown_mushroom", BROWN_MUSHROOM, 0.2, 0.4)
                .with_hooks(vegetation::MUSHROOM_HOOKS),
        );
        put(
            RED_MUSHROOM,
            TileDef::plant("red_mushroom", RED_MUSHROOM, 0.2, 0.4)
                .with_hooks(vegetation::MUSHROOM_HOOKS),
        );
        put(GOLD_BLOCK, TileDef::cube("gold_block", GOLD_BLOCK));
        put(IRON_BLOCK, TileDef::cube("iron_block", IRON_BLOCK));
        put(
            DOUBLE_SLAB,
            TileDef::cube("double_slab", DOUBLE_SLAB).with_drop(DropPolicy::single(SLAB)),
        );
        put(
            SLAB,
            TileDef {
                solid: false,
                cube: false,
                cull: CullRule::SameTile,
                bounds: Aabb::from_bounds(0.0, 0.0, 0.0, 1.0, 0.5, 1.0),
                ..TileDef::cube("slab", SLAB)
            }
            .with_hooks(slab::HOOKS),
        );
        put(BRICK, TileDef::cube("brick", BRICK));
        put(TNT, TileDef::cube("tnt", TNT).with_drop(DropPolicy::NONE));
        put(BOOKSHELF, TileDef::cube("bookshelf", BOOKSHELF).with_drop(DropPolicy::NONE));
        put(MOSSY_COBBLESTONE, TileDef::cube("mossy_cobblestone", MOSSY_COBBLESTONE));
        put(OBSIDIAN, TileDef::cube("obsidian", OBSIDIAN));

        reg
    }

    /// Behaviour for `id`; unregistered ids resolve to air.
    pub fn get(&self, id: TileId) -> &TileDef {
        self.defs[id as usize].as_ref().unwrap_or(&self.air)
    }

    /// Whether `id` has a registered behaviour.
    pub fn is_registered(&self, id: TileId) -> bool {
        self.defs[id as usize].is_some()
    }

    /// Register a new tile. Fails if the slot is taken.
    pub fn register(&mut self, id: TileId, def: TileDef) -> Result<(), WorldError> {
        if self.is_registered(id) {
            return Err(WorldError::DuplicateTile(id));
        }
        self.defs[id as usize] = Some(def);
        Ok(())
    }

    /// Look up a tile id by registry name.
    pub fn id_by_name(&self, name: &str) -> Result<TileId, WorldError> {
        self.defs
            .iter()
            .position(|def| def.as_ref().is_some_and(|d| d.name == name))
            .map(|idx| idx as TileId)
            .ok_or_else(|| WorldError::UnknownTile(name.to_string()))
    }

    /// Liquid family of `id`.
    pub fn liquid(&self, id: TileId) -> Option<LiquidKind> {
        self.get(id).liquid
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.defs
            .iter()
            .enumerate()
            .filter(|(_, def)| def.is_some())
            .map(|(idx, _)| idx as TileId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn classic_registry_has_expected_flags() {
        let reg = TileRegistry::classic();
        assert_eq!(reg.ids().count(), 50);
        assert!(reg.get(tiles::STONE).solid);
        assert!(!reg.get(tiles::GLASS).solid);
        assert!(!reg.get(tiles::LEAVES).opaque);
        assert!(reg.get(tiles::WATER).opaque);
        assert_eq!(reg.get(tiles::WATER).render_pass, RenderPass::Translucent);
        assert_eq!(reg.get(tiles::LAVA).render_pass, RenderPass::Opaque);
        assert_eq!(reg.get(tiles::LAVA).tick_delay, 5);
        assert_eq!(reg.get(tiles::WATER).tick_delay, 0);
        assert!(!reg.get(tiles::SLAB).cube);
        assert!(reg.get(tiles::DOUBLE_SLAB).solid);
        assert_eq!(reg.liquid(tiles::STILL_LAVA), Some(LiquidKind::Lava));
    }

    #[test]
    fn unregistered_ids_behave_as_air() {
        let reg = TileRegistry::classic();
        assert!(!reg.is_registered(200));
        assert_eq!(reg.get(200).shape, TileShape::Empty);
        assert!(reg.get(200).collision_box(TilePos::new(0, 0, 0)).is_none());
    }

    #[test]
    fn register_rejects_taken_slots() {
        let mut reg = TileRegistry::classic();
        assert!(matches!(
            reg.register(tiles::STONE, TileDef::cube("marble", tiles::STONE)),
            Err(WorldError::DuplicateTile(1))
        ));
        reg.register(100, TileDef::cube("marble", 100)).unwrap();
        assert_eq!(reg.id_by_name("marble").unwrap(), 100);
        assert!(reg.id_by_name("unobtainium").is_err());
    }

    #[test]
    fn collision_boxes_follow_bounds() {
        let reg = TileRegistry::classic();
        let slab = reg.get(tiles::SLAB).collision_box(TilePos::new(2, 3, 4)).unwrap();
        assert_eq!(slab.min, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(slab.max, Vec3::new(3.0, 3.5, 5.0));
        assert!(reg.get(tiles::WATER).collision_box(TilePos::new(0, 0, 0)).is_none());
        assert!(reg.get(tiles::ROSE).collision_box(TilePos::new(0, 0, 0)).is_none());
    }

    #[test]
    fn drop_policies_roll_within_range() {
        let reg = TileRegistry::classic();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let ore = reg.get(tiles::GOLD_ORE).drop.roll(&mut rng).unwrap();
            assert!((1..=3).contains(&ore.count));
            let log = reg.get(tiles::LOG).drop.roll(&mut rng).unwrap();
            assert!((3..=5).contains(&log.count));
        }
        assert_eq!(
            reg.get(tiles::STONE).drop.roll(&mut rng).map(|d| d.tile),
            Some(tiles::COBBLESTONE)
        );
        assert!(reg.get(tiles::TNT).drop.roll(&mut rng).is_none());
        let saplings = (0..1000)
            .filter_map(|_| reg.get(tiles::LEAVES).drop.roll(&mut rng))
            .count();
        assert!(saplings > 40 && saplings < 200, "got {saplings}");
    }
}
