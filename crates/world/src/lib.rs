#![warn(missing_docs)]
//! Voxel level simulation: tile grid, behaviour registry, scheduled and
//! random tile updates, sky light, entities and their spatial index.

mod entity;
mod entity_index;
mod error;
mod falling;
mod fluid;
mod grid;
mod level;
mod lighting;
mod movement;
mod registry;
mod scheduler;
mod slab;
mod sponge;
mod vegetation;

pub use entity::{Entity, EntityId};
pub use entity_index::{SpatialEntityIndex, TickAllReport, CELL_SIZE};
pub use error::WorldError;
pub use falling::landing_cell;
pub use fluid::{can_flow_into, SPONGE_RADIUS};
pub use grid::VoxelGrid;
pub use level::{Level, LevelConfig, StepReport, TreeGrower};
pub use lighting::{LightMap, LIT_BRIGHTNESS, SHADOW_BRIGHTNESS};
pub use movement::{move_entity_with_collision, obstacles_for};
pub use registry::{
    tiles, Collision, CullRule, DropPolicy, LiquidKind, NeighborHook, PlaceHook, RemovedHook,
    RenderPass, TileDef, TileDrop, TileHooks, TileRegistry, TileShape, UpdateHook,
};
pub use scheduler::{ScheduledTick, TickScheduler};
pub use vegetation::ClassicTreeGrower;
