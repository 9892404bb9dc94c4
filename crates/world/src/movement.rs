//! Entity movement against the voxel level and other entities.

use crate::entity::EntityId;
use crate::entity_index::SpatialEntityIndex;
use crate::level::Level;
use blockworld_physics::{resolve_movement, Aabb, SweepOutcome};
use glam::Vec3;

/// Boxes that can block `moving` on its way through `delta`: level tiles plus
/// solid entities other than `exclude`.
pub fn obstacles_for(
    level: &Level,
    index: &SpatialEntityIndex,
    exclude: Option<EntityId>,
    moving: &Aabb,
    delta: Vec3,
) -> Vec<Aabb> {
    let swept = moving.expand(delta);
    let mut boxes = level.collision_boxes(&swept);
    boxes.extend(
        index
            .query(exclude, &swept)
            .into_iter()
            .filter_map(|other| index.get(other))
            .filter(|other| other.solid)
            .map(|other| other.bb),
    );
    boxes
}

/// Move entity `id` by `delta`, clipping Y then X then Z.
///
/// Updates the entity's box, position, ground contact and velocity. The
/// index cell is left alone; the caller refiles through
/// [`SpatialEntityIndex::moved`] (which [`SpatialEntityIndex::tick_all`]
/// does). Returns `None` for a dead handle.
pub fn move_entity_with_collision(
    level: &Level,
    index: &mut SpatialEntityIndex,
    id: EntityId,
    delta: Vec3,
) -> Option<SweepOutcome> {
    let bb = index.get(id)?.bb;
    let obstacles = obstacles_for(level, index, Some(id), &bb, delta);
    let outcome = resolve_movement(&bb, delta, &obstacles);
    index.get_mut(id)?.apply_sweep(&outcome);
    Some(outcome)
}
