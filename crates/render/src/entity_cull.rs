//! Frustum culling of indexed entities, one spatial cell at a time.

use crate::frustum::ViewFrustum;
use blockworld_physics::Aabb;
use blockworld_world::{EntityId, SpatialEntityIndex};
use glam::Vec3;

/// Entities whose boxes may be inside `frustum`.
///
/// Each occupied cell, grown by `margin` and stretched over any member box
/// that pokes out of it, is tested first. Cells fully inside the frustum
/// contribute all their entities without further tests; partially visible
/// cells test every member box.
pub fn visible_entities(index: &SpatialEntityIndex, frustum: &ViewFrustum, margin: f32) -> Vec<EntityId> {
    let mut visible = Vec::new();
    for (cell, ids) in index.occupied_cells() {
        let grown = cell.grow(Vec3::splat(margin));
        let (mut min, mut max) = (grown.min, grown.max);
        for entity in ids.iter().filter_map(|&id| index.get(id)) {
            min = min.min(entity.bb.min);
            max = max.max(entity.bb.max);
        }
        if !frustum.is_box_in_frustum(min, max) {
            continue;
        }
        let live = ids
            .iter()
            .copied()
            .filter(|&id| index.get(id).is_some_and(|e| !e.is_removed()));
        if frustum.is_box_fully_inside(min, max) {
            visible.extend(live);
        } else {
            visible.extend(live.filter(|&id| index.get(id).is_some_and(|e| entity_visible(frustum, &e.bb))));
        }
    }
    visible.sort_unstable();
    visible
}

fn entity_visible(frustum: &ViewFrustum, bb: &Aabb) -> bool {
    frustum.is_aabb_visible(bb)
}
