//! Renderer tunables.

use serde::{Deserialize, Serialize};

/// Frame-side budgets and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Dirty chunks rebuilt per frame at most; 0 rebuilds every queued chunk.
    pub max_chunk_updates_per_frame: usize,
    /// Camera travel (voxel units) that triggers a re-sort of visible chunks.
    pub resort_distance: f32,
    /// Quads per uploaded batch before the builder starts a new one.
    pub batch_capacity_quads: usize,
    /// Margin added around each spatial cell when culling entities.
    pub entity_cell_margin: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chunk_updates_per_frame: 8,
            resort_distance: 8.0,
            // 524288 floats, 5 per vertex, 4 vertices per quad.
            batch_capacity_quads: 524_288 / 5 / 4,
            entity_cell_margin: 2.0,
        }
    }
}
