//! Per-frame render step: pull level edits into the mesh cache, cull,
//! rebuild within the frame budget and collect draw lists.

use std::path::Path;

use anyhow::Result;
use blockworld_testkit::{ChunkMeshMetric, MeshMetricSink};
use blockworld_world::{EntityId, Level, RenderPass, SpatialEntityIndex};
use tracing::debug;

use crate::batch::{BatchHandle, BatchSink};
use crate::cache::ChunkMeshCache;
use crate::camera::Camera;
use crate::chunk::ChunkMeshStat;
use crate::config::RenderConfig;
use crate::entity_cull::visible_entities;

/// What one rendered frame did.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Passes compiled this frame.
    pub rebuilt: Vec<ChunkMeshStat>,
    /// Opaque batches to draw, farthest chunk first.
    pub opaque: Vec<BatchHandle>,
    /// Translucent batches to draw, farthest chunk first.
    pub translucent: Vec<BatchHandle>,
    /// Chunks inside the frustum.
    pub visible_chunks: usize,
    /// Entities that may be on screen.
    pub visible_entities: Vec<EntityId>,
    /// Chunks still queued for a rebuild.
    pub pending: usize,
}

/// Runs the per-frame render step over a level.
#[derive(Debug)]
pub struct FrameDriver {
    cache: ChunkMeshCache,
    config: RenderConfig,
    frame: u64,
}

impl FrameDriver {
    /// Driver for `level` with every chunk queued for its first build.
    pub fn new(level: &Level, config: RenderConfig) -> Self {
        Self {
            cache: ChunkMeshCache::new(level, &config),
            config,
            frame: 0,
        }
    }

    /// Mesh cache.
    pub fn cache(&self) -> &ChunkMeshCache {
        &self.cache
    }

    /// Active configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// One render step: absorb level edits, cull, rebuild within budget and
    /// gather the draw lists for both passes.
    pub fn frame(
        &mut self,
        level: &mut Level,
        index: &SpatialEntityIndex,
        camera: &Camera,
        sink: &mut dyn BatchSink,
    ) -> FrameReport {
        self.frame += 1;
        self.cache.absorb_dirty(level);
        let frustum = camera.frustum();
        let visible_chunks = self.cache.cull(&frustum);
        let rebuilt = self.cache.rebuild_dirty(
            level,
            sink,
            camera.position,
            self.config.max_chunk_updates_per_frame,
        );
        let opaque = self
            .cache
            .sort_and_append_visible_chunks(camera.position, RenderPass::Opaque);
        let translucent = self
            .cache
            .sort_and_append_visible_chunks(camera.position, RenderPass::Translucent);
        let visible_entities = visible_entities(index, &frustum, self.config.entity_cell_margin);
        let pending = self.cache.pending_updates();
        debug!(
            frame = self.frame,
            rebuilt = rebuilt.len(),
            visible_chunks,
            entities = visible_entities.len(),
            pending,
            "frame"
        );
        FrameReport {
            frame: self.frame,
            rebuilt,
            opaque,
            translucent,
            visible_chunks,
            visible_entities,
            pending,
        }
    }

    /// Release every batch held by the cache.
    pub fn dispose(&mut self, sink: &mut dyn BatchSink) {
        self.cache.dispose(sink);
    }

    /// Convert stats into serializable metrics for CI artifacts.
    pub fn stats_to_metrics(stats: &[ChunkMeshStat]) -> Vec<ChunkMeshMetric> {
        stats
            .iter()
            .map(|stat| ChunkMeshMetric {
                chunk: [stat.coord.x, stat.coord.y, stat.coord.z],
                pass: stat.pass.index() as u8,
                quads: stat.quads,
                batches: stat.batches,
                hash: stat.hash.to_hex(),
            })
            .collect()
    }

    /// Write metrics to disk using the testkit sink.
    pub fn write_metrics_to_file<P: AsRef<Path>>(stats: &[ChunkMeshStat], path: P) -> Result<()> {
        let metrics = Self::stats_to_metrics(stats);
        let mut sink = MeshMetricSink::create(path)?;
        sink.write(&metrics)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use blockworld_core::{ChunkCoord, TilePos};
    use blockworld_world::{tiles, Entity};
    use glam::Vec3;

    use super::*;
    use crate::batch::MemoryBatchSink;
    use crate::mesh::MeshHash;

    fn scene() -> (Level, SpatialEntityIndex, Camera) {
        let mut level = Level::empty(32, 16, 32).unwrap();
        for x in 0..32 {
            for z in 0..32 {
                level.set_tile_no_update(TilePos::new(x, 0, z), tiles::STONE);
            }
        }
        level.set_tile_no_update(TilePos::new(10, 1, 10), tiles::STILL_WATER);
        let mut index = SpatialEntityIndex::new(level.dims());
        index.insert(Entity::new(Vec3::new(16.0, 1.0, 16.0), 0.3, 1.8));
        let camera = Camera::looking_at(Vec3::new(16.0, 12.0, 48.0), Vec3::new(16.0, 0.0, 16.0), 1.0);
        (level, index, camera)
    }

    #[test]
    fn first_frame_builds_and_draws_visible_chunks() {
        let (mut level, index, camera) = scene();
        let mut driver = FrameDriver::new(&level, RenderConfig::default());
        let mut sink = MemoryBatchSink::new();
        let report = driver.frame(&mut level, &index, &camera, &mut sink);
        assert_eq!(report.frame, 1);
        assert_eq!(report.visible_chunks, 4);
        assert!(report.rebuilt.len() >= 4);
        assert_eq!(report.opaque.len(), 4);
        assert_eq!(report.translucent.len(), 1);
        assert_eq!(report.visible_entities.len(), 1);
        assert_eq!(report.pending, 0);
    }

    #[test]
    fn budget_spreads_rebuilds_over_frames() {
        let (mut level, index, camera) = scene();
        let config = RenderConfig {
            max_chunk_updates_per_frame: 1,
            ..RenderConfig::default()
        };
        let mut driver = FrameDriver::new(&level, config);
        let mut sink = MemoryBatchSink::new();
        let first = driver.frame(&mut level, &index, &camera, &mut sink);
        assert_eq!(first.pending, 3);
        assert_eq!(first.opaque.len(), 1);
        for _ in 0..3 {
            driver.frame(&mut level, &index, &camera, &mut sink);
        }
        assert_eq!(driver.cache().pending_updates(), 0);
    }

    #[test]
    fn edits_between_frames_are_rebuilt() {
        let (mut level, index, camera) = scene();
        let mut driver = FrameDriver::new(&level, RenderConfig::default());
        let mut sink = MemoryBatchSink::new();
        driver.frame(&mut level, &index, &camera, &mut sink);
        level.set_tile(TilePos::new(3, 1, 3), tiles::DIRT);
        let report = driver.frame(&mut level, &index, &camera, &mut sink);
        assert_eq!(report.rebuilt.len(), 2, "both passes of the edited chunk");
        assert!(report.rebuilt.iter().all(|s| s.coord == ChunkCoord::new(0, 0, 0)));
        assert_eq!(report.opaque.len(), 4);
    }

    #[test]
    fn metrics_carry_pass_and_hash() {
        let (mut level, index, camera) = scene();
        let mut driver = FrameDriver::new(&level, RenderConfig::default());
        let mut sink = MemoryBatchSink::new();
        let report = driver.frame(&mut level, &index, &camera, &mut sink);
        let metrics = FrameDriver::stats_to_metrics(&report.rebuilt);
        assert_eq!(metrics.len(), report.rebuilt.len());
        assert!(metrics.iter().any(|m| m.pass == 1));
        assert!(metrics.iter().all(|m| m.hash.len() == 64));
    }

    #[test]
    fn write_metrics_to_file_outputs_json() {
        let stats = vec![ChunkMeshStat {
            coord: ChunkCoord::new(1, 0, -2),
            pass: RenderPass::Opaque,
            quads: 12,
            batches: 1,
            hash: MeshHash([0; 32]),
        }];
        let path = std::env::temp_dir().join("blockworld-mesh-metrics-driver.json");
        FrameDriver::write_metrics_to_file(&stats, &path).expect("metrics write");
        let contents = fs::read_to_string(&path).expect("read metrics");
        assert!(contents.contains("\"quads\""));
    }
}
