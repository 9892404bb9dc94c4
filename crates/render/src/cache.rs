//! Every chunk mesh of a level plus the rebuild queue and draw ordering.

use crate::batch::{BatchBuilder, BatchHandle, BatchSink};
use crate::chunk::{ChunkMeshStat, MeshChunk};
use crate::config::RenderConfig;
use crate::frustum::ViewFrustum;
use blockworld_core::ChunkCoord;
use blockworld_world::{Level, RenderPass};
use glam::Vec3;
use tracing::{debug, trace};

/// Running totals kept by the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Chunk rebuilds performed.
    pub chunks_rebuilt: u64,
    /// Quads emitted across all rebuilds.
    pub quads_emitted: u64,
    /// Batches uploaded across all rebuilds.
    pub batches_uploaded: u64,
}

/// Mesh cache covering a whole level.
#[derive(Debug)]
pub struct ChunkMeshCache {
    chunk_dims: [i32; 3],
    chunks: Vec<MeshChunk>,
    queue: Vec<usize>,
    draw_order: Vec<usize>,
    sorted_at: Option<Vec3>,
    resort_distance: f32,
    batch_capacity_quads: usize,
    counters: CacheCounters,
}

impl ChunkMeshCache {
    /// Cache for `level` with every chunk queued for its first build.
    pub fn new(level: &Level, config: &RenderConfig) -> Self {
        let chunk_dims = level.grid().chunk_dims();
        let dims = level.dims();
        let mut chunks = Vec::new();
        for cz in 0..chunk_dims[2] {
            for cy in 0..chunk_dims[1] {
                for cx in 0..chunk_dims[0] {
                    let mut chunk = MeshChunk::new(ChunkCoord::new(cx, cy, cz), dims);
                    chunk.queued = true;
                    chunks.push(chunk);
                }
            }
        }
        let queue = (0..chunks.len()).collect();
        let draw_order = (0..chunks.len()).collect();
        debug!(chunks = chunks.len(), ?chunk_dims, "chunk mesh cache created");
        Self {
            chunk_dims,
            chunks,
            queue,
            draw_order,
            sorted_at: None,
            resort_distance: config.resort_distance,
            batch_capacity_quads: config.batch_capacity_quads.max(1),
            counters: CacheCounters::default(),
        }
    }

    fn index(&self, coord: ChunkCoord) -> Option<usize> {
        let [nx, ny, nz] = self.chunk_dims;
        if !(0..nx).contains(&coord.x) || !(0..ny).contains(&coord.y) || !(0..nz).contains(&coord.z) {
            return None;
        }
        Some(((coord.z * ny + coord.y) * nx + coord.x) as usize)
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True for a level with no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk mesh at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&MeshChunk> {
        self.index(coord).map(|i| &self.chunks[i])
    }

    /// Chunks waiting for a rebuild.
    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    /// Totals since creation.
    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    /// Flag the chunk at `coord` and queue it. Out-of-range coordinates are ignored.
    pub fn mark_dirty(&mut self, coord: ChunkCoord) {
        let Some(i) = self.index(coord) else {
            return;
        };
        let chunk = &mut self.chunks[i];
        chunk.mark_dirty();
        if !chunk.queued {
            chunk.queued = true;
            self.queue.push(i);
        }
    }

    /// Pull the level's dirty chunks into the queue. Returns how many were taken.
    pub fn absorb_dirty(&mut self, level: &mut Level) -> usize {
        let dirty = level.take_dirty_chunks();
        let count = dirty.len();
        for coord in dirty {
            self.mark_dirty(coord);
        }
        count
    }

    /// Clip every chunk against `frustum`. Returns the visible count.
    pub fn cull(&mut self, frustum: &ViewFrustum) -> usize {
        self.chunks.iter_mut().map(|c| c.clip(frustum)).filter(|&v| v).count()
    }

    /// Rebuild at most `budget` queued chunks (0 means all), visible ones
    /// first and then nearest to `camera_pos`. The rest stay queued.
    pub fn rebuild_dirty(
        &mut self,
        level: &Level,
        sink: &mut dyn BatchSink,
        camera_pos: Vec3,
        budget: usize,
    ) -> Vec<ChunkMeshStat> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        let chunks = &self.chunks;
        self.queue.sort_by(|&a, &b| {
            let (ca, cb) = (&chunks[a], &chunks[b]);
            cb.is_visible()
                .cmp(&ca.is_visible())
                .then_with(|| ca.distance_squared(camera_pos).total_cmp(&cb.distance_squared(camera_pos)))
                .then(a.cmp(&b))
        });
        let take = if budget == 0 { self.queue.len() } else { budget.min(self.queue.len()) };
        let batch: Vec<usize> = self.queue.drain(..take).collect();

        let mut builder = BatchBuilder::new(sink, self.batch_capacity_quads);
        let mut stats = Vec::new();
        for i in batch {
            let chunk = &mut self.chunks[i];
            chunk.queued = false;
            let chunk_stats = chunk.update(level, &mut builder);
            trace!(coord = ?chunk.coord(), passes = chunk_stats.len(), "chunk rebuilt");
            self.counters.chunks_rebuilt += 1;
            for stat in &chunk_stats {
                self.counters.quads_emitted += stat.quads as u64;
                self.counters.batches_uploaded += stat.batches as u64;
            }
            stats.extend(chunk_stats);
        }
        debug!(rebuilt = take, remaining = self.queue.len(), "chunk rebuild pass");
        stats
    }

    /// Batches to draw for `pass`, farthest chunk first.
    ///
    /// The far-to-near order is recomputed only after the camera has moved
    /// more than the resort distance since the previous sort.
    pub fn sort_and_append_visible_chunks(&mut self, camera_pos: Vec3, pass: RenderPass) -> Vec<BatchHandle> {
        let resort = match self.sorted_at {
            None => true,
            Some(at) => at.distance_squared(camera_pos) > self.resort_distance * self.resort_distance,
        };
        if resort {
            let chunks = &self.chunks;
            self.draw_order.sort_by(|&a, &b| {
                chunks[b]
                    .distance_squared(camera_pos)
                    .total_cmp(&chunks[a].distance_squared(camera_pos))
                    .then(a.cmp(&b))
            });
            self.sorted_at = Some(camera_pos);
            trace!(?camera_pos, "visible chunks re-sorted");
        }
        let mut out = Vec::new();
        for &i in &self.draw_order {
            self.chunks[i].append_visible(&mut out, pass);
        }
        out
    }

    /// Chunk coordinates in the current draw order.
    pub fn draw_order(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.draw_order.iter().map(move |&i| self.chunks[i].coord())
    }

    /// Release every batch and requeue all chunks.
    pub fn dispose(&mut self, sink: &mut dyn BatchSink) {
        for (i, chunk) in self.chunks.iter_mut().enumerate() {
            chunk.dispose(sink);
            if !chunk.queued {
                chunk.queued = true;
                self.queue.push(i);
            }
        }
    }
}
