//! Per-chunk compiled geometry and its dirty/visibility gating.

use crate::batch::{BatchBuilder, BatchHandle, BatchSink, CompiledPass};
use crate::frustum::ViewFrustum;
use crate::mesh::MeshHash;
use crate::tessellate::tessellate_tile;
use blockworld_core::{ChunkCoord, TilePos, AIR, CHUNK_SIZE};
use blockworld_world::{Level, RenderPass};
use glam::Vec3;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Render passes whose compiled batches are out of date.
    pub struct DirtyPasses: u8 {
        /// Opaque geometry.
        const OPAQUE = 0b01;
        /// Alpha-blended geometry.
        const TRANSLUCENT = 0b10;
    }
}

impl DirtyPasses {
    /// Flag for a single pass.
    pub fn for_pass(pass: RenderPass) -> Self {
        match pass {
            RenderPass::Opaque => Self::OPAQUE,
            RenderPass::Translucent => Self::TRANSLUCENT,
        }
    }
}

/// Result of compiling one pass of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeshStat {
    /// Chunk the pass belongs to.
    pub coord: ChunkCoord,
    /// Pass that was compiled.
    pub pass: RenderPass,
    /// Quads emitted.
    pub quads: usize,
    /// Batches uploaded.
    pub batches: usize,
    /// Hash of the emitted vertices.
    pub hash: MeshHash,
}

/// Compiled geometry for one 16³ chunk.
#[derive(Debug)]
pub struct MeshChunk {
    coord: ChunkCoord,
    min: TilePos,
    max: TilePos,
    dirty: DirtyPasses,
    passes: [Option<CompiledPass>; 2],
    visible: bool,
    pub(crate) queued: bool,
}

impl MeshChunk {
    /// A chunk over the cells of `coord` that lie inside `world_dims`.
    /// Both passes start dirty.
    pub fn new(coord: ChunkCoord, world_dims: [i32; 3]) -> Self {
        let min = coord.origin();
        let max = TilePos::new(
            (min.x + CHUNK_SIZE).min(world_dims[0]),
            (min.y + CHUNK_SIZE).min(world_dims[1]),
            (min.z + CHUNK_SIZE).min(world_dims[2]),
        );
        Self {
            coord,
            min,
            max,
            dirty: DirtyPasses::all(),
            passes: [None, None],
            visible: false,
            queued: false,
        }
    }

    /// Chunk coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Dirty passes.
    pub fn dirty(&self) -> DirtyPasses {
        self.dirty
    }

    /// Whether `pass` needs recompiling.
    pub fn is_dirty(&self, pass: RenderPass) -> bool {
        self.dirty.contains(DirtyPasses::for_pass(pass))
    }

    /// Visibility as of the last [`clip`](Self::clip).
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Compiled batches for `pass`, if any.
    pub fn compiled(&self, pass: RenderPass) -> Option<&CompiledPass> {
        self.passes[pass.index()].as_ref()
    }

    /// World-space bounds of the chunk (clamped to the level).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (pos_vec(self.min), pos_vec(self.max))
    }

    /// Flag both passes for recompilation on the next [`update`](Self::update).
    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyPasses::all();
    }

    /// Refresh visibility against `frustum`.
    pub fn clip(&mut self, frustum: &ViewFrustum) -> bool {
        let (min, max) = self.bounds();
        self.visible = frustum.is_box_in_frustum(min, max);
        self.visible
    }

    /// Squared distance from the chunk centre to `point`.
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        let (min, max) = self.bounds();
        ((min + max) * 0.5).distance_squared(point)
    }

    /// Recompile both passes from `level`.
    ///
    /// A pass that emits nothing stays dirty. The translucent pass is only
    /// attempted when the opaque scan met a translucent tile.
    pub fn update(&mut self, level: &Level, builder: &mut BatchBuilder<'_>) -> Vec<ChunkMeshStat> {
        for pass in self.passes.iter_mut() {
            if let Some(old) = pass.take() {
                builder.release(old);
            }
        }
        self.dirty = DirtyPasses::all();

        let mut stats = Vec::new();
        let mut mixes_passes = false;
        for pass in RenderPass::ALL {
            if pass == RenderPass::Translucent && !mixes_passes {
                break;
            }
            for y in self.min.y..self.max.y {
                for z in self.min.z..self.max.z {
                    for x in self.min.x..self.max.x {
                        let pos = TilePos::new(x, y, z);
                        let tile = level.get_tile(pos);
                        if tile == AIR {
                            continue;
                        }
                        let tile_pass = level.registry().get(tile).render_pass;
                        if tile_pass == pass {
                            tessellate_tile(level, pos, builder);
                        } else if tile_pass == RenderPass::Translucent {
                            mixes_passes = true;
                        }
                    }
                }
            }
            if let Some(compiled) = builder.finish() {
                stats.push(ChunkMeshStat {
                    coord: self.coord,
                    pass,
                    quads: compiled.quads,
                    batches: compiled.handles.len(),
                    hash: compiled.hash,
                });
                self.dirty.remove(DirtyPasses::for_pass(pass));
                self.passes[pass.index()] = Some(compiled);
            }
        }
        stats
    }

    /// Push this chunk's batches for `pass` when it is visible and compiled.
    pub fn append_visible(&self, out: &mut Vec<BatchHandle>, pass: RenderPass) -> usize {
        if !self.visible || self.is_dirty(pass) {
            return 0;
        }
        let compiled = self.passes[pass.index()].as_ref();
        debug_assert!(compiled.is_some(), "clean pass without batches in {:?}", self.coord);
        match compiled {
            Some(compiled) => {
                out.extend_from_slice(&compiled.handles);
                compiled.handles.len()
            }
            None => 0,
        }
    }

    /// Release every batch and mark the chunk dirty.
    pub fn dispose(&mut self, sink: &mut dyn BatchSink) {
        for pass in self.passes.iter_mut() {
            if let Some(old) = pass.take() {
                for handle in old.handles {
                    sink.release(handle);
                }
            }
        }
        self.dirty = DirtyPasses::all();
    }
}

fn pos_vec(pos: TilePos) -> Vec3 {
    Vec3::new(pos.x as f32, pos.y as f32, pos.z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MemoryBatchSink;
    use crate::camera::Camera;
    use blockworld_world::tiles;

    fn rebuild(chunk: &mut MeshChunk, level: &Level, sink: &mut MemoryBatchSink) -> Vec<ChunkMeshStat> {
        let mut builder = BatchBuilder::new(sink, 1024);
        chunk.update(level, &mut builder)
    }

    #[test]
    fn chunk_bounds_clamp_to_level() {
        let chunk = MeshChunk::new(ChunkCoord::new(1, 0, 0), [20, 8, 16]);
        let (min, max) = chunk.bounds();
        assert_eq!(min, Vec3::new(16.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(20.0, 8.0, 16.0));
    }

    #[test]
    fn opaque_only_chunk_leaves_translucent_dirty() {
        let mut level = Level::empty(16, 16, 16).unwrap();
        level.set_tile(TilePos::new(2, 2, 2), tiles::STONE);
        let mut chunk = MeshChunk::new(ChunkCoord::new(0, 0, 0), level.dims());
        let mut sink = MemoryBatchSink::new();
        let stats = rebuild(&mut chunk, &level, &mut sink);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].quads, 6);
        assert!(!chunk.is_dirty(RenderPass::Opaque));
        assert!(chunk.is_dirty(RenderPass::Translucent));
    }

    #[test]
    fn mixed_chunk_compiles_both_passes() {
        let mut level = Level::empty(16, 16, 16).unwrap();
        level.set_tile(TilePos::new(2, 2, 2), tiles::STONE);
        level.set_tile_no_update(TilePos::new(5, 2, 2), tiles::STILL_WATER);
        let mut chunk = MeshChunk::new(ChunkCoord::new(0, 0, 0), level.dims());
        let mut sink = MemoryBatchSink::new();
        let stats = rebuild(&mut chunk, &level, &mut sink);
        assert_eq!(stats.len(), 2);
        assert!(chunk.dirty().is_empty());
    }

    #[test]
    fn rebuild_releases_previous_batches() {
        let mut level = Level::empty(16, 16, 16).unwrap();
        level.set_tile(TilePos::new(2, 2, 2), tiles::STONE);
        let mut chunk = MeshChunk::new(ChunkCoord::new(0, 0, 0), level.dims());
        let mut sink = MemoryBatchSink::new();
        rebuild(&mut chunk, &level, &mut sink);
        chunk.mark_dirty();
        rebuild(&mut chunk, &level, &mut sink);
        assert_eq!(sink.live_count(), 1);
        chunk.dispose(&mut sink);
        assert_eq!(sink.live_count(), 0);
        assert_eq!(chunk.dirty(), DirtyPasses::all());
    }

    #[test]
    fn append_visible_requires_visibility_and_clean_pass() {
        let mut level = Level::empty(16, 16, 16).unwrap();
        level.set_tile(TilePos::new(8, 8, 8), tiles::STONE);
        let mut chunk = MeshChunk::new(ChunkCoord::new(0, 0, 0), level.dims());
        let mut sink = MemoryBatchSink::new();
        rebuild(&mut chunk, &level, &mut sink);

        let mut out = Vec::new();
        assert_eq!(chunk.append_visible(&mut out, RenderPass::Opaque), 0, "not clipped yet");

        let camera = Camera::looking_at(Vec3::new(8.0, 8.0, 40.0), Vec3::new(8.0, 8.0, 8.0), 1.0);
        assert!(chunk.clip(&camera.frustum()));
        assert_eq!(chunk.append_visible(&mut out, RenderPass::Opaque), 1);
        assert_eq!(chunk.append_visible(&mut out, RenderPass::Translucent), 0);

        chunk.mark_dirty();
        assert_eq!(chunk.append_visible(&mut out, RenderPass::Opaque), 0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn camera_facing_away_hides_chunk() {
        let level = Level::empty(16, 16, 16).unwrap();
        let mut chunk = MeshChunk::new(ChunkCoord::new(0, 0, 0), level.dims());
        let camera = Camera::looking_at(Vec3::new(8.0, 8.0, 40.0), Vec3::new(8.0, 8.0, 80.0), 1.0);
        assert!(!chunk.clip(&camera.frustum()));
    }
}
