#![warn(missing_docs)]
//! Headless chunk meshing, frustum culling and draw-list assembly.
//!
//! Geometry is compiled into batches through a [`BatchSink`]; a GPU backend
//! implements the sink, tests and the headless driver use
//! [`MemoryBatchSink`].

mod batch;
mod cache;
mod camera;
mod chunk;
mod config;
mod driver;
mod entity_cull;
mod frustum;
mod mesh;
mod tessellate;

pub use batch::{BatchBuilder, BatchHandle, BatchSink, CompiledPass, MemoryBatchSink};
pub use cache::{CacheCounters, ChunkMeshCache};
pub use camera::Camera;
pub use chunk::{ChunkMeshStat, DirtyPasses, MeshChunk};
pub use config::RenderConfig;
pub use driver::{FrameDriver, FrameReport};
pub use entity_cull::visible_entities;
pub use frustum::ViewFrustum;
pub use mesh::{MeshHash, MeshHasher, MeshVertex};
pub use tessellate::{face_shade, face_visible, tessellate_tile};
