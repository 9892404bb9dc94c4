//! Batch building and the renderer upload boundary.
//!
//! Tessellation writes quads into a [`BatchBuilder`], which flushes to a
//! [`BatchSink`] whenever the next quad would overflow its capacity. The
//! sink hands back opaque [`BatchHandle`]s; everything past that boundary
//! (buffers, draw calls) belongs to the renderer.

use crate::mesh::{MeshHash, MeshHasher, MeshVertex};
use std::collections::BTreeMap;
use tracing::debug;

/// Opaque handle to an uploaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchHandle(pub u64);

/// Receives finished batches.
pub trait BatchSink {
    /// Store `vertices` (quads, four vertices each) and return a handle.
    fn upload(&mut self, vertices: &[MeshVertex]) -> BatchHandle;
    /// Drop a batch previously returned by [`BatchSink::upload`].
    fn release(&mut self, handle: BatchHandle);
}

/// In-memory sink for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryBatchSink {
    next: u64,
    live: BTreeMap<BatchHandle, Vec<MeshVertex>>,
    uploads: usize,
    releases: usize,
}

impl MemoryBatchSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches uploaded and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total uploads so far.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Total releases so far.
    pub fn releases(&self) -> usize {
        self.releases
    }

    /// Vertices of a live batch.
    pub fn vertices(&self, handle: BatchHandle) -> Option<&[MeshVertex]> {
        self.live.get(&handle).map(Vec::as_slice)
    }
}

impl BatchSink for MemoryBatchSink {
    fn upload(&mut self, vertices: &[MeshVertex]) -> BatchHandle {
        let handle = BatchHandle(self.next);
        self.next += 1;
        self.uploads += 1;
        self.live.insert(handle, vertices.to_vec());
        handle
    }

    fn release(&mut self, handle: BatchHandle) {
        debug_assert!(self.live.contains_key(&handle), "double release of {handle:?}");
        if self.live.remove(&handle).is_some() {
            self.releases += 1;
        }
    }
}

/// Everything one compiled render pass of a chunk owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPass {
    /// Uploaded batches in draw order.
    pub handles: Vec<BatchHandle>,
    /// Quads across all batches.
    pub quads: usize,
    /// Hash of every vertex in emission order.
    pub hash: MeshHash,
}

/// Accumulates quads and flushes full batches to a sink.
pub struct BatchBuilder<'a> {
    sink: &'a mut dyn BatchSink,
    capacity_quads: usize,
    vertices: Vec<MeshVertex>,
    handles: Vec<BatchHandle>,
    quads: usize,
    hasher: MeshHasher,
}

impl<'a> BatchBuilder<'a> {
    /// Builder flushing every `capacity_quads` quads (at least one) into `sink`.
    pub fn new(sink: &'a mut dyn BatchSink, capacity_quads: usize) -> Self {
        let capacity_quads = capacity_quads.max(1);
        Self {
            sink,
            capacity_quads,
            vertices: Vec::with_capacity(capacity_quads.min(4096) * 4),
            handles: Vec::new(),
            quads: 0,
            hasher: MeshHasher::new(),
        }
    }

    /// Quads added since the last [`BatchBuilder::finish`].
    pub fn quads(&self) -> usize {
        self.quads
    }

    /// Append one quad.
    pub fn quad(&mut self, quad: [MeshVertex; 4]) {
        if self.vertices.len() / 4 >= self.capacity_quads {
            debug!(quads = self.vertices.len() / 4, "batch full, flushing");
            self.flush();
        }
        self.hasher.update(&quad);
        self.vertices.extend_from_slice(&quad);
        self.quads += 1;
    }

    fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        self.handles.push(self.sink.upload(&self.vertices));
        self.vertices.clear();
    }

    /// Flush the tail and hand back the pass, or `None` if no quad was added.
    /// The builder is reset for the next pass either way.
    pub fn finish(&mut self) -> Option<CompiledPass> {
        self.flush();
        let pass = CompiledPass {
            handles: std::mem::take(&mut self.handles),
            quads: self.quads,
            hash: self.hasher.finish(),
        };
        self.quads = 0;
        self.hasher = MeshHasher::new();
        (pass.quads > 0).then_some(pass)
    }

    /// Release every batch of `pass` through the builder's sink.
    pub fn release(&mut self, pass: CompiledPass) {
        for handle in pass.handles {
            self.sink.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(i: usize) -> [MeshVertex; 4] {
        let y = i as f32;
        [MeshVertex::new([0.0, y, 0.0], [0.0, 0.0], 1.0); 4]
    }

    #[test]
    fn overflow_splits_into_several_batches() {
        let mut sink = MemoryBatchSink::new();
        let pass = {
            let mut builder = BatchBuilder::new(&mut sink, 4);
            for i in 0..10 {
                builder.quad(quad(i));
            }
            builder.finish().unwrap()
        };
        assert_eq!(pass.quads, 10);
        assert_eq!(pass.handles.len(), 3);
        let sizes: Vec<_> = pass
            .handles
            .iter()
            .map(|h| sink.vertices(*h).unwrap().len() / 4)
            .collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn split_does_not_change_the_hash() {
        let mut sink = MemoryBatchSink::new();
        let mut small = BatchBuilder::new(&mut sink, 3);
        (0..7).for_each(|i| small.quad(quad(i)));
        let a = small.finish().unwrap();
        let mut big = BatchBuilder::new(&mut sink, 100);
        (0..7).for_each(|i| big.quad(quad(i)));
        let b = big.finish().unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.handles.len(), b.handles.len());
    }

    #[test]
    fn empty_pass_uploads_nothing() {
        let mut sink = MemoryBatchSink::new();
        assert!(BatchBuilder::new(&mut sink, 8).finish().is_none());
        assert_eq!(sink.uploads(), 0);
    }

    #[test]
    fn release_returns_batches_to_the_sink() {
        let mut sink = MemoryBatchSink::new();
        let mut builder = BatchBuilder::new(&mut sink, 2);
        (0..5).for_each(|i| builder.quad(quad(i)));
        let pass = builder.finish().unwrap();
        builder.release(pass);
        assert_eq!(sink.live_count(), 0);
        assert_eq!(sink.releases(), 3);
    }
}
