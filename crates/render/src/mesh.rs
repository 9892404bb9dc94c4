use blake3::Hasher;
use std::fmt;

/// Hash of a compiled pass's vertex bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Hash of a pass that produced no vertices.
    pub const EMPTY: MeshHash = MeshHash([0; 32]);

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for MeshHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Packed vertex layout produced by the tessellator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in world coordinates.
    pub position: [f32; 3],
    /// Texture coordinates in the 16x16 tile atlas.
    pub uv: [f32; 2],
    /// Face shade times neighbour brightness.
    pub shade: f32,
}

impl MeshVertex {
    /// Build a vertex.
    pub fn new(position: [f32; 3], uv: [f32; 2], shade: f32) -> Self {
        Self { position, uv, shade }
    }
}

/// Incremental blake3 hash over every vertex a pass emits.
#[derive(Debug, Default)]
pub struct MeshHasher {
    hasher: Hasher,
    vertices: usize,
}

impl MeshHasher {
    /// Fresh hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed vertices in emission order.
    pub fn update(&mut self, vertices: &[MeshVertex]) {
        self.hasher.update(bytemuck::cast_slice(vertices));
        self.vertices += vertices.len();
    }

    /// Final hash; [`MeshHash::EMPTY`] if nothing was fed.
    pub fn finish(&self) -> MeshHash {
        if self.vertices == 0 {
            return MeshHash::EMPTY;
        }
        MeshHash(*self.hasher.finalize().as_bytes())
    }
}
