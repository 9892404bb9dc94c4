//! Dense voxel grid.

use crate::error::WorldError;
use blockworld_core::{ChunkCoord, TileId, TilePos, AIR, CHUNK_SIZE};

/// Dense 3D array of tile ids.
///
/// `size_y` is the vertical extent. Voxels are stored at
/// `(y * size_z + z) * size_x + x`. Reads outside the grid return [`AIR`];
/// writes outside the grid are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    size_x: i32,
    size_y: i32,
    size_z: i32,
    tiles: Vec<TileId>,
}

impl VoxelGrid {
    /// An all-air grid.
    pub fn new(size_x: i32, size_y: i32, size_z: i32) -> Result<Self, WorldError> {
        let volume = Self::checked_volume(size_x, size_y, size_z)?;
        Ok(Self {
            size_x,
            size_y,
            size_z,
            tiles: vec![AIR; volume],
        })
    }

    /// Wrap an existing tile array laid out in grid order.
    pub fn from_tiles(
        size_x: i32,
        size_y: i32,
        size_z: i32,
        tiles: Vec<TileId>,
    ) -> Result<Self, WorldError> {
        let expected = Self::checked_volume(size_x, size_y, size_z)?;
        if tiles.len() != expected {
            return Err(WorldError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            size_x,
            size_y,
            size_z,
            tiles,
        })
    }

    fn checked_volume(x: i32, y: i32, z: i32) -> Result<usize, WorldError> {
        if x <= 0 || y <= 0 || z <= 0 {
            return Err(WorldError::InvalidDimensions { x, y, z });
        }
        Ok(x as usize * y as usize * z as usize)
    }

    /// Extent along X.
    pub fn size_x(&self) -> i32 {
        self.size_x
    }

    /// Vertical extent.
    pub fn size_y(&self) -> i32 {
        self.size_y
    }

    /// Extent along Z.
    pub fn size_z(&self) -> i32 {
        self.size_z
    }

    /// Number of voxels.
    pub fn volume(&self) -> usize {
        self.tiles.len()
    }

    /// Number of mesh chunks along each axis (partial chunks included).
    pub fn chunk_dims(&self) -> [i32; 3] {
        [self.size_x, self.size_y, self.size_z].map(|n| (n + CHUNK_SIZE - 1) / CHUNK_SIZE)
    }

    /// Whether `chunk` overlaps the grid.
    pub fn contains_chunk(&self, chunk: ChunkCoord) -> bool {
        let [cx, cy, cz] = self.chunk_dims();
        (0..cx).contains(&chunk.x) && (0..cy).contains(&chunk.y) && (0..cz).contains(&chunk.z)
    }

    /// Whether `pos` lies inside the grid.
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        (0..self.size_x).contains(&pos.x)
            && (0..self.size_y).contains(&pos.y)
            && (0..self.size_z).contains(&pos.z)
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos).then(|| {
            ((pos.y as usize * self.size_z as usize) + pos.z as usize) * self.size_x as usize
                + pos.x as usize
        })
    }

    /// Tile at `pos`, or air outside the grid.
    pub fn get(&self, pos: TilePos) -> TileId {
        self.index(pos).map_or(AIR, |idx| self.tiles[idx])
    }

    /// Write `tile` at `pos`. Returns the previous tile if the cell changed.
    pub fn set(&mut self, pos: TilePos, tile: TileId) -> Option<TileId> {
        let idx = self.index(pos)?;
        let old = self.tiles[idx];
        if old == tile {
            return None;
        }
        self.tiles[idx] = tile;
        Some(old)
    }

    /// Fill the inclusive box `min..=max` (clipped to the grid).
    pub fn fill(&mut self, min: TilePos, max: TilePos, tile: TileId) {
        for y in min.y.max(0)..=max.y.min(self.size_y - 1) {
            for z in min.z.max(0)..=max.z.min(self.size_z - 1) {
                for x in min.x.max(0)..=max.x.min(self.size_x - 1) {
                    self.set(TilePos::new(x, y, z), tile);
                }
            }
        }
    }

    /// Raw tile array in grid order.
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    /// Count voxels holding `tile`.
    pub fn count(&self, tile: TileId) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_air_and_ignores_writes() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        assert_eq!(grid.set(TilePos::new(-1, 0, 0), 1), None);
        assert_eq!(grid.set(TilePos::new(0, 4, 0), 1), None);
        assert_eq!(grid.get(TilePos::new(0, 4, 0)), AIR);
        assert_eq!(grid.count(1), 0);
    }

    #[test]
    fn set_reports_previous_tile_only_on_change() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        let pos = TilePos::new(1, 2, 3);
        assert_eq!(grid.set(pos, 5), Some(AIR));
        assert_eq!(grid.set(pos, 5), None);
        assert_eq!(grid.get(pos), 5);
        // y-major layout
        assert_eq!(grid.tiles()[(2 * 4 + 3) * 4 + 1], 5);
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        assert!(matches!(
            VoxelGrid::new(0, 4, 4),
            Err(WorldError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            VoxelGrid::from_tiles(2, 2, 2, vec![0; 7]),
            Err(WorldError::TileCountMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn chunk_dims_round_up() {
        let grid = VoxelGrid::new(33, 16, 1).unwrap();
        assert_eq!(grid.chunk_dims(), [3, 1, 1]);
        assert!(grid.contains_chunk(ChunkCoord::new(2, 0, 0)));
        assert!(!grid.contains_chunk(ChunkCoord::new(3, 0, 0)));
    }

    #[test]
    fn fill_clips_to_grid() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
        grid.fill(TilePos::new(-5, 0, -5), TilePos::new(10, 0, 10), 7);
        assert_eq!(grid.count(7), 16);
    }
}
