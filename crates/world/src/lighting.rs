//! Column sky-light map.
//!
//! Each (x, z) column stores the height of its topmost light-blocking tile.
//! A cell is lit when it sits at or above that height.

use crate::grid::VoxelGrid;
use crate::registry::TileRegistry;
use blockworld_core::TilePos;

/// Brightness of a lit cell.
pub const LIT_BRIGHTNESS: f32 = 1.0;
/// Brightness of a shadowed cell.
pub const SHADOW_BRIGHTNESS: f32 = 0.6;

/// Per-column light depths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightMap {
    size_x: i32,
    size_z: i32,
    depths: Vec<i32>,
}

impl LightMap {
    /// Compute depths for every column of `grid`.
    pub fn compute(grid: &VoxelGrid, registry: &TileRegistry) -> Self {
        let mut map = Self {
            size_x: grid.size_x(),
            size_z: grid.size_z(),
            depths: vec![0; grid.size_x() as usize * grid.size_z() as usize],
        };
        for z in 0..map.size_z {
            for x in 0..map.size_x {
                map.recompute_column(grid, registry, x, z);
            }
        }
        map
    }

    fn column(&self, x: i32, z: i32) -> Option<usize> {
        ((0..self.size_x).contains(&x) && (0..self.size_z).contains(&z))
            .then(|| (z * self.size_x + x) as usize)
    }

    /// Rescan one column. Returns `(old, new)` depths when they differ.
    pub fn recompute_column(
        &mut self,
        grid: &VoxelGrid,
        registry: &TileRegistry,
        x: i32,
        z: i32,
    ) -> Option<(i32, i32)> {
        let idx = self.column(x, z)?;
        let mut y = grid.size_y() - 1;
        while y > 0 && !registry.get(grid.get(TilePos::new(x, y, z))).opaque {
            y -= 1;
        }
        let old = std::mem::replace(&mut self.depths[idx], y);
        (old != y).then_some((old, y))
    }

    /// Light depth of a column (0 outside the map).
    pub fn depth(&self, x: i32, z: i32) -> i32 {
        self.column(x, z).map_or(0, |idx| self.depths[idx])
    }

    /// Whether `pos` receives sky light. Everything outside the map is lit.
    pub fn is_lit(&self, pos: TilePos) -> bool {
        match self.column(pos.x, pos.z) {
            Some(idx) => pos.y >= self.depths[idx],
            None => true,
        }
    }

    /// Brightness at `pos`.
    pub fn brightness(&self, pos: TilePos) -> f32 {
        if self.is_lit(pos) {
            LIT_BRIGHTNESS
        } else {
            SHADOW_BRIGHTNESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tiles;

    #[test]
    fn opaque_tiles_shadow_the_column_below() {
        let reg = TileRegistry::classic();
        let mut grid = VoxelGrid::new(2, 8, 2).unwrap();
        grid.set(TilePos::new(0, 4, 0), tiles::STONE);
        grid.set(TilePos::new(1, 4, 1), tiles::GLASS);
        let light = LightMap::compute(&grid, &reg);
        assert_eq!(light.depth(0, 0), 4);
        assert!(light.is_lit(TilePos::new(0, 4, 0)));
        assert!(!light.is_lit(TilePos::new(0, 3, 0)));
        assert_eq!(light.brightness(TilePos::new(0, 3, 0)), SHADOW_BRIGHTNESS);
        // glass lets light through
        assert!(light.is_lit(TilePos::new(1, 1, 1)));
        // outside the grid is lit
        assert!(light.is_lit(TilePos::new(-1, 0, 0)));
    }

    #[test]
    fn recompute_reports_changes() {
        let reg = TileRegistry::classic();
        let mut grid = VoxelGrid::new(1, 8, 1).unwrap();
        let mut light = LightMap::compute(&grid, &reg);
        grid.set(TilePos::new(0, 6, 0), tiles::DIRT);
        assert_eq!(light.recompute_column(&grid, &reg, 0, 0), Some((0, 6)));
        assert_eq!(light.recompute_column(&grid, &reg, 0, 0), None);
    }
}
