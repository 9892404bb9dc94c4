//! Turns tiles into shaded quads.
//!
//! Box-shaped tiles emit one quad per visible face of their bounds; plants
//! emit two crossed diagonal quads drawn from both sides. Each face is shaded
//! by its direction and by the brightness of the cell it faces.

use crate::batch::BatchBuilder;
use crate::mesh::MeshVertex;
use blockworld_core::{Face, TileId, TilePos};
use blockworld_world::{CullRule, Level, TileDef, TileShape};
use glam::Vec3;

/// Half-width of the crossed plant quads.
const CROSS_HALF_WIDTH: f32 = 0.45;
const ATLAS_TILES: f32 = 16.0;

/// Directional shade of a face.
pub fn face_shade(face: Face) -> f32 {
    match face {
        Face::Up => 1.0,
        Face::Down => 0.5,
        Face::North | Face::South => 0.8,
        Face::West | Face::East => 0.6,
    }
}

fn atlas_uv(tile: TileId) -> ([f32; 2], [f32; 2]) {
    let u0 = f32::from(tile % 16) / ATLAS_TILES;
    let v0 = f32::from(tile / 16) / ATLAS_TILES;
    ([u0, v0], [u0 + 1.0 / ATLAS_TILES, v0 + 1.0 / ATLAS_TILES])
}

/// Whether the face of `def`'s bounds on `face` sits on the cell boundary.
fn is_flush(def: &TileDef, face: Face) -> bool {
    let b = &def.bounds;
    match face {
        Face::Down => b.min.y <= 0.0,
        Face::Up => b.max.y >= 1.0,
        Face::North => b.min.z <= 0.0,
        Face::South => b.max.z >= 1.0,
        Face::West => b.min.x <= 0.0,
        Face::East => b.max.x >= 1.0,
    }
}

/// Whether the face of the tile at `pos` on `face` can be seen.
pub fn face_visible(level: &Level, pos: TilePos, face: Face) -> bool {
    let tile = level.get_tile(pos);
    let def = level.registry().get(tile);
    let neighbor = level.get_tile(pos.step(face));
    let other = level.registry().get(neighbor);
    match def.cull {
        CullRule::SameTile if neighbor == tile => return false,
        CullRule::SameLiquid if def.liquid.is_some() && other.liquid == def.liquid => return false,
        _ => {}
    }
    !is_flush(def, face) || !(other.solid && other.cube)
}

fn face_corners(min: Vec3, max: Vec3, face: Face) -> [Vec3; 4] {
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (max.x, max.y, max.z);
    let v = Vec3::new;
    match face {
        Face::Down => [v(x0, y0, z1), v(x0, y0, z0), v(x1, y0, z0), v(x1, y0, z1)],
        Face::Up => [v(x1, y1, z1), v(x1, y1, z0), v(x0, y1, z0), v(x0, y1, z1)],
        Face::North => [v(x0, y1, z0), v(x1, y1, z0), v(x1, y0, z0), v(x0, y0, z0)],
        Face::South => [v(x0, y1, z1), v(x0, y0, z1), v(x1, y0, z1), v(x1, y1, z1)],
        Face::West => [v(x0, y1, z1), v(x0, y1, z0), v(x0, y0, z0), v(x0, y0, z1)],
        Face::East => [v(x1, y0, z1), v(x1, y0, z0), v(x1, y1, z0), v(x1, y1, z1)],
    }
}

fn quad(corners: [Vec3; 4], tile: TileId, shade: f32) -> [MeshVertex; 4] {
    let ([u0, v0], [u1, v1]) = atlas_uv(tile);
    let uvs = [[u0, v0], [u0, v1], [u1, v1], [u1, v0]];
    let mut out = [MeshVertex::new([0.0; 3], [0.0; 2], shade); 4];
    for (i, vertex) in out.iter_mut().enumerate() {
        vertex.position = corners[i].to_array();
        vertex.uv = uvs[i];
    }
    out
}

/// Emit the visible geometry of the tile at `pos`. Returns the quads added.
pub fn tessellate_tile(level: &Level, pos: TilePos, builder: &mut BatchBuilder<'_>) -> usize {
    let tile = level.get_tile(pos);
    let def = level.registry().get(tile);
    let origin = Vec3::new(pos.x as f32, pos.y as f32, pos.z as f32);
    match def.shape {
        TileShape::Empty => 0,
        TileShape::Block | TileShape::Liquid => {
            let (min, max) = (origin + def.bounds.min, origin + def.bounds.max);
            let mut emitted = 0;
            for face in Face::ALL {
                if !face_visible(level, pos, face) {
                    continue;
                }
                let shade = face_shade(face) * level.brightness(pos.step(face));
                builder.quad(quad(face_corners(min, max, face), tile, shade));
                emitted += 1;
            }
            emitted
        }
        TileShape::Cross => {
            let shade = level.brightness(pos);
            let c = origin + Vec3::new(0.5, 0.0, 0.5);
            let (lo, hi) = (c.x - CROSS_HALF_WIDTH, c.x + CROSS_HALF_WIDTH);
            let (near, far) = (c.z - CROSS_HALF_WIDTH, c.z + CROSS_HALF_WIDTH);
            let (y0, y1) = (origin.y, origin.y + 1.0);
            let diagonals = [
                [Vec3::new(lo, y1, near), Vec3::new(lo, y0, near), Vec3::new(hi, y0, far), Vec3::new(hi, y1, far)],
                [Vec3::new(lo, y1, far), Vec3::new(lo, y0, far), Vec3::new(hi, y0, near), Vec3::new(hi, y1, near)],
            ];
            for [a, b, c, d] in diagonals {
                builder.quad(quad([a, b, c, d], tile, shade));
                builder.quad(quad([d, c, b, a], tile, shade));
            }
            4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MemoryBatchSink;
    use blockworld_world::tiles;

    fn level() -> Level {
        Level::empty(8, 8, 8).unwrap()
    }

    fn count(level: &Level, pos: TilePos) -> (usize, Vec<MeshVertex>) {
        let mut sink = MemoryBatchSink::new();
        let mut builder = BatchBuilder::new(&mut sink, 64);
        let n = tessellate_tile(level, pos, &mut builder);
        let vertices = match builder.finish() {
            Some(pass) => pass
                .handles
                .iter()
                .flat_map(|h| sink.vertices(*h).unwrap_or(&[]).to_vec())
                .collect(),
            None => Vec::new(),
        };
        (n, vertices)
    }

    #[test]
    fn lone_cube_shows_six_faces() {
        let mut level = level();
        let pos = TilePos::new(3, 3, 3);
        level.set_tile(pos, tiles::STONE);
        let (n, vertices) = count(&level, pos);
        assert_eq!(n, 6);
        assert_eq!(vertices.len(), 24);
    }

    #[test]
    fn solid_neighbours_hide_faces() {
        let mut level = level();
        let pos = TilePos::new(3, 3, 3);
        level.set_tile(pos, tiles::STONE);
        level.set_tile(pos.above(), tiles::DIRT);
        level.set_tile(pos.offset(1, 0, 0), tiles::GLASS);
        assert!(!face_visible(&level, pos, Face::Up));
        assert!(face_visible(&level, pos, Face::East), "glass does not hide faces");
        assert_eq!(count(&level, pos).0, 5);
    }

    #[test]
    fn glass_hides_against_glass_only() {
        let mut level = level();
        let a = TilePos::new(2, 2, 2);
        level.set_tile(a, tiles::GLASS);
        level.set_tile(a.offset(1, 0, 0), tiles::GLASS);
        level.set_tile(a.offset(-1, 0, 0), tiles::LEAVES);
        assert!(!face_visible(&level, a, Face::East));
        assert!(face_visible(&level, a, Face::West));
    }

    #[test]
    fn slab_top_is_always_drawn() {
        let mut level = level();
        let pos = TilePos::new(4, 1, 4);
        level.set_tile(pos, tiles::SLAB);
        level.set_tile(pos.above(), tiles::STONE);
        level.set_tile(pos.below(), tiles::STONE);
        assert!(face_visible(&level, pos, Face::Up));
        assert!(!face_visible(&level, pos, Face::Down));
    }

    #[test]
    fn water_hides_against_water() {
        let mut level = level();
        let pos = TilePos::new(4, 4, 4);
        level.set_tile_no_update(pos, tiles::STILL_WATER);
        level.set_tile_no_update(pos.offset(0, 0, 1), tiles::WATER);
        assert!(!face_visible(&level, pos, Face::South));
        assert!(face_visible(&level, pos, Face::North));
    }

    #[test]
    fn shading_follows_face_and_light() {
        let mut level = level();
        let pos = TilePos::new(3, 3, 3);
        level.set_tile(pos, tiles::STONE);
        level.set_tile(TilePos::new(4, 6, 3), tiles::STONE);
        let (_, vertices) = count(&level, pos);
        let shades: Vec<f32> = vertices.chunks(4).map(|q| q[0].shade).collect();
        // The block shadows its own column below; the stone overhead shadows the east cell.
        let expected = [0.5 * 0.6, 1.0, 0.8, 0.8, 0.6, 0.6 * 0.6];
        assert_eq!(shades.len(), expected.len());
        for (got, want) in shades.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn plants_emit_two_double_sided_diagonals() {
        let mut level = level();
        let pos = TilePos::new(1, 1, 1);
        level.set_tile(pos, tiles::ROSE);
        assert_eq!(count(&level, pos).0, 4);
    }
}
