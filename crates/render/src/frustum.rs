//! View frustum planes and box tests.

use blockworld_physics::Aabb;
use glam::{Mat4, Vec3, Vec4};

/// Six clipping planes derived from a camera transform.
///
/// Planes are stored as `(normal, d)` with unit normals pointing inward, so
/// `normal.dot(p) + d >= 0` means `p` is on the visible side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrustum {
    planes: [Vec4; 6],
}

impl ViewFrustum {
    /// Plane order: left, right, bottom, top, near, far.
    pub const PLANE_NAMES: [&'static str; 6] = ["left", "right", "bottom", "top", "near", "far"];

    /// Build from separate projection and view matrices.
    pub fn from_matrices(projection: Mat4, view: Mat4) -> Self {
        Self::from_view_projection(projection * view)
    }

    /// Build from a combined view-projection matrix with 0..1 clip depth.
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let raw = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];
        Self {
            planes: raw.map(normalize_plane),
        }
    }

    /// Inward plane equations in [`ViewFrustum::PLANE_NAMES`] order.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Signed distance of `point` from plane `i`.
    pub fn distance(&self, i: usize, point: Vec3) -> f32 {
        self.planes[i].truncate().dot(point) + self.planes[i].w
    }

    /// Fast reject: false only if all eight corners lie behind one plane.
    ///
    /// Boxes near frustum corners can pass while outside; boxes that reach
    /// inside are never rejected.
    pub fn is_box_in_frustum(&self, min: Vec3, max: Vec3) -> bool {
        let corners = corners(min, max);
        (0..6).all(|i| corners.iter().any(|&c| self.distance(i, c) >= 0.0))
    }

    /// True when every corner is inside every plane.
    pub fn is_box_fully_inside(&self, min: Vec3, max: Vec3) -> bool {
        let corners = corners(min, max);
        (0..6).all(|i| corners.iter().all(|&c| self.distance(i, c) >= 0.0))
    }

    /// [`ViewFrustum::is_box_in_frustum`] for an [`Aabb`].
    pub fn is_aabb_visible(&self, aabb: &Aabb) -> bool {
        self.is_box_in_frustum(aabb.min, aabb.max)
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > f32::EPSILON {
        plane / len
    } else {
        plane
    }
}

fn corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}
