use blockworld_core::Face;
use glam::Vec3;

/// Squared axis delta below which a ray is treated as parallel to a face plane.
const PARALLEL_EPSILON: f32 = 1.0e-7;

/// World axis selector for the per-axis sweep routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal X.
    X,
    /// Vertical Y.
    Y,
    /// Horizontal Z.
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two axes perpendicular to `self`.
    fn others(self) -> [usize; 2] {
        match self {
            Axis::X => [1, 2],
            Axis::Y => [0, 2],
            Axis::Z => [0, 1],
        }
    }
}

/// Result of [`Aabb::clip`]: where a segment first enters the box and through which face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entry point on the box surface.
    pub point: Vec3,
    /// Face the segment crossed.
    pub face: Face,
}

/// Axis-aligned bounding box used for collisions, selection and culling.
///
/// Value type: [`Aabb::expand`], [`Aabb::grow`], [`Aabb::shrink`] and
/// [`Aabb::translated`] return new boxes; [`Aabb::move_by`] is the only
/// operation that mutates in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
    /// Gap kept between boxes when a sweep is clipped. Zero by default.
    pub epsilon: f32,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "inverted box {min} / {max}");
        Self {
            min,
            max,
            epsilon: 0.0,
        }
    }

    /// Create a box from the six scalar bounds.
    pub fn from_bounds(x0: f32, y0: f32, z0: f32, x1: f32, y1: f32, z1: f32) -> Self {
        Self::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }

    /// The unit cube occupying voxel `(x, y, z)`.
    pub fn unit_cube(x: i32, y: i32, z: i32) -> Self {
        let min = Vec3::new(x as f32, y as f32, z as f32);
        Self::new(min, min + Vec3::ONE)
    }

    /// Same box with a different clip epsilon.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Centre point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Swept volume: grows only the face on the side of travel for each axis.
    pub fn expand(&self, delta: Vec3) -> Self {
        let mut out = *self;
        for axis in 0..3 {
            if delta[axis] < 0.0 {
                out.min[axis] += delta[axis];
            } else if delta[axis] > 0.0 {
                out.max[axis] += delta[axis];
            }
        }
        out
    }

    /// Symmetric inflate: both corners move outward by `delta`.
    pub fn grow(&self, delta: Vec3) -> Self {
        Self {
            min: self.min - delta,
            max: self.max + delta,
            epsilon: self.epsilon,
        }
    }

    /// Symmetric deflate: both corners move inward by `delta`, never past the centre.
    pub fn shrink(&self, delta: Vec3) -> Self {
        let center = self.center();
        Self {
            min: (self.min + delta).min(center),
            max: (self.max - delta).max(center),
            epsilon: self.epsilon,
        }
    }

    /// Copy of the box translated by `delta`.
    pub fn translated(&self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
            epsilon: self.epsilon,
        }
    }

    /// Translate in place.
    pub fn move_by(&mut self, delta: Vec3) {
        self.min += delta;
        self.max += delta;
    }

    /// Largest movement of `moving` along `axis`, up to `delta`, that does not
    /// push it into `self`.
    ///
    /// Only clips when the two boxes already overlap strictly on the other
    /// two axes; otherwise `delta` is returned untouched. The result never
    /// changes sign and never exceeds `delta` in magnitude.
    pub fn clip_collide(&self, axis: Axis, moving: &Aabb, delta: f32) -> f32 {
        let [a, b] = axis.others();
        let overlaps = |i: usize| moving.max[i] > self.min[i] && moving.min[i] < self.max[i];
        if !overlaps(a) || !overlaps(b) {
            return delta;
        }

        let i = axis.index();
        let mut delta = delta;
        if delta > 0.0 && moving.max[i] <= self.min[i] {
            let limit = (self.min[i] - moving.max[i] - self.epsilon).max(0.0);
            if limit < delta {
                delta = limit;
            }
        }
        if delta < 0.0 && moving.min[i] >= self.max[i] {
            let limit = (self.max[i] - moving.min[i] + self.epsilon).min(0.0);
            if limit > delta {
                delta = limit;
            }
        }
        delta
    }

    /// [`Aabb::clip_collide`] along X.
    pub fn clip_x_collide(&self, moving: &Aabb, delta: f32) -> f32 {
        self.clip_collide(Axis::X, moving, delta)
    }

    /// [`Aabb::clip_collide`] along Y.
    pub fn clip_y_collide(&self, moving: &Aabb, delta: f32) -> f32 {
        self.clip_collide(Axis::Y, moving, delta)
    }

    /// [`Aabb::clip_collide`] along Z.
    pub fn clip_z_collide(&self, moving: &Aabb, delta: f32) -> f32 {
        self.clip_collide(Axis::Z, moving, delta)
    }

    /// Strict overlap test: touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        other.max.cmpgt(self.min).all() && other.min.cmplt(self.max).all()
    }

    /// Inclusive overlap test: touching faces count as contact.
    pub fn intersects_inner(&self, other: &Aabb) -> bool {
        other.max.cmpge(self.min).all() && other.min.cmple(self.max).all()
    }

    /// Strict point containment.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpgt(self.min).all() && point.cmplt(self.max).all()
    }

    /// Intersect the segment `start..end` with the box surface.
    ///
    /// Each of the six face planes is crossed at most once along the segment;
    /// crossings outside the face rectangle are discarded and the one closest
    /// to `start` wins.
    pub fn clip(&self, start: Vec3, end: Vec3) -> Option<RayHit> {
        let candidates = [
            (Face::West, plane_crossing(start, end, 0, self.min.x)),
            (Face::East, plane_crossing(start, end, 0, self.max.x)),
            (Face::Down, plane_crossing(start, end, 1, self.min.y)),
            (Face::Up, plane_crossing(start, end, 1, self.max.y)),
            (Face::North, plane_crossing(start, end, 2, self.min.z)),
            (Face::South, plane_crossing(start, end, 2, self.max.z)),
        ];

        let mut best: Option<RayHit> = None;
        for (face, point) in candidates {
            let Some(point) = point else { continue };
            let axis = match face {
                Face::West | Face::East => Axis::X,
                Face::Down | Face::Up => Axis::Y,
                Face::North | Face::South => Axis::Z,
            };
            if !self.face_contains(axis, point) {
                continue;
            }
            let closer = best.map_or(true, |hit| {
                start.distance_squared(point) < start.distance_squared(hit.point)
            });
            if closer {
                best = Some(RayHit { point, face });
            }
        }
        best
    }

    /// Inclusive test that `point` lies within the face rectangle perpendicular to `axis`.
    fn face_contains(&self, axis: Axis, point: Vec3) -> bool {
        axis.others()
            .iter()
            .all(|&i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

/// Point where the segment crosses the plane `coord[axis] == value`, if it
/// does so within the segment.
fn plane_crossing(start: Vec3, end: Vec3, axis: usize, value: f32) -> Option<Vec3> {
    let d = end - start;
    if d[axis] * d[axis] < PARALLEL_EPSILON {
        return None;
    }
    let t = (value - start[axis]) / d[axis];
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(start + d * t)
}
