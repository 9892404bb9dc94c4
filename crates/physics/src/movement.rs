use crate::aabb::{Aabb, Axis};
use glam::{BVec3, Vec3};

/// Outcome of [`resolve_movement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOutcome {
    /// Box after applying the clipped movement.
    pub aabb: Aabb,
    /// Movement that was actually applied.
    pub applied: Vec3,
    /// Axes on which the requested movement was shortened.
    pub clipped: BVec3,
    /// The Y sweep was clipped while moving down.
    pub on_ground: bool,
}

impl SweepOutcome {
    /// True if X or Z movement was clipped.
    pub fn horizontal_collision(&self) -> bool {
        self.clipped.x || self.clipped.z
    }
}

/// Move `aabb` by `delta` through `obstacles` using the axis order Y, X, Z.
///
/// Each axis is clipped against every obstacle using the box already
/// displaced by the previous axes. Ground contact comes from the Y clip
/// alone, so resting on a surface is reported even when horizontal movement
/// is blocked.
pub fn resolve_movement(aabb: &Aabb, delta: Vec3, obstacles: &[Aabb]) -> SweepOutcome {
    let mut moved = *aabb;
    let mut applied = Vec3::ZERO;

    for (axis, unit) in [(Axis::Y, Vec3::Y), (Axis::X, Vec3::X), (Axis::Z, Vec3::Z)] {
        let requested = delta.dot(unit);
        let allowed = obstacles
            .iter()
            .fold(requested, |d, obstacle| obstacle.clip_collide(axis, &moved, d));
        moved.move_by(unit * allowed);
        applied += unit * allowed;
    }

    let clipped = delta.cmpne(applied);
    SweepOutcome {
        aabb: moved,
        applied,
        clipped,
        on_ground: clipped.y && delta.y < 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Vec<Aabb> {
        (-2..=2)
            .flat_map(|x| (-2..=2).map(move |z| Aabb::unit_cube(x, -1, z)))
            .collect()
    }

    fn player_at(y: f32) -> Aabb {
        Aabb::from_bounds(-0.3, y, -0.3, 0.3, y + 1.8, 0.3)
    }

    #[test]
    fn falling_box_lands_on_floor() {
        let out = resolve_movement(&player_at(0.5), Vec3::new(0.0, -2.0, 0.0), &floor());
        assert!(out.on_ground);
        assert_eq!(out.aabb.min.y, 0.0);
        assert_eq!(out.applied.y, -0.5);
        assert!(!out.horizontal_collision());
    }

    #[test]
    fn resting_box_stays_put() {
        let rest = player_at(0.0);
        let first = resolve_movement(&rest, Vec3::new(0.0, -0.08, 0.0), &floor());
        let second = resolve_movement(&first.aabb, Vec3::new(0.0, -0.08, 0.0), &floor());
        assert_eq!(first.applied, Vec3::ZERO);
        assert_eq!(second.applied, Vec3::ZERO);
        assert!(second.on_ground);
    }

    #[test]
    fn wall_blocks_horizontal_but_not_vertical() {
        let mut obstacles = floor();
        obstacles.push(Aabb::unit_cube(1, 0, 0));
        let out = resolve_movement(&player_at(0.0), Vec3::new(1.0, -0.1, 0.0), &obstacles);
        assert!(out.on_ground);
        assert!(out.horizontal_collision());
        assert!((out.aabb.max.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rising_box_is_not_on_ground() {
        let mut obstacles = floor();
        obstacles.push(Aabb::unit_cube(0, 2, 0));
        let out = resolve_movement(&player_at(0.0), Vec3::new(0.0, 1.0, 0.0), &obstacles);
        assert!(out.clipped.y);
        assert!(!out.on_ground);
        assert!((out.aabb.max.y - 2.0).abs() < 1e-6);
    }
}
