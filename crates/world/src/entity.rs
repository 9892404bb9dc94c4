//! Moving boxes that live in the [`SpatialEntityIndex`](crate::SpatialEntityIndex).

use blockworld_physics::{Aabb, SweepOutcome};
use glam::Vec3;
use std::fmt;

/// Stable handle into the entity arena.
///
/// The generation makes handles of removed entities dead even after their
/// slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// Arena slot of this handle.
    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Where the index last filed an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexSlot {
    /// Linear cell index.
    pub cell: usize,
    /// Position inside the cell's list.
    pub in_cell: usize,
    /// Position inside the index's global list.
    pub in_order: usize,
}

/// A box-shaped actor.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Feet centre.
    pub position: Vec3,
    /// Position at the start of the current tick.
    pub prev_position: Vec3,
    /// Movement requested per tick.
    pub velocity: Vec3,
    /// Half of the horizontal footprint.
    pub half_width: f32,
    /// Box height.
    pub height: f32,
    /// Collision box, kept in sync with `position`.
    pub bb: Aabb,
    /// Resting on something after the last move.
    pub on_ground: bool,
    /// Last move was blocked along X or Z.
    pub horizontal_collision: bool,
    /// Whether other entities collide with this one.
    pub solid: bool,
    removed: bool,
    pub(crate) slot: Option<IndexSlot>,
}

impl Entity {
    /// Entity standing at `position` with the given footprint.
    pub fn new(position: Vec3, half_width: f32, height: f32) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: Vec3::ZERO,
            half_width,
            height,
            bb: Self::box_at(position, half_width, height),
            on_ground: false,
            horizontal_collision: false,
            solid: true,
            removed: false,
            slot: None,
        }
    }

    fn box_at(position: Vec3, half_width: f32, height: f32) -> Aabb {
        Aabb::from_bounds(
            position.x - half_width,
            position.y,
            position.z - half_width,
            position.x + half_width,
            position.y + height,
            position.z + half_width,
        )
    }

    /// Teleport, rebuilding the box around the new position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.bb = Self::box_at(position, self.half_width, self.height);
    }

    /// Remember where the entity was before this tick's movement.
    pub fn begin_tick(&mut self) {
        self.prev_position = self.position;
    }

    /// Position blended between the previous and current tick.
    pub fn interpolated_position(&self, alpha: f32) -> Vec3 {
        self.prev_position.lerp(self.position, alpha)
    }

    /// Flag for removal at the end of the current tick.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Whether [`Entity::remove`] was called.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Adopt the result of a collision sweep.
    pub fn apply_sweep(&mut self, outcome: &SweepOutcome) {
        self.bb = outcome.aabb;
        let center = self.bb.center();
        self.position = Vec3::new(center.x, self.bb.min.y, center.z);
        self.on_ground = outcome.on_ground;
        self.horizontal_collision = outcome.horizontal_collision();
        if outcome.clipped.x {
            self.velocity.x = 0.0;
        }
        if outcome.clipped.y {
            self.velocity.y = 0.0;
        }
        if outcome.clipped.z {
            self.velocity.z = 0.0;
        }
    }
}
