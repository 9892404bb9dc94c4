#![warn(missing_docs)]
//! Physics primitives: axis-aligned boxes, ray clipping and swept
//! movement resolution against static obstacles.

mod aabb;
mod movement;

pub use aabb::{Aabb, Axis, RayHit};
pub use movement::{resolve_movement, SweepOutcome};
