//! Shape primitives consumed by the resolver: boxes, collide bounds and swept time-of-impact.

pub mod aabb;
pub mod bounds;

pub use aabb::Aabb;
pub use bounds::{Bounds, CollisionShape, SweepHit};
