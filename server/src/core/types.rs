// massive_world_physics/server/src/core/types.rs
use bitflags::bitflags;

pub use glam::Vec3;

pub type EntityId = u64;
pub type RegionId = u64;
/// Small per-region slot used by the pair cache; `INVALID_COLLISION_ID` opts out.
pub type CollisionId = i32;
pub type PhysicsFrameId = u32;

pub const INVALID_COLLISION_ID: CollisionId = -1;

// --- Basic Geometric Types ---
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self { Orientation { yaw, pitch, roll } }
    pub fn from_yaw(yaw: f32) -> Self { Orientation { yaw, pitch: 0.0, roll: 0.0 } }
}

/// Drops the vertical component.
#[inline]
pub fn flatten_2d(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// 2D unit vector of `v`, or `fallback` when `v` has no horizontal length.
#[inline]
pub fn safe_normalize_2d(v: Vec3, fallback: Vec3) -> Vec3 {
    flatten_2d(v).try_normalize().unwrap_or(fallback)
}

#[inline]
pub fn is_near_zero(v: Vec3, epsilon: f32) -> bool {
    v.length_squared() < epsilon * epsilon
}

#[inline]
pub fn epsilon_sphere_test(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    a.distance_squared(b) < epsilon * epsilon
}

bitflags! {
    /// Behaviour requested from a single physics move.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MoveEntityFlags: u8 {
        const SEND_TO_OWNER = 1 << 0;
        const SWEEP_COLLIDE = 1 << 2;
        const SLIDING = 1 << 3;
        const SEND_TO_CLIENTS = 1 << 4;
        /// Lets a force system carry an entity that is already flagged destroyed.
        const RESIDUAL_MOTION = 1 << 5;
    }
}

bitflags! {
    /// Propagation flags handed to the network layer with every position change.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ChangePositionFlags: u8 {
        const PHYSICS_RESOLVE = 1 << 0;
        const NO_SEND_TO_OWNER = 1 << 1;
        const NO_SEND_TO_CLIENTS = 1 << 2;
    }
}
