// massive_world_physics/server/src/lib.rs

pub mod core;
pub mod entities;
pub mod geometry;
pub mod operational;
pub mod systems;
pub mod world;

pub use crate::core::config::PhysicsConfig;
pub use crate::core::error::{PhysicsError, PhysicsResult};
pub use crate::core::types::{EntityId, MoveEntityFlags, Orientation, Vec3};
pub use crate::systems::physics::{PhysicsManager, PhysicsReactor, ResolveOutcome};
pub use crate::world::Game;
