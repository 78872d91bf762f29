// massive_world_physics/server/src/systems/physics/mod.rs
//! Per-tick physics resolve: swept entity movement, sliding, attached-entity
//! propagation, overlap tracking, force systems and pairwise collision handling.

pub mod collision;
pub mod force_system;
pub mod manager;
pub mod movement;
pub mod overlap;
pub mod reactor;

pub use collision::EntityCollision;
pub use force_system::{ForceReadWriteIndex, ForceSystem, ForceSystemMember};
pub use manager::{PhysicsManager, ResolveOutcome, ResolveStats, SkipReason};
pub use overlap::{OverlapEvent, OverlapEventKind};
pub use reactor::{NotificationLog, PhysicsNotification, PhysicsReactor};
