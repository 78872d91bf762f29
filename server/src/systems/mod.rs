// massive_world_physics/server/src/systems/mod.rs
pub mod physics;
