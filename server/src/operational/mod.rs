// massive_world_physics/server/src/operational/mod.rs
pub mod monitoring;
