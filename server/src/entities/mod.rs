pub mod entity_physics;
pub mod manager;
pub mod world_entity;

pub use entity_physics::{EntityPhysics, OverlapEntry};
pub use manager::EntityManager;
pub use world_entity::{CollisionProfile, Locomotion, WorldEntity, WorldEntityPrototype};
