// massive_world_physics/server/src/world/mod.rs
pub mod collision_cache;
pub mod game;
pub mod region;
pub mod spatial_index;
pub mod wall_index;

pub use collision_cache::CollisionPairCache;
pub use game::Game;
pub use region::{Region, RegionManager};
pub use spatial_index::{RegionSpatialIndex, SpatialIndexStats};
pub use wall_index::{LocomotorSweep, SweepResult, Wall, WallIndex};
