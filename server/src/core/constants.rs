// massive_world_physics/server/src/core/constants.rs

pub const SERVER_TICK_RATE: u64 = 30;
pub const FIXED_TIME_BETWEEN_UPDATES_SECS: f32 = 1.0 / SERVER_TICK_RATE as f32;

// Tolerances
pub const NEAR_ZERO_EPSILON: f32 = 1e-3;
pub const MOVEMENT_EPSILON: f32 = 1e-3;
pub const FORCE_COLLISION_THRESHOLD_SQ: f32 = 0.01;
pub const FORCE_TIME_EPSILON: f32 = 1e-4;

// Pushed off a wall when a clipped sweep made no progress.
pub const WALL_SLIDE_NUDGE: f32 = 0.1;

// Spatial Index constants
pub const SPATIAL_INDEX_CELL_SIZE: f32 = 16.0;

// Performance
pub const SLOW_TICK_LOG_MS: u64 = 4;
