// massive_world_physics/server/src/core/config.rs
use super::constants;
use super::error::{PhysicsError, PhysicsResult};
use serde::Deserialize;
use std::path::Path;

/// Tunables for the physics resolve pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Timestep integrated per tick by force systems.
    pub fixed_time_between_updates_secs: f32,
    /// Displacements and repulsion pushes shorter than this count as zero.
    pub near_zero_epsilon: f32,
    pub wall_slide_nudge: f32,
    pub movement_epsilon: f32,
    pub force_collision_threshold_sq: f32,
    pub force_time_epsilon: f32,
    pub spatial_cell_size: f32,
    pub slow_tick_log_ms: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            fixed_time_between_updates_secs: constants::FIXED_TIME_BETWEEN_UPDATES_SECS,
            near_zero_epsilon: constants::NEAR_ZERO_EPSILON,
            wall_slide_nudge: constants::WALL_SLIDE_NUDGE,
            movement_epsilon: constants::MOVEMENT_EPSILON,
            force_collision_threshold_sq: constants::FORCE_COLLISION_THRESHOLD_SQ,
            force_time_epsilon: constants::FORCE_TIME_EPSILON,
            spatial_cell_size: constants::SPATIAL_INDEX_CELL_SIZE,
            slow_tick_log_ms: constants::SLOW_TICK_LOG_MS,
        }
    }
}

impl PhysicsConfig {
    pub fn from_yaml_str(text: &str) -> PhysicsResult<Self> {
        let config: PhysicsConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        let positive = [
            ("fixed_time_between_updates_secs", self.fixed_time_between_updates_secs),
            ("near_zero_epsilon", self.near_zero_epsilon),
            ("movement_epsilon", self.movement_epsilon),
            ("force_time_epsilon", self.force_time_epsilon),
            ("spatial_cell_size", self.spatial_cell_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PhysicsError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        let non_negative = [
            ("wall_slide_nudge", self.wall_slide_nudge),
            ("force_collision_threshold_sq", self.force_collision_threshold_sq),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::Config(format!("{} must not be negative, got {}", name, value)));
            }
        }
        Ok(())
    }
}
