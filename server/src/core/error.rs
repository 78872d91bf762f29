// massive_world_physics/server/src/core/error.rs
use crate::core::types::{EntityId, RegionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid force: {0}")]
    InvalidForce(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
