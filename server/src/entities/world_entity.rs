// massive_world_physics/server/src/entities/world_entity.rs
use super::entity_physics::EntityPhysics;
use crate::core::types::{EntityId, Orientation, RegionId, Vec3};
use crate::geometry::{Bounds, CollisionShape};
use std::sync::Arc;

/// Collision bit masks. An empty `layer` keeps the entity out of the pair cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionProfile {
    pub layer: u32,
    pub collides_with: u32,
    pub blocked_by: u32,
}

impl CollisionProfile {
    pub fn new(layer: u32, collides_with: u32, blocked_by: u32) -> Self {
        CollisionProfile { layer, collides_with, blocked_by }
    }

    pub fn is_collidable(&self) -> bool {
        self.layer != 0
    }
}

/// Static configuration shared by entities of the same kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldEntityPrototype {
    pub collision: CollisionProfile,
    pub update_orientation_with_parent: bool,
    pub track_overlap: bool,
}

/// Locomotion capability. Entities without one are immovable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Locomotion {
    pub is_missile: bool,
    pub movement_impeded: bool,
}

#[derive(Debug, Clone)]
pub struct WorldEntity {
    pub id: EntityId,
    pub prototype: Arc<WorldEntityPrototype>,
    pub position: Vec3,
    pub orientation: Orientation,
    pub shape: CollisionShape,
    pub locomotion: Option<Locomotion>,
    pub movement_authoritative: bool,
    pub physics: EntityPhysics,
    pub(crate) region: Option<RegionId>,
    pub(crate) destroyed: bool,
}

impl WorldEntity {
    pub fn new(id: EntityId, shape: CollisionShape, prototype: Arc<WorldEntityPrototype>) -> Self {
        let physics = EntityPhysics::new(prototype.track_overlap);
        WorldEntity {
            id,
            prototype,
            position: Vec3::ZERO,
            orientation: Orientation::default(),
            shape,
            locomotion: None,
            movement_authoritative: false,
            physics,
            region: None,
            destroyed: false,
        }
    }

    pub fn is_in_world(&self) -> bool {
        self.region.is_some()
    }

    pub fn region_id(&self) -> Option<RegionId> {
        self.region
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn collide_bounds(&self) -> Bounds {
        Bounds::new(self.shape, self.position)
    }

    pub fn collide_radius(&self) -> f32 {
        self.shape.radius()
    }

    pub fn can_collide_with(&self, other: &WorldEntity) -> bool {
        self.prototype.collision.collides_with & other.prototype.collision.layer != 0
    }

    pub fn can_be_blocked_by(&self, other: &WorldEntity) -> bool {
        self.prototype.collision.blocked_by & other.prototype.collision.layer != 0
    }
}
