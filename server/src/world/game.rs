// massive_world_physics/server/src/world/game.rs
use super::region::{Region, RegionManager};
use crate::core::config::PhysicsConfig;
use crate::core::error::{PhysicsError, PhysicsResult};
use crate::core::types::{ChangePositionFlags, EntityId, Orientation, RegionId, Vec3, INVALID_COLLISION_ID};
use crate::entities::{EntityManager, WorldEntity};
use crate::geometry::Aabb;
use crate::systems::physics::PhysicsReactor;
use tracing::{debug, warn};

/// World context the physics manager runs against: entity storage plus regions.
pub struct Game {
    pub entities: EntityManager,
    pub regions: RegionManager,
}

impl Game {
    pub fn new(config: &PhysicsConfig) -> Self {
        Game {
            entities: EntityManager::new(),
            regions: RegionManager::new(config.spatial_cell_size),
        }
    }

    /// A game without regions has no world to resolve against.
    pub fn has_world(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn create_region(&mut self, bound: Aabb) -> RegionId {
        self.regions.create_region(bound)
    }

    pub fn region_of(&self, entity_id: EntityId) -> Option<&Region> {
        let region_id = self.entities.get(entity_id)?.region_id()?;
        self.regions.get(region_id)
    }

    pub fn region_of_mut(&mut self, entity_id: EntityId) -> Option<&mut Region> {
        let region_id = self.entities.get(entity_id)?.region_id()?;
        self.regions.get_mut(region_id)
    }

    /// The entity, if it exists and is in world.
    pub fn in_world_entity(&self, entity_id: EntityId) -> Option<&WorldEntity> {
        self.entities.get(entity_id).filter(|entity| entity.is_in_world())
    }

    pub fn enter_world(
        &mut self,
        entity_id: EntityId,
        region_id: RegionId,
        position: Vec3,
        orientation: Orientation,
    ) -> PhysicsResult<()> {
        if !self.entities.contains(entity_id) {
            return Err(PhysicsError::EntityNotFound(entity_id));
        }
        if self.regions.get(region_id).is_none() {
            return Err(PhysicsError::RegionNotFound(region_id));
        }
        if self.entities.get(entity_id).map_or(false, |e| e.is_in_world()) {
            self.exit_world(entity_id);
        }

        let entity = self.entities.get_mut(entity_id).ok_or(PhysicsError::EntityNotFound(entity_id))?;
        let region = self.regions.get_mut(region_id).ok_or(PhysicsError::RegionNotFound(region_id))?;

        entity.position = position;
        entity.orientation = orientation;
        entity.region = Some(region_id);
        let collidable = entity.prototype.collision.is_collidable();
        entity.physics.collision_id = region.add_entity(entity_id, entity.collide_bounds().to_aabb(), collidable);

        debug!(
            "Entity {} entered region {} at {:?} (collision id {})",
            entity_id, region_id, position, entity.physics.collision_id
        );
        Ok(())
    }

    /// Takes the entity out of its region. Returns false if it was not in world.
    pub fn exit_world(&mut self, entity_id: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(entity_id) else {
            return false;
        };
        let Some(region_id) = entity.region.take() else {
            return false;
        };

        let collision_id = entity.physics.collision_id;
        entity.physics.collision_id = INVALID_COLLISION_ID;
        entity.physics.overlapped_entities.clear();

        match self.regions.get_mut(region_id) {
            Some(region) => region.remove_entity(entity_id, collision_id),
            None => warn!("Entity {} left region {} which no longer exists", entity_id, region_id),
        }
        debug!("Entity {} exited region {}", entity_id, region_id);
        true
    }

    pub fn remove_entity(&mut self, entity_id: EntityId) -> Option<WorldEntity> {
        self.exit_world(entity_id);
        self.entities.remove(entity_id)
    }

    pub fn destroy_entity(&mut self, entity_id: EntityId) -> bool {
        self.entities.destroy_entity(entity_id)
    }

    /// Rigs `child` to follow `parent`. Returns false if it was already attached.
    pub fn attach_entity(&mut self, parent: EntityId, child: EntityId) -> PhysicsResult<bool> {
        if parent == child {
            return Err(PhysicsError::InvalidState(format!("entity {} cannot be attached to itself", parent)));
        }
        if !self.entities.contains(child) {
            return Err(PhysicsError::EntityNotFound(child));
        }
        let parent_entity = self.entities.get_mut(parent).ok_or(PhysicsError::EntityNotFound(parent))?;
        Ok(parent_entity.physics.attach_entity(child))
    }

    pub fn detach_entity(&mut self, parent: EntityId, child: EntityId) -> bool {
        self.entities
            .get_mut(parent)
            .map_or(false, |entity| entity.physics.detach_entity(child))
    }

    /// Moves an in-world entity, refreshes its spatial index entry and forwards
    /// the change to the reactor.
    pub fn change_region_position(
        &mut self,
        entity_id: EntityId,
        position: Vec3,
        orientation: Option<Orientation>,
        flags: ChangePositionFlags,
        reactor: &mut dyn PhysicsReactor,
    ) -> bool {
        let Some(entity) = self.entities.get_mut(entity_id) else {
            return false;
        };
        let Some(region_id) = entity.region else {
            return false;
        };

        entity.position = position;
        if let Some(orientation) = orientation {
            entity.orientation = orientation;
        }
        let aabb = entity.collide_bounds().to_aabb();
        let orientation = entity.orientation;

        if let Some(region) = self.regions.get_mut(region_id) {
            region.update_entity(entity_id, aabb);
        }
        reactor.on_position_changed(entity_id, position, orientation, flags);
        true
    }

    /// Ids of entities in `region_id` whose collide box intersects `volume`, ascending.
    pub fn entities_in_volume(&self, region_id: RegionId, volume: &Aabb) -> Vec<EntityId> {
        self.regions
            .get(region_id)
            .map(|region| region.entities_in_volume(volume))
            .unwrap_or_default()
    }
}
