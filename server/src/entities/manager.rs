// massive_world_physics/server/src/entities/manager.rs
use super::world_entity::{WorldEntity, WorldEntityPrototype};
use crate::core::types::EntityId;
use crate::geometry::CollisionShape;
use ahash::AHashMap;
use std::sync::Arc;

/// Id-keyed entity storage. Relationships between entities are stored as ids and
/// resolved here on every use.
pub struct EntityManager {
    entities: AHashMap<EntityId, WorldEntity>,
    next_id: EntityId,
}

impl EntityManager {
    pub fn new() -> Self {
        EntityManager {
            entities: AHashMap::new(),
            next_id: 1,
        }
    }

    pub fn create_entity(&mut self, shape: CollisionShape, prototype: Arc<WorldEntityPrototype>) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.insert(id, WorldEntity::new(id, shape, prototype));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&WorldEntity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut WorldEntity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Flags the entity destroyed; it stays addressable until removed.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.destroyed = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<WorldEntity> {
        self.entities.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
