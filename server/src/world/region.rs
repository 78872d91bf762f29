// massive_world_physics/server/src/world/region.rs
use super::collision_cache::CollisionPairCache;
use super::spatial_index::RegionSpatialIndex;
use super::wall_index::{LocomotorSweep, Wall, WallIndex};
use crate::core::types::{CollisionId, EntityId, RegionId, Vec3, INVALID_COLLISION_ID};
use crate::geometry::Aabb;
use ahash::AHashMap;
use tracing::debug;

/// A bounded piece of the world: entity spatial index, static walls and the
/// per-tick collision pair cache.
pub struct Region {
    pub id: RegionId,
    bound: Aabb,
    spatial_index: RegionSpatialIndex,
    walls: WallIndex,
    collided_entities: CollisionPairCache,
    next_collision_id: CollisionId,
    free_collision_ids: Vec<CollisionId>,
}

impl Region {
    pub fn new(id: RegionId, bound: Aabb, cell_size: f32) -> Self {
        Region {
            id,
            bound,
            spatial_index: RegionSpatialIndex::new(&bound, cell_size),
            walls: WallIndex::new(),
            collided_entities: CollisionPairCache::new(),
            next_collision_id: 0,
            free_collision_ids: Vec::new(),
        }
    }

    pub fn bound(&self) -> &Aabb {
        &self.bound
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.insert(wall);
    }

    pub fn set_walls(&mut self, walls: &[Wall]) {
        self.walls.rebuild(walls);
    }

    pub fn spatial_index(&self) -> &RegionSpatialIndex {
        &self.spatial_index
    }

    /// Files the entity and hands out a collision slot if it is collidable.
    pub(crate) fn add_entity(&mut self, entity_id: EntityId, aabb: Aabb, collidable: bool) -> CollisionId {
        self.spatial_index.update_entity(entity_id, aabb);
        if !collidable {
            return INVALID_COLLISION_ID;
        }
        match self.free_collision_ids.pop() {
            Some(id) => id,
            None => {
                let id = self.next_collision_id;
                self.next_collision_id += 1;
                id
            }
        }
    }

    pub(crate) fn update_entity(&mut self, entity_id: EntityId, aabb: Aabb) {
        self.spatial_index.update_entity(entity_id, aabb);
    }

    pub(crate) fn remove_entity(&mut self, entity_id: EntityId, collision_id: CollisionId) {
        self.spatial_index.remove_entity(entity_id);
        if collision_id != INVALID_COLLISION_ID {
            self.free_collision_ids.push(collision_id);
        }
    }

    /// Ids of entities whose collide box intersects `volume`, ascending.
    pub fn entities_in_volume(&self, volume: &Aabb) -> Vec<EntityId> {
        self.spatial_index.query_volume(volume)
    }

    /// Pair cache gate; true the first time the unordered pair is seen this tick.
    pub fn collide_entities(&mut self, collision_id: CollisionId, other_collision_id: CollisionId) -> bool {
        self.collided_entities.collide_entities(collision_id, other_collision_id)
    }

    pub fn collided_entities(&self) -> &CollisionPairCache {
        &self.collided_entities
    }

    pub fn clear_collided_entities(&mut self) {
        self.collided_entities.clear();
    }

    /// Locomotion sweep for a circle of `radius` between two points.
    pub fn sweep_from_to(&self, from: Vec3, to: Vec3, radius: f32) -> LocomotorSweep {
        self.walls.sweep(&self.bound, from, to, radius)
    }
}

pub struct RegionManager {
    regions: AHashMap<RegionId, Region>,
    next_id: RegionId,
    cell_size: f32,
}

impl RegionManager {
    pub fn new(cell_size: f32) -> Self {
        RegionManager {
            regions: AHashMap::new(),
            next_id: 1,
            cell_size,
        }
    }

    pub fn create_region(&mut self, bound: Aabb) -> RegionId {
        let id = self.next_id;
        self.next_id += 1;
        self.regions.insert(id, Region::new(id, bound, self.cell_size));
        debug!("Region {} created with bound {:?}", id, bound);
        id
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear_collided_entities(&mut self) {
        for region in self.regions.values_mut() {
            region.clear_collided_entities();
        }
    }
}
