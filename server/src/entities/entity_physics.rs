// massive_world_physics/server/src/entities/entity_physics.rs
use crate::core::types::{CollisionId, EntityId, PhysicsFrameId, Vec3, INVALID_COLLISION_ID};
use ahash::AHashMap;
use smallvec::SmallVec;

/// Overlap relationship with one partner, stamped with the frame that last confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapEntry {
    pub overlapped: bool,
    pub frame: PhysicsFrameId,
}

/// Physics state owned by a world entity and mutated only by the physics manager.
///
/// Force accumulators are double buffered: writers use the manager's current
/// write index, the resolve pass reads (and then clears) the read index.
#[derive(Debug, Clone)]
pub struct EntityPhysics {
    pub collision_id: CollisionId,
    pub registered_physics_frame_id: PhysicsFrameId,
    pub overlapped_entities: AHashMap<EntityId, OverlapEntry>,
    attached_entities: SmallVec<[EntityId; 4]>,
    external_forces: [Vec3; 2],
    repulsion_forces: [Vec3; 2],
    track_overlap: bool,
}

impl Default for EntityPhysics {
    fn default() -> Self {
        EntityPhysics {
            collision_id: INVALID_COLLISION_ID,
            registered_physics_frame_id: 0,
            overlapped_entities: AHashMap::new(),
            attached_entities: SmallVec::new(),
            external_forces: [Vec3::ZERO; 2],
            repulsion_forces: [Vec3::ZERO; 2],
            track_overlap: false,
        }
    }
}

impl EntityPhysics {
    pub fn new(track_overlap: bool) -> Self {
        EntityPhysics { track_overlap, ..Default::default() }
    }

    pub fn is_tracking_overlap(&self) -> bool {
        self.track_overlap
    }

    // --- Forces ---

    pub fn add_external_force(&mut self, write_index: usize, force: Vec3) {
        self.external_forces[write_index] += force;
    }

    pub fn add_repulsion_force(&mut self, write_index: usize, force: Vec3) {
        self.repulsion_forces[write_index] += force;
    }

    pub fn external_forces(&self, read_index: usize) -> Vec3 {
        self.external_forces[read_index]
    }

    pub fn repulsion_forces(&self, read_index: usize) -> Vec3 {
        self.repulsion_forces[read_index]
    }

    pub fn has_external_forces(&self, read_index: usize) -> bool {
        self.external_forces[read_index] != Vec3::ZERO
    }

    /// Clears the slot that was just consumed.
    pub fn on_physics_update_finished(&mut self, read_index: usize) {
        self.external_forces[read_index] = Vec3::ZERO;
        self.repulsion_forces[read_index] = Vec3::ZERO;
    }

    // --- Attachments ---

    pub fn attached_entities(&self) -> &[EntityId] {
        &self.attached_entities
    }

    pub fn has_attached_entities(&self) -> bool {
        !self.attached_entities.is_empty()
    }

    /// Returns false if `child` was already attached.
    pub fn attach_entity(&mut self, child: EntityId) -> bool {
        if self.attached_entities.contains(&child) {
            return false;
        }
        self.attached_entities.push(child);
        true
    }

    pub fn detach_entity(&mut self, child: EntityId) -> bool {
        match self.attached_entities.iter().position(|id| *id == child) {
            Some(index) => {
                self.attached_entities.remove(index);
                true
            }
            None => false,
        }
    }

    // --- Overlaps ---

    pub fn overlap_entry(&self, other: EntityId) -> Option<&OverlapEntry> {
        self.overlapped_entities.get(&other)
    }

    pub fn is_overlapping(&self, other: EntityId) -> bool {
        self.overlapped_entities.get(&other).map_or(false, |entry| entry.overlapped)
    }

    /// Inserts a not-yet-overlapped entry or refreshes the frame stamp of an existing one.
    pub fn update_overlap_entry(&mut self, other: EntityId, frame: PhysicsFrameId) {
        self.overlapped_entities
            .entry(other)
            .and_modify(|entry| entry.frame = frame)
            .or_insert(OverlapEntry { overlapped: false, frame });
    }
}
