// massive_world_physics/server/src/world/collision_cache.rs
use crate::core::types::{CollisionId, INVALID_COLLISION_ID};
use ahash::AHashSet;

/// Unordered collision-slot pairs already processed this tick.
#[derive(Debug, Default)]
pub struct CollisionPairCache {
    pairs: AHashSet<(CollisionId, CollisionId)>,
}

impl CollisionPairCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pair and returns true the first time it is seen this tick.
    /// Pairs containing an invalid slot are never recorded.
    pub fn collide_entities(&mut self, a: CollisionId, b: CollisionId) -> bool {
        if a == INVALID_COLLISION_ID || b == INVALID_COLLISION_ID {
            return false;
        }
        self.pairs.insert((a.min(b), a.max(b)))
    }

    pub fn contains(&self, a: CollisionId, b: CollisionId) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}
