// massive_world_physics/server/src/systems/physics/reactor.rs
use crate::core::types::{ChangePositionFlags, EntityId, Orientation, Vec3};

/// Outbound notifications raised synchronously during a resolve pass.
///
/// A reactor never gets access to the physics manager, so it cannot re-enter
/// it. Follow-up work (new registrations, force systems) has to be queued by
/// the implementor and submitted after `resolve_entities` returns, which
/// lands it in the next tick.
pub trait PhysicsReactor {
    /// `other` is `None` for environment (wall or bound) collisions.
    fn on_entity_collision(&mut self, who: EntityId, other: Option<EntityId>, position: Vec3);

    fn on_overlap_begin(&mut self, who: EntityId, whom: EntityId, who_position: Vec3, whom_position: Vec3);

    fn on_overlap_end(&mut self, who: EntityId, whom: EntityId);

    fn on_position_changed(
        &mut self,
        _entity_id: EntityId,
        _position: Vec3,
        _orientation: Orientation,
        _flags: ChangePositionFlags,
    ) {
    }

    /// An entity moved by a force system should refresh its navigation footprint.
    fn on_navigation_influence_changed(&mut self, _entity_id: EntityId) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsNotification {
    EntityCollision {
        who: EntityId,
        other: Option<EntityId>,
        position: Vec3,
    },
    OverlapBegin {
        who: EntityId,
        whom: EntityId,
        who_position: Vec3,
        whom_position: Vec3,
    },
    OverlapEnd {
        who: EntityId,
        whom: EntityId,
    },
    PositionChanged {
        entity_id: EntityId,
        position: Vec3,
        flags: ChangePositionFlags,
    },
    NavigationInfluenceChanged {
        entity_id: EntityId,
    },
}

/// Reactor that records every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    pub notifications: Vec<PhysicsNotification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    /// Collision partners reported for `who`, in order. `None` marks an environment hit.
    pub fn collisions_for(&self, who: EntityId) -> Vec<Option<EntityId>> {
        self.notifications
            .iter()
            .filter_map(|n| match *n {
                PhysicsNotification::EntityCollision { who: w, other, .. } if w == who => Some(other),
                _ => None,
            })
            .collect()
    }

    pub fn overlap_begins(&self) -> Vec<(EntityId, EntityId)> {
        self.notifications
            .iter()
            .filter_map(|n| match *n {
                PhysicsNotification::OverlapBegin { who, whom, .. } => Some((who, whom)),
                _ => None,
            })
            .collect()
    }

    pub fn overlap_ends(&self) -> Vec<(EntityId, EntityId)> {
        self.notifications
            .iter()
            .filter_map(|n| match *n {
                PhysicsNotification::OverlapEnd { who, whom } => Some((who, whom)),
                _ => None,
            })
            .collect()
    }

    pub fn position_changes(&self, entity_id: EntityId) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n, PhysicsNotification::PositionChanged { entity_id: id, .. } if *id == entity_id))
            .count()
    }

    pub fn last_position_flags(&self, entity_id: EntityId) -> Option<ChangePositionFlags> {
        self.notifications.iter().rev().find_map(|n| match *n {
            PhysicsNotification::PositionChanged { entity_id: id, flags, .. } if id == entity_id => Some(flags),
            _ => None,
        })
    }
}

impl PhysicsReactor for NotificationLog {
    fn on_entity_collision(&mut self, who: EntityId, other: Option<EntityId>, position: Vec3) {
        self.notifications.push(PhysicsNotification::EntityCollision { who, other, position });
    }

    fn on_overlap_begin(&mut self, who: EntityId, whom: EntityId, who_position: Vec3, whom_position: Vec3) {
        self.notifications.push(PhysicsNotification::OverlapBegin { who, whom, who_position, whom_position });
    }

    fn on_overlap_end(&mut self, who: EntityId, whom: EntityId) {
        self.notifications.push(PhysicsNotification::OverlapEnd { who, whom });
    }

    fn on_position_changed(
        &mut self,
        entity_id: EntityId,
        position: Vec3,
        _orientation: Orientation,
        flags: ChangePositionFlags,
    ) {
        self.notifications.push(PhysicsNotification::PositionChanged { entity_id, position, flags });
    }

    fn on_navigation_influence_changed(&mut self, entity_id: EntityId) {
        self.notifications.push(PhysicsNotification::NavigationInfluenceChanged { entity_id });
    }
}
