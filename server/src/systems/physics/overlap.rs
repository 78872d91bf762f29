// massive_world_physics/server/src/systems/physics/overlap.rs
use super::manager::PhysicsManager;
use super::reactor::PhysicsReactor;
use crate::core::types::{EntityId, Vec3};
use crate::world::Game;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEventKind {
    /// Re-evaluate the overlap predicate for a refreshed entry.
    Update,
    /// Drop the entry, ending the overlap if it was active.
    Remove,
}

/// Queued overlap transition, applied from both sides once the scan is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapEvent {
    pub kind: OverlapEventKind,
    pub who: EntityId,
    pub whom: EntityId,
    pub who_position: Vec3,
    pub whom_position: Vec3,
}

impl OverlapEvent {
    pub fn new(kind: OverlapEventKind, who: EntityId, whom: EntityId, who_position: Vec3, whom_position: Vec3) -> Self {
        OverlapEvent { kind, who, whom, who_position, whom_position }
    }

    /// The same event seen from the other participant.
    pub fn reversed(&self) -> Self {
        OverlapEvent {
            kind: self.kind,
            who: self.whom,
            whom: self.who,
            who_position: self.whom_position,
            whom_position: self.who_position,
        }
    }
}

impl PhysicsManager {
    /// Stages removals for stale overlap entries of every touched entity, then
    /// drains the queue, resolving each event from both sides.
    pub(super) fn resolve_entities_overlap_state(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        touched: &[EntityId],
    ) -> usize {
        for &entity_id in touched {
            self.stage_stale_overlaps(game, entity_id);
        }

        let mut processed = 0;
        while let Some(event) = self.overlap_events.pop_front() {
            self.resolve_overlap_event(game, reactor, &event);
            self.resolve_overlap_event(game, reactor, &event.reversed());
            processed += 1;
        }
        processed
    }

    /// Entries not refreshed this frame are queued for removal. Entries whose
    /// partner is gone or out of world are dropped on the spot, silently.
    fn stage_stale_overlaps(&mut self, game: &mut Game, entity_id: EntityId) {
        let frame = self.physics_frames;
        let Some(entity) = game.in_world_entity(entity_id) else {
            return;
        };
        let position = entity.position;

        let mut stale: Vec<EntityId> = entity
            .physics
            .overlapped_entities
            .iter()
            .filter(|(_, entry)| entry.frame != frame)
            .map(|(other_id, _)| *other_id)
            .collect();
        stale.sort_unstable();

        let mut orphaned = Vec::new();
        for other_id in stale {
            match game.in_world_entity(other_id) {
                Some(other) => self.overlap_events.push_back(OverlapEvent::new(
                    OverlapEventKind::Remove,
                    entity_id,
                    other_id,
                    position,
                    other.position,
                )),
                None => orphaned.push(other_id),
            }
        }

        if orphaned.is_empty() {
            return;
        }
        if let Some(entity) = game.entities.get_mut(entity_id) {
            for other_id in orphaned {
                if let Some(entry) = entity.physics.overlapped_entities.remove(&other_id) {
                    debug!(
                        "Dropped overlap entry of entity {} for entity {} outside the world without overlap end (overlapped: {})",
                        entity_id, other_id, entry.overlapped
                    );
                }
            }
        }
    }

    pub(super) fn resolve_overlap_event(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        event: &OverlapEvent,
    ) {
        let (who, whom) = (event.who, event.whom);
        let (Some(who_entity), Some(whom_entity)) = (game.in_world_entity(who), game.in_world_entity(whom)) else {
            return;
        };
        let overlapping = who_entity.can_collide_with(whom_entity) || whom_entity.can_collide_with(who_entity);
        let Some(who_entity) = game.entities.get_mut(who) else {
            return;
        };
        let overlaps = &mut who_entity.physics.overlapped_entities;

        match event.kind {
            OverlapEventKind::Update => {
                let Some(entry) = overlaps.get_mut(&whom) else {
                    return;
                };
                if entry.overlapped == overlapping {
                    return;
                }
                entry.overlapped = overlapping;
                if overlapping {
                    trace!("Overlap begin: {} -> {}", who, whom);
                    reactor.on_overlap_begin(who, whom, event.who_position, event.whom_position);
                } else {
                    trace!("Overlap end: {} -> {}", who, whom);
                    reactor.on_overlap_end(who, whom);
                }
            }
            OverlapEventKind::Remove => {
                if let Some(entry) = overlaps.remove(&whom) {
                    if entry.overlapped {
                        trace!("Overlap removed: {} -> {}", who, whom);
                        reactor.on_overlap_end(who, whom);
                    }
                }
            }
        }
    }
}
