// massive_world_physics/server/src/systems/physics/collision.rs
use super::manager::PhysicsManager;
use super::overlap::{OverlapEvent, OverlapEventKind};
use super::reactor::PhysicsReactor;
use crate::core::types::{flatten_2d, safe_normalize_2d, EntityId, Vec3};
use crate::world::Game;
use tracing::trace;

/// Candidate contact found by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityCollision {
    pub other_id: EntityId,
    /// Fraction of the attempted displacement travelled before contact, in `[0, 1]`.
    pub time: f32,
    pub position: Vec3,
    /// Points from the other entity toward the mover.
    pub normal: Vec3,
}

impl EntityCollision {
    pub fn existing(other_id: EntityId, position: Vec3) -> Self {
        EntityCollision { other_id, time: 0.0, position, normal: Vec3::Z }
    }
}

/// Stable sort by time of impact. Ties keep discovery order, which is ascending entity id.
pub fn sort_by_time_of_impact(collisions: &mut [EntityCollision]) {
    collisions.sort_by(|a, b| a.time.total_cmp(&b.time));
}

impl PhysicsManager {
    pub(super) fn handle_entity_collisions(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        entity_id: EntityId,
        collisions: &[EntityCollision],
        apply_repulsion_forces: bool,
    ) {
        for collision in collisions {
            self.handle_possible_entity_collision(game, reactor, entity_id, collision, apply_repulsion_forces, false);
        }
    }

    /// Runs pairwise handling against everything the entity currently touches.
    pub(super) fn check_for_existing_collisions(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        entity_id: EntityId,
        apply_repulsion_forces: bool,
    ) {
        let Some(entity) = game.in_world_entity(entity_id) else {
            return;
        };
        let Some(region) = game.region_of(entity_id) else {
            return;
        };
        let position = entity.position;
        let others: Vec<EntityId> = region
            .entities_in_volume(&entity.collide_bounds().to_aabb())
            .into_iter()
            .filter(|other| *other != entity_id)
            .collect();

        for other_id in others {
            let collision = EntityCollision::existing(other_id, position);
            self.handle_possible_entity_collision(game, reactor, entity_id, &collision, apply_repulsion_forces, true);
        }
    }

    pub(super) fn handle_possible_entity_collision(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        entity_id: EntityId,
        collision: &EntityCollision,
        apply_repulsion_forces: bool,
        bounds_check: bool,
    ) {
        let other_id = collision.other_id;
        let (Some(entity), Some(other)) = (game.entities.get(entity_id), game.entities.get(other_id)) else {
            return;
        };

        let blocked = entity.can_be_blocked_by(other);
        let colliding = entity.can_collide_with(other) || other.can_collide_with(entity);
        let other_perceives = other.can_collide_with(entity);
        let tracks_overlap = entity.physics.is_tracking_overlap() || other.physics.is_tracking_overlap();
        let intersecting = entity.collide_bounds().intersects(&other.collide_bounds());
        let other_position = other.position;

        if !self.cache_collision_pair(game, entity_id, other_id) {
            return;
        }

        if blocked {
            if bounds_check && !intersecting {
                return;
            }
            if apply_repulsion_forces {
                self.apply_repulsion_forces(game, entity_id, other_id);
            }
            trace!("Entity {} blocked by entity {} at {:?}", entity_id, other_id, collision.position);
            reactor.on_entity_collision(entity_id, Some(other_id), collision.position);
            if other_perceives {
                reactor.on_entity_collision(other_id, Some(entity_id), other_position);
            }
        } else if colliding {
            if bounds_check && !intersecting {
                return;
            }
            if !tracks_overlap {
                return;
            }
            let frame = self.physics_frames;
            if let Some(entity) = game.entities.get_mut(entity_id) {
                entity.physics.update_overlap_entry(other_id, frame);
            }
            if let Some(other) = game.entities.get_mut(other_id) {
                other.physics.update_overlap_entry(entity_id, frame);
            }

            let event = OverlapEvent::new(OverlapEventKind::Update, entity_id, other_id, collision.position, other_position);
            self.resolve_overlap_event(game, reactor, &event);
            self.resolve_overlap_event(game, reactor, &event.reversed());
        }
    }

    /// Pushes an interpenetrating pair apart by half the penetration each and
    /// registers both sides so the push is consumed next tick.
    fn apply_repulsion_forces(&mut self, game: &mut Game, entity_id: EntityId, other_id: EntityId) {
        let (Some(entity), Some(other)) = (game.entities.get(entity_id), game.entities.get(other_id)) else {
            return;
        };

        let delta = flatten_2d(entity.position - other.position);
        let penetration = entity.collide_radius() + other.collide_radius() - delta.length();
        let push_length = penetration * 0.5;
        // Anything shorter is dropped by the resolver, so neither side is registered for it.
        if push_length <= self.config.near_zero_epsilon {
            return;
        }

        let push = safe_normalize_2d(delta, Vec3::X) * push_length;
        let entity_yields = entity.can_be_blocked_by(other);
        let other_yields = other.can_be_blocked_by(entity);
        let write_index = self.force_index.write_index();

        if entity_yields {
            if let Some(entity) = game.entities.get_mut(entity_id) {
                entity.physics.add_repulsion_force(write_index, push);
            }
            self.register_entity_for_pending_physics_resolve(game, entity_id);
        }
        if other_yields {
            if let Some(other) = game.entities.get_mut(other_id) {
                other.physics.add_repulsion_force(write_index, -push);
            }
            self.register_entity_for_pending_physics_resolve(game, other_id);
        }
        trace!(
            "Repulsion between entities {} and {}: penetration {:.3}",
            entity_id,
            other_id,
            penetration
        );
    }

    /// Gate through the region's pair cache. False for a pair already handled
    /// this tick, or when either side has no collision slot.
    fn cache_collision_pair(&self, game: &mut Game, entity_id: EntityId, other_id: EntityId) -> bool {
        let (Some(entity), Some(other)) = (game.entities.get(entity_id), game.entities.get(other_id)) else {
            return false;
        };
        let (collision_id, other_collision_id) = (entity.physics.collision_id, other.physics.collision_id);
        match game.region_of_mut(entity_id) {
            Some(region) => region.collide_entities(collision_id, other_collision_id),
            None => false,
        }
    }
}
