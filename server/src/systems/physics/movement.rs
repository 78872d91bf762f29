// massive_world_physics/server/src/systems/physics/movement.rs
use super::collision::{sort_by_time_of_impact, EntityCollision};
use super::manager::PhysicsManager;
use super::reactor::PhysicsReactor;
use crate::core::types::{
    epsilon_sphere_test, flatten_2d, is_near_zero, safe_normalize_2d, ChangePositionFlags, EntityId,
    MoveEntityFlags, Vec3,
};
use crate::geometry::Aabb;
use crate::world::{Game, SweepResult};
use tracing::trace;

/// Where the locomotion sweep lets an entity go before entity collisions are considered.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DesiredDestination {
    Reached { position: Vec3, clipped: bool },
    /// The sweep ended where the entity already stands.
    Stationary,
    Failed,
}

impl PhysicsManager {
    /// Moves an in-world entity by `vector`, honouring walls and, with
    /// `SWEEP_COLLIDE`, other entities. Returns true if the entity changed position.
    ///
    /// A near-zero `vector` only re-checks what the entity already touches.
    pub fn move_entity(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        entity_id: EntityId,
        vector: Vec3,
        flags: MoveEntityFlags,
    ) -> bool {
        let Some(entity) = game.in_world_entity(entity_id) else {
            return false;
        };
        if entity.is_destroyed() && !flags.contains(MoveEntityFlags::RESIDUAL_MOTION) {
            return false;
        }

        if is_near_zero(vector, self.config.near_zero_epsilon) {
            self.check_for_existing_collisions(game, reactor, entity_id, true);
            return false;
        }

        let Some(locomotion) = entity.locomotion else {
            return false;
        };
        let start = entity.position;
        let not_missile = !locomotion.is_missile;
        let sliding = not_missile && flags.contains(MoveEntityFlags::SLIDING);
        let sweep_collide = flags.contains(MoveEntityFlags::SWEEP_COLLIDE);
        let send_to_owner = flags.contains(MoveEntityFlags::SEND_TO_OWNER);
        let send_to_clients = flags.contains(MoveEntityFlags::SEND_TO_CLIENTS);

        let (desired, clipped) = match self.get_desired_destination(game, entity_id, vector, not_missile) {
            DesiredDestination::Reached { position, clipped } => (position, clipped),
            DesiredDestination::Stationary => {
                self.check_for_existing_collisions(game, reactor, entity_id, true);
                return false;
            }
            DesiredDestination::Failed => return false,
        };

        let mut collisions = Vec::new();
        let collided_destination = if sweep_collide {
            self.sweep_entity_collide_to_destination(game, entity_id, desired, sliding, &mut collisions)
        } else {
            Some(desired)
        };

        let moved = collided_destination.is_some();
        let final_position = collided_destination.unwrap_or(start);
        if let Some(destination) = collided_destination {
            if let Some(locomotion) = game.entities.get_mut(entity_id).and_then(|e| e.locomotion.as_mut()) {
                locomotion.movement_impeded =
                    clipped || !epsilon_sphere_test(destination, desired, self.config.movement_epsilon);
            }

            let mut change_flags = ChangePositionFlags::PHYSICS_RESOLVE;
            if !send_to_owner {
                change_flags |= ChangePositionFlags::NO_SEND_TO_OWNER;
            }
            if !send_to_clients {
                change_flags |= ChangePositionFlags::NO_SEND_TO_CLIENTS;
            }
            game.change_region_position(entity_id, destination, None, change_flags, reactor);
        }

        trace!(
            "Entity {} moved {:?} -> {:?} (desired {:?}, clipped: {}, candidates: {})",
            entity_id,
            start,
            final_position,
            desired,
            clipped,
            collisions.len()
        );

        if sweep_collide {
            self.handle_entity_collisions(game, reactor, entity_id, &collisions, true);
        }

        let still_alive = game.in_world_entity(entity_id).map_or(false, |e| !e.is_destroyed());
        if clipped && still_alive {
            reactor.on_entity_collision(entity_id, None, final_position);
        }

        moved
    }

    /// Locomotion sweep toward `start + vector`: clips against walls and the
    /// region bound, nudges off a wall it could not leave, clamps Z to the
    /// region and, when allowed, slides the remainder along the wall.
    fn get_desired_destination(
        &self,
        game: &Game,
        entity_id: EntityId,
        vector: Vec3,
        allow_sweep: bool,
    ) -> DesiredDestination {
        let (Some(entity), Some(region)) = (game.entities.get(entity_id), game.region_of(entity_id)) else {
            return DesiredDestination::Failed;
        };
        let start = entity.position;
        let mut destination = start + vector;
        let radius = entity.collide_radius();

        let Some(locomotion) = entity.locomotion else {
            return DesiredDestination::Stationary;
        };

        let sweep = region.sweep_from_to(start, destination, radius);
        if sweep.result == SweepResult::Failed {
            return DesiredDestination::Failed;
        }
        let clipped = sweep.result != SweepResult::Success;
        let normal_2d = safe_normalize_2d(sweep.normal, Vec3::ZERO);
        let mut position = sweep.position;

        if locomotion.is_missile {
            position.z = destination.z;
        }
        if clipped && is_near_zero(start - position, self.config.near_zero_epsilon) {
            position += normal_2d * self.config.wall_slide_nudge;
        }
        let bound = region.bound();
        position.z = position.z.clamp(bound.min.z, bound.max.z);

        if clipped && allow_sweep {
            let velocity_2d = flatten_2d(destination - position);
            let dot = velocity_2d.dot(normal_2d);
            if dot < 0.0 {
                let from = position;
                destination = position + (velocity_2d - normal_2d * dot);
                let slide = region.sweep_from_to(from, destination, radius);
                if slide.result == SweepResult::Failed {
                    return DesiredDestination::Failed;
                }
                position = slide.position;
            }
        }

        if is_near_zero(position - start, self.config.near_zero_epsilon) {
            return DesiredDestination::Stationary;
        }
        DesiredDestination::Reached { position, clipped }
    }

    /// Sweeps the entity's bounds toward `desired` against other entities.
    ///
    /// Every candidate reached before the earliest blocker lands in `collisions`
    /// (time ordered); later ones are dropped. With `sliding`, the travel left
    /// after the blocker is projected onto the contact tangent and swept once
    /// more, ignoring the blocker. Returns the final position, or `None` when
    /// the entity does not move.
    fn sweep_entity_collide_to_destination(
        &self,
        game: &Game,
        entity_id: EntityId,
        desired: Vec3,
        sliding: bool,
        collisions: &mut Vec<EntityCollision>,
    ) -> Option<Vec3> {
        let entity = game.in_world_entity(entity_id)?;
        let region = game.region_of(entity_id)?;
        let start = entity.position;
        let radius = entity.collide_radius();
        let mut velocity = desired - start;

        let volume = swept_volume(&entity.collide_bounds().to_aabb(), velocity);
        let blocker = self.sweep_entity_collide_to_destination_helper(game, entity_id, &volume, start, desired, None, collisions);
        sort_by_time_of_impact(collisions);

        if let Some(blocker) = blocker {
            collisions.retain(|collision| collision.time <= blocker.time);
            velocity *= blocker.time;
        }

        let near_zero = self.config.near_zero_epsilon;
        if !sliding && is_near_zero(velocity, near_zero) {
            return None;
        }

        let mut collided = start + velocity;
        let Some(blocker) = blocker.filter(|_| sliding) else {
            return Some(collided);
        };

        let normal_2d = safe_normalize_2d(blocker.normal, Vec3::ZERO);
        let remaining_2d = flatten_2d(desired - collided);
        let dot = remaining_2d.dot(normal_2d);
        if dot < 0.0 {
            let tangent = remaining_2d - normal_2d * dot;
            let slide = region.sweep_from_to(collided, collided + tangent, radius);
            if slide.result != SweepResult::Failed {
                let slide_velocity = slide.position - collided;
                if !is_near_zero(slide_velocity, near_zero) {
                    let slide_volume = swept_volume(&entity.collide_bounds().at(collided).to_aabb(), slide_velocity);
                    let mut slide_collisions = Vec::new();
                    let slide_blocker = self.sweep_entity_collide_to_destination_helper(
                        game,
                        entity_id,
                        &slide_volume,
                        collided,
                        slide.position,
                        Some(blocker.other_id),
                        &mut slide_collisions,
                    );
                    sort_by_time_of_impact(&mut slide_collisions);
                    let time = slide_blocker.map_or(1.0, |b| b.time);
                    slide_collisions.retain(|collision| collision.time <= time);
                    collisions.extend(slide_collisions);
                    collided += slide_velocity * time;
                }
            }
        }

        if is_near_zero(collided - start, near_zero) {
            None
        } else {
            Some(collided)
        }
    }

    /// Collects every entity the straight sweep `position -> destination` touches
    /// and returns the earliest one that actually blocks the mover.
    #[allow(clippy::too_many_arguments)]
    fn sweep_entity_collide_to_destination_helper(
        &self,
        game: &Game,
        entity_id: EntityId,
        volume: &Aabb,
        position: Vec3,
        destination: Vec3,
        ignored: Option<EntityId>,
        collisions: &mut Vec<EntityCollision>,
    ) -> Option<EntityCollision> {
        let entity = game.entities.get(entity_id)?;
        let region = game.region_of(entity_id)?;
        let bounds = entity.collide_bounds().at(position);
        let velocity = destination - position;
        let velocity_2d = flatten_2d(velocity);

        let mut blocker: Option<EntityCollision> = None;
        for other_id in region.entities_in_volume(volume) {
            if other_id == entity_id || Some(other_id) == ignored {
                continue;
            }
            let Some(other) = game.entities.get(other_id) else {
                continue;
            };
            if !(entity.can_collide_with(other) || other.can_collide_with(entity)) {
                continue;
            }
            let Some(hit) = bounds.sweep(&other.collide_bounds(), velocity) else {
                continue;
            };

            let collision = EntityCollision {
                other_id,
                time: hit.time,
                position: position + velocity * hit.time,
                normal: hit.normal,
            };
            collisions.push(collision);

            let blocks = entity.can_be_blocked_by(other) && velocity_2d.dot(hit.normal) < 0.0;
            if blocks && blocker.map_or(true, |current| hit.time < current.time) {
                blocker = Some(collision);
            }
        }
        blocker
    }
}

fn swept_volume(aabb: &Aabb, velocity: Vec3) -> Aabb {
    aabb.union(&aabb.translate(velocity))
}
