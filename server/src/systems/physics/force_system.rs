// massive_world_physics/server/src/systems/physics/force_system.rs
use super::manager::PhysicsManager;
use super::reactor::PhysicsReactor;
use crate::core::error::{PhysicsError, PhysicsResult};
use crate::core::types::{EntityId, MoveEntityFlags, Vec3};
use crate::world::Game;
use tracing::trace;

/// Two-slot toggle selecting which force accumulator is read and which is written.
///
/// Flipped once at the start of every tick, so forces written during tick N are
/// consumed by tick N + 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceReadWriteIndex {
    state: bool,
}

impl ForceReadWriteIndex {
    pub fn read_index(&self) -> usize {
        if self.state { 1 } else { 0 }
    }

    pub fn write_index(&self) -> usize {
        if self.state { 0 } else { 1 }
    }

    pub fn swap(&mut self) {
        self.state = !self.state;
    }
}

/// One entity's share of a force system: a kinematic push along a fixed direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceSystemMember {
    entity_id: EntityId,
    direction: Vec3,
    speed: f32,
    acceleration: f32,
    time: f32,
}

impl ForceSystemMember {
    pub fn new(entity_id: EntityId, direction: Vec3, speed: f32, acceleration: f32, time: f32) -> PhysicsResult<Self> {
        let direction = direction
            .try_normalize()
            .ok_or_else(|| PhysicsError::InvalidForce(format!("direction {:?} cannot be normalized", direction)))?;
        if !speed.is_finite() || !acceleration.is_finite() {
            return Err(PhysicsError::InvalidForce(format!(
                "speed {} and acceleration {} must be finite",
                speed, acceleration
            )));
        }
        if !time.is_finite() || time < 0.0 {
            return Err(PhysicsError::InvalidForce(format!("remaining time {} must be non-negative", time)));
        }
        Ok(ForceSystemMember { entity_id, direction, speed, acceleration, time })
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Time consumed and distance covered by the next step of at most `dt` seconds.
    pub fn step(&self, dt: f32) -> (f32, f32) {
        let time = dt.min(self.time);
        let distance = self.speed * time + self.acceleration * time * time / 2.0;
        (time, distance)
    }

    fn advance(&mut self, time: f32) {
        self.time -= time;
        self.speed += self.acceleration * time;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceSystem {
    name: String,
    members: Vec<ForceSystemMember>,
}

impl ForceSystem {
    pub fn new(name: impl Into<String>) -> Self {
        ForceSystem { name: name.into(), members: Vec::new() }
    }

    pub fn with_member(mut self, member: ForceSystemMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[ForceSystemMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl PhysicsManager {
    /// Promotes pending systems, advances every active one by a fixed step and
    /// drops the systems with no active member left.
    pub(super) fn apply_force_systems(&mut self, game: &mut Game, reactor: &mut dyn PhysicsReactor) {
        self.active_force_systems.append(&mut self.pending_force_systems);

        let mut systems = std::mem::take(&mut self.active_force_systems);
        systems.retain_mut(|system| {
            let complete = self.apply_force_system_check_completion(game, reactor, system);
            if complete {
                trace!("Force system '{}' completed", system.name);
            }
            !complete
        });
        self.active_force_systems = systems;
    }

    fn apply_force_system_check_completion(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        system: &mut ForceSystem,
    ) -> bool {
        let mut complete = true;
        let mut members = std::mem::take(&mut system.members);
        members.retain_mut(|member| {
            let active = self.apply_force_member(game, reactor, member);
            complete &= !active;
            active
        });
        system.members = members;
        complete
    }

    /// Residual motion is applied only to entities already flagged destroyed;
    /// live entities are moved through external forces instead.
    fn apply_force_member(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        member: &mut ForceSystemMember,
    ) -> bool {
        let entity_id = member.entity_id;
        let start = match game.in_world_entity(entity_id) {
            Some(entity) if entity.is_destroyed() => entity.position,
            _ => return false,
        };

        let (time, distance) = member.step(self.config.fixed_time_between_updates_secs);
        let vector = member.direction * distance;
        let flags = MoveEntityFlags::SEND_TO_OWNER
            | MoveEntityFlags::SEND_TO_CLIENTS
            | MoveEntityFlags::SWEEP_COLLIDE
            | MoveEntityFlags::RESIDUAL_MOTION;
        let moved = self.move_entity(game, reactor, entity_id, vector, flags);

        let end = game.entities.get(entity_id).map_or(start, |entity| entity.position);
        let collision = (start + vector - end).length_squared() > self.config.force_collision_threshold_sq;
        member.advance(time);

        if moved {
            reactor.on_navigation_influence_changed(entity_id);
        }
        trace!(
            "Force member for entity {} moved {:.3} (collision: {}, remaining {:.3}s)",
            entity_id,
            (end - start).length(),
            collision,
            member.time
        );

        !collision && member.time.abs() >= self.config.force_time_epsilon
    }
}
