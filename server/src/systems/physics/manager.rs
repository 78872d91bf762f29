// massive_world_physics/server/src/systems/physics/manager.rs
use super::force_system::{ForceReadWriteIndex, ForceSystem};
use super::overlap::OverlapEvent;
use super::reactor::PhysicsReactor;
use crate::core::config::PhysicsConfig;
use crate::core::error::{PhysicsError, PhysicsResult};
use crate::core::types::{is_near_zero, ChangePositionFlags, EntityId, MoveEntityFlags, PhysicsFrameId, Vec3};
use crate::operational::monitoring::metrics::PhysicsMetrics;
use crate::world::Game;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A resolve pass is already running.
    AlreadyResolving,
    /// The game has no region to resolve against.
    NoWorld,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub physics_frame: PhysicsFrameId,
    /// In-world, live entities taken from the resolve batch.
    pub entities_resolved: usize,
    pub entities_moved: usize,
    pub attached_entities_updated: usize,
    pub force_systems_active: usize,
    pub overlap_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(ResolveStats),
    Skipped(SkipReason),
}

impl ResolveOutcome {
    pub fn stats(&self) -> Option<&ResolveStats> {
        match self {
            ResolveOutcome::Resolved(stats) => Some(stats),
            ResolveOutcome::Skipped(_) => None,
        }
    }
}

/// Entities touched by the current tick besides the resolve batch.
#[derive(Debug, Default)]
pub(super) struct PhysicsContext {
    pub(super) attached_entities: Vec<EntityId>,
}

/// Per-tick resolver: owns the resolve sets, force systems and the overlap
/// event queue. Runs single threaded against a `Game` it borrows per call.
pub struct PhysicsManager {
    pub(super) config: PhysicsConfig,
    pub(super) pending_force_systems: Vec<ForceSystem>,
    pub(super) active_force_systems: Vec<ForceSystem>,
    pub(super) overlap_events: VecDeque<OverlapEvent>,
    entities_pending_resolve: Vec<EntityId>,
    entities_resolving: Vec<EntityId>,
    pub(super) physics_frames: PhysicsFrameId,
    pub(super) force_index: ForceReadWriteIndex,
    resolving: bool,
    metrics: PhysicsMetrics,
}

impl PhysicsManager {
    pub fn new(config: PhysicsConfig) -> Self {
        PhysicsManager {
            config,
            pending_force_systems: Vec::new(),
            active_force_systems: Vec::new(),
            overlap_events: VecDeque::new(),
            entities_pending_resolve: Vec::new(),
            entities_resolving: Vec::new(),
            physics_frames: 1,
            force_index: ForceReadWriteIndex::default(),
            resolving: false,
            metrics: PhysicsMetrics::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn physics_frame(&self) -> PhysicsFrameId {
        self.physics_frames
    }

    pub fn force_read_index(&self) -> usize {
        self.force_index.read_index()
    }

    pub fn force_write_index(&self) -> usize {
        self.force_index.write_index()
    }

    pub fn pending_resolve(&self) -> &[EntityId] {
        &self.entities_pending_resolve
    }

    pub fn pending_force_system_count(&self) -> usize {
        self.pending_force_systems.len()
    }

    pub fn active_force_system_count(&self) -> usize {
        self.active_force_systems.len()
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Queues the entity for the next resolve pass. Idempotent within a frame;
    /// returns false if the entity is unknown or already queued.
    pub fn register_entity_for_pending_physics_resolve(&mut self, game: &mut Game, entity_id: EntityId) -> bool {
        let Some(entity) = game.entities.get_mut(entity_id) else {
            return false;
        };
        if entity.physics.registered_physics_frame_id == self.physics_frames {
            return false;
        }
        entity.physics.registered_physics_frame_id = self.physics_frames;
        self.entities_pending_resolve.push(entity_id);
        true
    }

    /// Adds a force system; it is first applied by the next resolve pass.
    pub fn submit_force_system(&mut self, system: ForceSystem) {
        if system.is_empty() {
            debug!("Ignoring force system '{}' with no members", system.name());
            return;
        }
        self.pending_force_systems.push(system);
    }

    /// Accumulates a displacement into the entity's write slot and queues it for resolve.
    pub fn apply_external_force(&mut self, game: &mut Game, entity_id: EntityId, force: Vec3) -> PhysicsResult<()> {
        if !force.is_finite() {
            return Err(PhysicsError::InvalidForce(format!("external force {:?} is not finite", force)));
        }
        let write_index = self.force_index.write_index();
        let entity = game.entities.get_mut(entity_id).ok_or(PhysicsError::EntityNotFound(entity_id))?;
        entity.physics.add_external_force(write_index, force);
        self.register_entity_for_pending_physics_resolve(game, entity_id);
        Ok(())
    }

    /// Runs one physics tick.
    pub fn resolve_entities(&mut self, game: &mut Game, reactor: &mut dyn PhysicsReactor) -> ResolveOutcome {
        if self.resolving {
            debug!("Physics resolve requested while a resolve is in progress");
            return ResolveOutcome::Skipped(SkipReason::AlreadyResolving);
        }
        if !game.has_world() {
            debug!("Physics resolve skipped: no world");
            return ResolveOutcome::Skipped(SkipReason::NoWorld);
        }

        let tick_start = Instant::now();
        self.resolving = true;

        let mut resolving = std::mem::take(&mut self.entities_resolving);
        resolving.clear();
        resolving.append(&mut self.entities_pending_resolve);
        self.physics_frames = next_physics_frame(self.physics_frames);

        self.force_index.swap();
        self.apply_force_systems(game, reactor);

        let mut context = PhysicsContext::default();
        let (entities_resolved, entities_moved) =
            self.resolve_entities_allow_penetration(game, reactor, &mut context, &resolving);

        let mut touched = resolving.clone();
        touched.extend_from_slice(&context.attached_entities);
        let overlap_events = self.resolve_entities_overlap_state(game, reactor, &touched);

        resolving.clear();
        self.entities_resolving = resolving;
        game.regions.clear_collided_entities();
        self.resolving = false;

        let stats = ResolveStats {
            physics_frame: self.physics_frames,
            entities_resolved,
            entities_moved,
            attached_entities_updated: context.attached_entities.len(),
            force_systems_active: self.active_force_systems.len(),
            overlap_events,
        };

        let elapsed = tick_start.elapsed();
        self.metrics.record_tick(&stats, elapsed.as_secs_f64());
        if elapsed.as_millis() > u128::from(self.config.slow_tick_log_ms) {
            warn!(
                "Slow physics tick {}: {:?} for {} entities",
                stats.physics_frame, elapsed, stats.entities_resolved
            );
        }

        ResolveOutcome::Resolved(stats)
    }

    fn resolve_entities_allow_penetration(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        context: &mut PhysicsContext,
        entities_resolving: &[EntityId],
    ) -> (usize, usize) {
        let read_index = self.force_index.read_index();
        let (mut resolved, mut moved) = (0, 0);

        for &entity_id in entities_resolving {
            let Some(entity) = game.in_world_entity(entity_id) else {
                continue;
            };
            if entity.is_destroyed() {
                continue;
            }

            let mut external_forces = entity.physics.external_forces(read_index);
            let mut repulsion_forces = entity.physics.repulsion_forces(read_index);

            let mut move_flags = MoveEntityFlags::empty();
            if entity.physics.has_external_forces(read_index) {
                move_flags |= MoveEntityFlags::SEND_TO_OWNER | MoveEntityFlags::SEND_TO_CLIENTS;
            }
            if entity.movement_authoritative {
                move_flags |= MoveEntityFlags::SEND_TO_OWNER;
            }

            if !is_near_zero(repulsion_forces, self.config.near_zero_epsilon) {
                let length = repulsion_forces.length();
                let collide_radius = entity.collide_radius();
                if length > collide_radius {
                    repulsion_forces *= collide_radius / length;
                }
                external_forces += repulsion_forces;
            }

            move_flags |= MoveEntityFlags::SWEEP_COLLIDE | MoveEntityFlags::SLIDING;
            resolved += 1;
            if self.move_entity(game, reactor, entity_id, external_forces, move_flags) {
                moved += 1;
            }

            if let Some(entity) = game.entities.get_mut(entity_id) {
                entity.physics.on_physics_update_finished(read_index);
            }
            self.update_attached_entity_positions(game, reactor, context, entity_id);
        }

        (resolved, moved)
    }

    /// Snaps every attached entity onto its parent and re-checks its contacts.
    fn update_attached_entity_positions(
        &mut self,
        game: &mut Game,
        reactor: &mut dyn PhysicsReactor,
        context: &mut PhysicsContext,
        parent_id: EntityId,
    ) {
        let Some(parent) = game.entities.get(parent_id) else {
            return;
        };
        if !parent.physics.has_attached_entities() {
            return;
        }
        let parent_position = parent.position;
        let parent_orientation = parent.orientation;
        let attached: Vec<EntityId> = parent.physics.attached_entities().to_vec();

        for child_id in attached {
            let Some(child) = game.in_world_entity(child_id) else {
                continue;
            };
            let orientation = child
                .prototype
                .update_orientation_with_parent
                .then_some(parent_orientation);

            game.change_region_position(
                child_id,
                parent_position,
                orientation,
                ChangePositionFlags::PHYSICS_RESOLVE,
                reactor,
            );
            self.check_for_existing_collisions(game, reactor, child_id, false);
            context.attached_entities.push(child_id);
        }
    }
}

/// Advances the frame counter, skipping 0 so a fresh entity never looks registered.
fn next_physics_frame(frame: PhysicsFrameId) -> PhysicsFrameId {
    match frame.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}
