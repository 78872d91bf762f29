// massive_world_physics/server/src/main.rs
//! Headless driver: builds a small arena, runs a fixed number of physics ticks
//! and logs every notification. Optional first argument: a YAML config file.

use anyhow::Context;
use massive_world_physics::core::types::{EntityId, Orientation, Vec3};
use massive_world_physics::entities::{CollisionProfile, Locomotion, WorldEntityPrototype};
use massive_world_physics::geometry::{Aabb, CollisionShape};
use massive_world_physics::operational::monitoring::init_logging;
use massive_world_physics::systems::physics::{
    ForceSystem, ForceSystemMember, PhysicsManager, PhysicsReactor, ResolveOutcome,
};
use massive_world_physics::world::{Game, Wall};
use massive_world_physics::PhysicsConfig;
use std::sync::Arc;
use tracing::info;

const DEMO_TICKS: u32 = 90;

const LAYER_AVATAR: u32 = 1 << 0;
const LAYER_PROP: u32 = 1 << 1;
const LAYER_TRIGGER: u32 = 1 << 2;

struct TracingReactor;

impl PhysicsReactor for TracingReactor {
    fn on_entity_collision(&mut self, who: EntityId, other: Option<EntityId>, position: Vec3) {
        match other {
            Some(other) => info!("collision: {} hit {} at {:?}", who, other, position),
            None => info!("collision: {} hit the environment at {:?}", who, position),
        }
    }

    fn on_overlap_begin(&mut self, who: EntityId, whom: EntityId, _who_position: Vec3, _whom_position: Vec3) {
        info!("overlap begin: {} -> {}", who, whom);
    }

    fn on_overlap_end(&mut self, who: EntityId, whom: EntityId) {
        info!("overlap end: {} -> {}", who, whom);
    }
}

fn prototype(layer: u32, collides_with: u32, blocked_by: u32, track_overlap: bool) -> Arc<WorldEntityPrototype> {
    Arc::new(WorldEntityPrototype {
        collision: CollisionProfile::new(layer, collides_with, blocked_by),
        update_orientation_with_parent: true,
        track_overlap,
    })
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::from_yaml_file(&path).with_context(|| format!("Failed to load config {}", path))?,
        None => PhysicsConfig::default(),
    };
    info!("Physics configuration loaded: {:?}", config);

    let mut game = Game::new(&config);
    let region = game.create_region(Aabb::new(Vec3::new(-64.0, -64.0, -8.0), Vec3::new(64.0, 64.0, 8.0)));
    if let Some(region) = game.regions.get_mut(region) {
        region.add_wall(Wall::new(1, 20.0, -10.0, 2.0, 20.0));
    }

    let avatar_proto = prototype(LAYER_AVATAR, LAYER_AVATAR | LAYER_PROP | LAYER_TRIGGER, LAYER_AVATAR | LAYER_PROP, false);
    let prop_proto = prototype(LAYER_PROP, LAYER_AVATAR, LAYER_AVATAR | LAYER_PROP, false);
    let trigger_proto = prototype(LAYER_TRIGGER, LAYER_AVATAR, 0, true);

    let cylinder = CollisionShape::Cylinder { radius: 1.0, half_height: 2.0 };
    let walker = game.entities.create_entity(cylinder, avatar_proto.clone());
    let rider = game.entities.create_entity(cylinder, prototype(0, 0, 0, false));
    let crate_prop = game.entities.create_entity(CollisionShape::Box { half_extents: Vec3::splat(1.0) }, prop_proto);
    let trigger = game.entities.create_entity(cylinder, trigger_proto);
    let debris = game.entities.create_entity(CollisionShape::Sphere { radius: 0.5 }, avatar_proto);

    for id in [walker, debris] {
        if let Some(entity) = game.entities.get_mut(id) {
            entity.locomotion = Some(Locomotion::default());
        }
    }

    game.enter_world(walker, region, Vec3::new(-10.0, 0.0, 0.0), Orientation::default())?;
    game.enter_world(rider, region, Vec3::new(-10.0, 0.0, 0.0), Orientation::default())?;
    game.enter_world(crate_prop, region, Vec3::new(0.0, 0.5, 0.0), Orientation::default())?;
    game.enter_world(trigger, region, Vec3::new(-5.0, 0.0, 0.0), Orientation::default())?;
    game.enter_world(debris, region, Vec3::new(0.0, -20.0, 0.0), Orientation::default())?;
    game.attach_entity(walker, rider)?;

    let mut physics = PhysicsManager::new(config);
    let mut reactor = TracingReactor;

    game.destroy_entity(debris);
    physics.submit_force_system(
        ForceSystem::new("debris_knockback").with_member(ForceSystemMember::new(debris, Vec3::Y, 12.0, -6.0, 2.0)?),
    );

    for _ in 0..DEMO_TICKS {
        physics.apply_external_force(&mut game, walker, Vec3::new(0.5, 0.0, 0.0))?;
        if let ResolveOutcome::Skipped(reason) = physics.resolve_entities(&mut game, &mut reactor) {
            info!("Tick skipped: {:?}", reason);
        }
    }

    for id in [walker, rider, debris] {
        if let Some(entity) = game.entities.get(id) {
            info!("Entity {} finished at {:?}", id, entity.position);
        }
    }
    info!("Ran {} ticks, physics frame {}", DEMO_TICKS, physics.physics_frame());
    Ok(())
}
