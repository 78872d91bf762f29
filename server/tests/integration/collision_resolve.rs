// massive_world_physics/server/tests/integration/collision_resolve.rs

use massive_world_physics::core::config::PhysicsConfig;
use massive_world_physics::core::types::{ChangePositionFlags, EntityId, MoveEntityFlags, Orientation, RegionId, Vec3};
use massive_world_physics::entities::{CollisionProfile, Locomotion, WorldEntityPrototype};
use massive_world_physics::geometry::{Aabb, CollisionShape};
use massive_world_physics::systems::physics::{NotificationLog, PhysicsManager, ResolveOutcome, ResolveStats};
use massive_world_physics::world::{Game, Wall};
use std::sync::Arc;

const SOLID: u32 = 1;

struct TestWorldContext {
    game: Game,
    physics: PhysicsManager,
    log: NotificationLog,
    region: RegionId,
}

fn setup_test_world() -> TestWorldContext {
    let config = PhysicsConfig::default();
    let mut game = Game::new(&config);
    let region = game.create_region(Aabb::new(Vec3::new(-100.0, -100.0, -10.0), Vec3::new(100.0, 100.0, 10.0)));
    TestWorldContext { game, physics: PhysicsManager::new(config), log: NotificationLog::new(), region }
}

fn solid() -> Arc<WorldEntityPrototype> {
    Arc::new(WorldEntityPrototype {
        collision: CollisionProfile::new(SOLID, SOLID, SOLID),
        ..Default::default()
    })
}

impl TestWorldContext {
    fn spawn(&mut self, position: Vec3, mobile: bool) -> EntityId {
        self.spawn_with(position, mobile.then(Locomotion::default))
    }

    fn spawn_with(&mut self, position: Vec3, locomotion: Option<Locomotion>) -> EntityId {
        let id = self.game.entities.create_entity(CollisionShape::Sphere { radius: 1.0 }, solid());
        if let Some(entity) = self.game.entities.get_mut(id) {
            entity.locomotion = locomotion;
        }
        self.game
            .enter_world(id, self.region, position, Orientation::default())
            .expect("Failed to place test entity");
        id
    }

    fn push(&mut self, id: EntityId, force: Vec3) {
        self.physics
            .apply_external_force(&mut self.game, id, force)
            .expect("Failed to apply test force");
    }

    fn tick(&mut self) -> ResolveStats {
        match self.physics.resolve_entities(&mut self.game, &mut self.log) {
            ResolveOutcome::Resolved(stats) => stats,
            ResolveOutcome::Skipped(reason) => panic!("Tick unexpectedly skipped: {:?}", reason),
        }
    }

    fn position(&self, id: EntityId) -> Vec3 {
        self.game.entities.get(id).expect("Entity missing").position
    }

    fn add_wall(&mut self, wall: Wall) {
        if let Some(region) = self.game.regions.get_mut(self.region) {
            region.add_wall(wall);
        }
    }
}

#[test]
fn mover_stops_tangent_to_blocker() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let b = ctx.spawn(Vec3::new(2.5, 0.0, 0.0), false);

    ctx.push(a, Vec3::new(5.0, 0.0, 0.0));
    let stats = ctx.tick();
    assert_eq!(stats.entities_moved, 1);

    let gap = ctx.position(a).distance(ctx.position(b));
    assert!((gap - 2.0).abs() < 1e-4, "bounding circles should touch, gap was {}", gap);
    assert_eq!(ctx.log.collisions_for(a), vec![Some(b)]);
    assert_eq!(ctx.log.collisions_for(b), vec![Some(a)]);

    let locomotion = ctx.game.entities.get(a).unwrap().locomotion.unwrap();
    assert!(locomotion.movement_impeded);
}

#[test]
fn earliest_blocker_wins_and_later_candidates_are_dropped() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let near = ctx.spawn(Vec3::new(5.0, 0.0, 0.0), false);
    let far = ctx.spawn(Vec3::new(9.0, 0.0, 0.0), false);

    ctx.push(a, Vec3::new(10.0, 0.0, 0.0));
    ctx.tick();

    assert!((ctx.position(a).x - 3.0).abs() < 1e-4);
    assert_eq!(ctx.log.collisions_for(a), vec![Some(near)]);
    assert!(ctx.log.collisions_for(far).is_empty());
}

#[test]
fn simultaneous_blockers_are_reported_in_id_order() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let upper = ctx.spawn(Vec3::new(5.0, 0.5, 0.0), false);
    let lower = ctx.spawn(Vec3::new(5.0, -0.5, 0.0), false);

    let moved = ctx.physics.move_entity(
        &mut ctx.game,
        &mut ctx.log,
        a,
        Vec3::new(10.0, 0.0, 0.0),
        MoveEntityFlags::SWEEP_COLLIDE,
    );
    assert!(moved);
    assert_eq!(ctx.log.collisions_for(a), vec![Some(upper), Some(lower)]);
}

#[test]
fn sliding_follows_the_contact_tangent() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let b = ctx.spawn(Vec3::new(3.0, 1.0, 0.0), false);

    ctx.push(a, Vec3::new(6.0, 0.0, 0.0));
    ctx.tick();

    let end = ctx.position(a);
    let contact_x = 3.0 - 3.0_f32.sqrt();
    assert!(end.x > contact_x + 0.5, "mover should slide past the contact point, ended at {:?}", end);
    assert!(end.y < -1.0, "mover should slide away from the blocker, ended at {:?}", end);
    assert!(end.length() <= 6.0 + 1e-3);
    assert!(end.distance(ctx.position(b)) >= 2.0 - 1e-3);
    assert_eq!(ctx.log.collisions_for(a), vec![Some(b)]);
}

#[test]
fn entity_registered_many_times_resolves_once() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    for _ in 0..3 {
        ctx.physics.register_entity_for_pending_physics_resolve(&mut ctx.game, a);
    }
    ctx.push(a, Vec3::new(1.0, 0.0, 0.0));

    let stats = ctx.tick();
    assert_eq!(stats.entities_resolved, 1);
    assert_eq!(ctx.log.position_changes(a), 1);
    assert!(ctx.physics.pending_resolve().is_empty());
}

#[test]
fn overlapping_blockers_are_pushed_apart_over_later_ticks() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let b = ctx.spawn(Vec3::new(1.0, 0.0, 0.0), true);

    ctx.physics.register_entity_for_pending_physics_resolve(&mut ctx.game, a);
    let first = ctx.tick();
    assert_eq!(first.entities_resolved, 1);
    assert_eq!(ctx.physics.pending_resolve(), &[a, b]);

    ctx.tick();
    let gap = ctx.position(a).distance(ctx.position(b));
    assert!(gap >= 2.0 - 1e-3, "pair should be separated, gap was {}", gap);
}

#[test]
fn wall_clip_reports_environment_collision() {
    let mut ctx = setup_test_world();
    if let Some(region) = ctx.game.regions.get_mut(ctx.region) {
        region.add_wall(Wall::new(1, 5.0, -10.0, 2.0, 20.0));
    }
    let a = ctx.spawn(Vec3::ZERO, true);

    ctx.push(a, Vec3::new(10.0, 0.0, 0.0));
    ctx.tick();

    assert!((ctx.position(a).x - 4.0).abs() < 1e-2);
    assert_eq!(ctx.log.collisions_for(a), vec![None]);
    assert!(ctx.game.entities.get(a).unwrap().locomotion.unwrap().movement_impeded);
}

#[test]
fn vertical_travel_is_clamped_to_region() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);

    ctx.push(a, Vec3::new(0.0, 0.0, 50.0));
    ctx.tick();

    assert_eq!(ctx.position(a).z, 10.0);
}

#[test]
fn immobile_and_destroyed_entities_stay_put() {
    let mut ctx = setup_test_world();
    let statue = ctx.spawn(Vec3::ZERO, false);
    let corpse = ctx.spawn(Vec3::new(20.0, 0.0, 0.0), true);
    ctx.game.destroy_entity(corpse);

    ctx.push(statue, Vec3::new(3.0, 0.0, 0.0));
    ctx.push(corpse, Vec3::new(3.0, 0.0, 0.0));
    let stats = ctx.tick();

    assert_eq!(stats.entities_resolved, 1);
    assert_eq!(stats.entities_moved, 0);
    assert_eq!(ctx.position(statue), Vec3::ZERO);
    assert_eq!(ctx.position(corpse), Vec3::new(20.0, 0.0, 0.0));
}

#[test]
fn crossing_movers_are_handled_once_per_tick() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let b = ctx.spawn(Vec3::new(3.0, 0.0, 0.0), true);

    ctx.push(a, Vec3::new(2.0, 0.0, 0.0));
    ctx.push(b, Vec3::new(-2.0, 0.0, 0.0));
    let stats = ctx.tick();

    assert_eq!(stats.entities_moved, 1);
    assert_eq!(ctx.log.collisions_for(a), vec![Some(b)]);
    assert_eq!(ctx.log.collisions_for(b), vec![Some(a)]);
    assert!(ctx.game.regions.get(ctx.region).unwrap().collided_entities().is_empty());
}

#[test]
fn resolve_without_regions_is_skipped() {
    let config = PhysicsConfig::default();
    let mut game = Game::new(&config);
    let mut physics = PhysicsManager::new(config);
    let mut log = NotificationLog::new();
    assert!(matches!(physics.resolve_entities(&mut game, &mut log), ResolveOutcome::Skipped(_)));
    assert_eq!(physics.physics_frame(), 1);
}

#[test]
fn shallow_overlap_separates_and_leaves_the_resolve_set() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::ZERO, true);
    let b = ctx.spawn(Vec3::new(1.4, 0.0, 0.0), true);

    ctx.physics.register_entity_for_pending_physics_resolve(&mut ctx.game, a);
    for _ in 0..5 {
        ctx.tick();
    }

    let gap = ctx.position(a).distance(ctx.position(b));
    assert!(gap >= 2.0 - 1e-3, "pair should be separated, gap was {}", gap);
    assert!(ctx.physics.pending_resolve().is_empty());
    assert_eq!(ctx.tick().entities_resolved, 0);
}

#[test]
fn entity_inside_edge_margin_can_move_back_inward() {
    let mut ctx = setup_test_world();
    let a = ctx.spawn(Vec3::new(99.5, 0.0, 0.0), true);

    ctx.push(a, Vec3::new(-10.0, 0.0, 0.0));
    let stats = ctx.tick();

    assert_eq!(stats.entities_moved, 1);
    assert!((ctx.position(a).x - 89.5).abs() < 1e-4, "ended at {:?}", ctx.position(a));
}

#[test]
fn diagonal_move_into_wall_slides_along_it() {
    let mut ctx = setup_test_world();
    ctx.add_wall(Wall::new(1, 10.0, -50.0, 2.0, 100.0));
    let a = ctx.spawn(Vec3::ZERO, true);

    let moved = ctx.physics.move_entity(
        &mut ctx.game,
        &mut ctx.log,
        a,
        Vec3::new(20.0, 10.0, 4.0),
        MoveEntityFlags::SWEEP_COLLIDE | MoveEntityFlags::SLIDING,
    );

    assert!(moved);
    let end = ctx.position(a);
    assert!((end.x - 9.0).abs() < 1e-2, "ended at {:?}", end);
    assert!((end.y - 10.0).abs() < 1e-3, "remaining lateral travel should be kept, ended at {:?}", end);
    assert!((end.z - 1.8).abs() < 1e-4, "walkers keep the clipped height, ended at {:?}", end);
    assert_eq!(ctx.log.collisions_for(a), vec![None]);
}

#[test]
fn missile_keeps_intended_height_and_does_not_slide() {
    let mut ctx = setup_test_world();
    ctx.add_wall(Wall::new(1, 10.0, -50.0, 2.0, 100.0));
    let missile = ctx.spawn_with(Vec3::ZERO, Some(Locomotion { is_missile: true, ..Default::default() }));

    let moved = ctx.physics.move_entity(
        &mut ctx.game,
        &mut ctx.log,
        missile,
        Vec3::new(20.0, 10.0, 4.0),
        MoveEntityFlags::SWEEP_COLLIDE | MoveEntityFlags::SLIDING,
    );

    assert!(moved);
    let end = ctx.position(missile);
    assert!((end.x - 9.0).abs() < 1e-2, "ended at {:?}", end);
    assert!((end.y - 4.5).abs() < 1e-3, "missiles stop at the wall, ended at {:?}", end);
    assert_eq!(end.z, 4.0);
    assert_eq!(ctx.log.collisions_for(missile), vec![None]);
}

#[test]
fn mover_pressed_against_wall_is_nudged_off_it() {
    let mut ctx = setup_test_world();
    ctx.add_wall(Wall::new(1, 10.0, -50.0, 2.0, 100.0));
    let a = ctx.spawn(Vec3::new(9.0, 0.0, 0.0), true);

    ctx.push(a, Vec3::new(5.0, 0.0, 0.0));
    let stats = ctx.tick();

    assert_eq!(stats.entities_moved, 1);
    let nudge = PhysicsConfig::default().wall_slide_nudge;
    assert!((ctx.position(a).x - (9.0 - nudge)).abs() < 1e-4, "ended at {:?}", ctx.position(a));
    assert_eq!(ctx.log.collisions_for(a), vec![None]);
    assert!(ctx.game.entities.get(a).unwrap().locomotion.unwrap().movement_impeded);
}

#[test]
fn movement_authoritative_entity_syncs_only_its_owner() {
    let mut ctx = setup_test_world();
    let owned = ctx.spawn(Vec3::ZERO, true);
    let other = ctx.spawn(Vec3::new(1.0, 0.0, 0.0), true);
    if let Some(entity) = ctx.game.entities.get_mut(owned) {
        entity.movement_authoritative = true;
    }

    // No external force: the second tick moves both sides only by repulsion.
    ctx.physics.register_entity_for_pending_physics_resolve(&mut ctx.game, owned);
    ctx.tick();
    ctx.tick();

    let owned_flags = ctx.log.last_position_flags(owned).expect("owner should have moved");
    assert!(owned_flags.contains(ChangePositionFlags::PHYSICS_RESOLVE));
    assert!(!owned_flags.contains(ChangePositionFlags::NO_SEND_TO_OWNER));
    assert!(owned_flags.contains(ChangePositionFlags::NO_SEND_TO_CLIENTS));

    let other_flags = ctx.log.last_position_flags(other).expect("partner should have moved");
    assert!(other_flags.contains(ChangePositionFlags::NO_SEND_TO_OWNER | ChangePositionFlags::NO_SEND_TO_CLIENTS));
}
