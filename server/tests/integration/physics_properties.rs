// massive_world_physics/server/tests/integration/physics_properties.rs

use massive_world_physics::core::config::PhysicsConfig;
use massive_world_physics::core::types::{CollisionId, EntityId, Orientation, RegionId, Vec3};
use massive_world_physics::entities::{CollisionProfile, Locomotion, WorldEntityPrototype};
use massive_world_physics::geometry::{Aabb, CollisionShape};
use massive_world_physics::systems::physics::{NotificationLog, PhysicsManager, ResolveOutcome, ResolveStats};
use massive_world_physics::world::{CollisionPairCache, Game};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

struct TestWorldContext {
    game: Game,
    physics: PhysicsManager,
    log: NotificationLog,
    region: RegionId,
    solid: Arc<WorldEntityPrototype>,
}

fn setup_test_world() -> TestWorldContext {
    let config = PhysicsConfig::default();
    let mut game = Game::new(&config);
    let region = game.create_region(Aabb::new(Vec3::new(-200.0, -200.0, -10.0), Vec3::new(200.0, 200.0, 10.0)));
    let solid = Arc::new(WorldEntityPrototype {
        collision: CollisionProfile::new(1, 1, 1),
        ..Default::default()
    });
    TestWorldContext { game, physics: PhysicsManager::new(config), log: NotificationLog::new(), region, solid }
}

impl TestWorldContext {
    fn spawn(&mut self, position: Vec3, mobile: bool) -> EntityId {
        let id = self.game.entities.create_entity(CollisionShape::Sphere { radius: 1.0 }, self.solid.clone());
        if mobile {
            if let Some(entity) = self.game.entities.get_mut(id) {
                entity.locomotion = Some(Locomotion::default());
            }
        }
        self.game
            .enter_world(id, self.region, position, Orientation::default())
            .expect("Failed to place test entity");
        id
    }

    fn tick(&mut self) -> ResolveStats {
        match self.physics.resolve_entities(&mut self.game, &mut self.log) {
            ResolveOutcome::Resolved(stats) => stats,
            ResolveOutcome::Skipped(reason) => panic!("Tick unexpectedly skipped: {:?}", reason),
        }
    }
}

proptest! {
    #[test]
    fn every_registered_entity_resolves_exactly_once(registrations in prop::collection::vec(0usize..8, 1..40)) {
        let mut ctx = setup_test_world();
        let ids: Vec<EntityId> = (0..8).map(|i| ctx.spawn(Vec3::new(i as f32 * 10.0, 0.0, 0.0), true)).collect();

        for index in &registrations {
            ctx.physics.register_entity_for_pending_physics_resolve(&mut ctx.game, ids[*index]);
        }
        let distinct: HashSet<usize> = registrations.iter().copied().collect();

        let stats = ctx.tick();
        prop_assert_eq!(stats.entities_resolved, distinct.len());
        prop_assert_eq!(ctx.tick().entities_resolved, 0);
    }

    #[test]
    fn sliding_never_increases_travel(
        blocker_x in -15.0f32..15.0,
        blocker_y in -15.0f32..15.0,
        move_x in -20.0f32..20.0,
        move_y in -20.0f32..20.0,
    ) {
        prop_assume!(Vec3::new(blocker_x, blocker_y, 0.0).length() > 2.2);
        let desired = Vec3::new(move_x, move_y, 0.0);
        prop_assume!(desired.length() > 0.1);

        let mut ctx = setup_test_world();
        let mover = ctx.spawn(Vec3::ZERO, true);
        let blocker = ctx.spawn(Vec3::new(blocker_x, blocker_y, 0.0), false);

        ctx.physics.apply_external_force(&mut ctx.game, mover, desired).unwrap();
        ctx.tick();

        let end = ctx.game.entities.get(mover).unwrap().position;
        let blocker_position = ctx.game.entities.get(blocker).unwrap().position;
        prop_assert!(end.length() <= desired.length() + 1e-3, "travelled {} for a move of {}", end.length(), desired.length());
        prop_assert!(end.distance(blocker_position) >= 2.0 - 1e-3);
    }

    #[test]
    fn nearest_blocker_along_the_path_stops_the_mover(near in 4.0f32..10.0, spacing in 2.5f32..10.0) {
        let far = near + spacing;
        let mut ctx = setup_test_world();
        let mover = ctx.spawn(Vec3::ZERO, true);
        let near_id = ctx.spawn(Vec3::new(near, 0.0, 0.0), false);
        let far_id = ctx.spawn(Vec3::new(far, 0.0, 0.0), false);

        ctx.physics.apply_external_force(&mut ctx.game, mover, Vec3::new(far + 5.0, 0.0, 0.0)).unwrap();
        ctx.tick();

        let end = ctx.game.entities.get(mover).unwrap().position;
        prop_assert!((end.x - (near - 2.0)).abs() < 1e-3);
        prop_assert_eq!(ctx.log.collisions_for(mover), vec![Some(near_id)]);
        prop_assert!(ctx.log.collisions_for(far_id).is_empty());
    }

    #[test]
    fn pair_cache_admits_each_unordered_pair_once(pairs in prop::collection::vec((0i32..12, 0i32..12), 1..64)) {
        let mut cache = CollisionPairCache::new();
        let mut seen: HashSet<(CollisionId, CollisionId)> = HashSet::new();
        for (a, b) in pairs {
            let first_time = seen.insert((a.min(b), a.max(b)));
            prop_assert_eq!(cache.collide_entities(a, b), first_time);
            prop_assert!(!cache.collide_entities(b, a));
        }
        prop_assert_eq!(cache.len(), seen.len());
    }
}
