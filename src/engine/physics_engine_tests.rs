use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use approx::assert_abs_diff_eq;
use crate::assert_float_eq;
use crate::constraints::{Constraint, DistanceConstraint};
use crate::engine::{DebugDrawFlags, PhysicsEngine, PhysicsEvent};
use crate::interactions::BroadphaseStrategy;
use crate::models::{BodyHandle, CuboidShape, OwnerId, RigidBody, SphereShape, Vector3};
use crate::utils::{EngineConfig, PhysicsError, DEFAULT_GRAVITY, DEFAULT_TIMESTEP};

fn weightless() -> EngineConfig {
    EngineConfig::default()
        .with_gravity(Vector3::ZERO)
        .with_damping(1.0)
        .with_solver_seed(7)
}

fn ball(position: Vector3, velocity: Vector3) -> RigidBody {
    RigidBody::new()
        .with_position(position)
        .with_linear_velocity(velocity)
        .with_mass(1.0)
        .unwrap()
        .with_shape(Box::new(SphereShape::new(0.5)))
        .unwrap()
        .with_elasticity(1.0)
        .unwrap()
        .with_friction(0.0)
        .unwrap()
}

fn ground() -> RigidBody {
    RigidBody::new().with_shape(Box::new(CuboidShape::new(Vector3::new(10.0, 0.5, 10.0)))).unwrap()
}

fn crate_box(position: Vector3) -> RigidBody {
    RigidBody::new()
        .with_position(position)
        .with_mass(1.0)
        .unwrap()
        .with_shape(Box::new(CuboidShape::cube(0.5)))
        .unwrap()
        .with_elasticity(0.0)
        .unwrap()
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = PhysicsEngine::new(EngineConfig::default().with_timestep(0.0));
    assert_eq!(result.err(), Some(PhysicsError::InvalidTimestep));

    let result = PhysicsEngine::new(EngineConfig::default().with_damping(1.5));
    assert!(matches!(result, Err(PhysicsError::InvalidConfiguration(_))));
}

#[test]
fn test_accumulator_runs_whole_ticks_only() {
    let mut engine = PhysicsEngine::default();

    let report = engine.advance(DEFAULT_TIMESTEP * 0.5);
    assert_eq!(report.ticks_run, 0);
    assert!(!report.too_slow);
    assert_float_eq(engine.accumulator(), DEFAULT_TIMESTEP * 0.5, 1e-12, None);

    let report = engine.advance(DEFAULT_TIMESTEP * 0.6);
    assert_eq!(report.ticks_run, 1);
    assert_eq!(engine.tick_count(), 1);
    assert_float_eq(engine.accumulator(), DEFAULT_TIMESTEP * 0.1, 1e-12, None);
}

#[test]
fn test_slow_frames_drop_the_backlog() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = PhysicsEngine::default();

    for _ in 0..5 {
        let report = engine.advance(1.0);
        assert_eq!(report.ticks_run, 1);
        assert!(report.too_slow);
        assert!(engine.accumulator() < engine.timestep());
    }
    assert_eq!(engine.tick_count(), 5);
}

#[test]
fn test_max_updates_per_frame_allows_catch_up() {
    let config = EngineConfig::default().with_max_updates_per_frame(4);
    let mut engine = PhysicsEngine::new(config).unwrap();

    let report = engine.advance(DEFAULT_TIMESTEP * 3.5);
    assert_eq!(report.ticks_run, 3);
    assert!(!report.too_slow);
}

#[test]
fn test_non_finite_or_negative_time_is_ignored() {
    let mut engine = PhysicsEngine::default();
    engine.advance(-1.0);
    engine.advance(f64::NAN);
    engine.advance(f64::INFINITY);
    assert_eq!(engine.accumulator(), 0.0);
    assert_eq!(engine.tick_count(), 0);
}

#[test]
fn test_pause_stops_ticks_but_not_rest_timers() {
    let mut engine = PhysicsEngine::default();
    let body = engine.add_body(RigidBody::new().with_mass(1.0).unwrap());

    engine.pause();
    assert!(engine.is_paused());
    let report = engine.advance(0.5);
    assert_eq!(report.ticks_run, 0);
    assert_eq!(engine.tick_count(), 0);
    assert_eq!(engine.body(body).unwrap().position(), Vector3::ZERO);
    assert_float_eq(engine.body(body).unwrap().time_since_rest_check(), 0.5, 1e-12, None);

    engine.resume();
    assert_eq!(engine.advance(DEFAULT_TIMESTEP).ticks_run, 1);
}

#[test]
fn test_free_body_falls_and_reports_its_transform() {
    let mut engine = PhysicsEngine::default();
    let body = engine.add_body(
        RigidBody::new()
            .with_mass(2.0)
            .unwrap()
            .with_position(Vector3::new(0.0, 10.0, 0.0))
            .with_owner(OwnerId(7)),
    );

    engine.step();

    let velocity = engine.body(body).unwrap().linear_velocity();
    assert_float_eq(velocity.y, DEFAULT_GRAVITY.y * DEFAULT_TIMESTEP * engine.damping(), 1e-12, None);
    let position = engine.body(body).unwrap().position();
    assert!(position.y < 10.0);

    let events = engine.drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        PhysicsEvent::TransformUpdated { body: handle, owner, transform } => {
            assert_eq!(*handle, body);
            assert_eq!(*owner, Some(OwnerId(7)));
            assert_eq!(transform.position, position);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_static_bodies_never_move() {
    let mut engine = PhysicsEngine::default();
    let floor = engine.add_body(ground());
    for _ in 0..30 {
        engine.step();
    }
    assert_eq!(engine.body(floor).unwrap().position(), Vector3::ZERO);
    assert_eq!(engine.body(floor).unwrap().linear_velocity(), Vector3::ZERO);
}

#[test]
fn test_elastic_spheres_swap_velocities() {
    for strategy in [BroadphaseStrategy::BruteForce, BroadphaseStrategy::Octree] {
        let mut engine = PhysicsEngine::new(weightless().with_broadphase(strategy)).unwrap();
        let a = engine.add_body(ball(Vector3::new(-0.5, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)));
        let b = engine.add_body(ball(Vector3::new(0.5, 0.0, 0.0), Vector3::new(-2.0, 0.0, 0.0)));

        engine.step();

        assert_eq!(engine.manifolds().len(), 1);
        let va = engine.body(a).unwrap().linear_velocity();
        let vb = engine.body(b).unwrap().linear_velocity();
        assert_abs_diff_eq!(va, Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(vb, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(va + vb, Vector3::ZERO, epsilon = 1e-12);
    }
}

#[test]
fn test_manifolds_are_rebuilt_every_tick() {
    let mut engine = PhysicsEngine::new(weightless()).unwrap();
    let a = engine.add_body(RigidBody::new().with_shape(Box::new(SphereShape::new(0.5))).unwrap());
    let b = engine.add_body(
        RigidBody::new()
            .with_position(Vector3::new(0.8, 0.0, 0.0))
            .with_shape(Box::new(SphereShape::new(0.5)))
            .unwrap(),
    );

    engine.step();
    assert_eq!(engine.manifolds().len(), 1);
    let first = engine.manifolds()[0].id();

    engine.step();
    assert_eq!(engine.manifolds().len(), 1);
    assert_ne!(engine.manifolds()[0].id(), first);

    // Two static bodies overlap but neither is pushed.
    assert_eq!(engine.body(a).unwrap().position(), Vector3::ZERO);
    assert_eq!(engine.body(b).unwrap().position(), Vector3::new(0.8, 0.0, 0.0));
}

#[test]
fn test_box_settles_on_ground_and_rests() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = PhysicsEngine::new(EngineConfig::default().with_solver_seed(3)).unwrap();
    engine.add_body(ground());
    let cube = engine.add_body(crate_box(Vector3::new(0.0, 0.999, 0.0)));

    let mut rested_at = None;
    for tick in 0..300 {
        engine.step();
        if engine.body(cube).unwrap().is_at_rest() {
            rested_at = Some(tick);
            break;
        }
    }

    assert!(rested_at.is_some(), "box never came to rest");
    let position = engine.body(cube).unwrap().position();
    assert!(position.y > 0.95 && position.y < 1.05, "box ended at {:?}", position);
    assert!(position.x.abs() < 0.05 && position.z.abs() < 0.05);

    // Both bodies asleep: the pair is culled and the box stays put.
    engine.step();
    engine.step();
    assert!(engine.broadphase_pairs().is_empty());
    assert_eq!(engine.body(cube).unwrap().position(), position);
}

#[test]
fn test_dropped_stack_comes_to_rest() {
    let mut engine = PhysicsEngine::new(EngineConfig::default().with_solver_seed(1)).unwrap();
    engine.add_body(ground());
    let stack: Vec<BodyHandle> = [1.5, 2.7, 3.9]
        .iter()
        .map(|y| engine.add_body(crate_box(Vector3::new(0.0, *y, 0.0))))
        .collect();

    let mut lowest_bottom = f64::MAX;
    let mut rested_at = None;
    for tick in 0..1800 {
        engine.step();
        lowest_bottom = lowest_bottom.min(engine.body(stack[0]).unwrap().position().y);
        if stack.iter().all(|handle| engine.body(*handle).unwrap().is_at_rest()) {
            rested_at = Some(tick);
            break;
        }
    }

    assert!(rested_at.is_some(), "stack never came to rest");
    // The bottom box never sinks far into the ground, even on impact.
    assert!(lowest_bottom > 0.95, "bottom box sank to {}", lowest_bottom);
    for (level, handle) in stack.iter().enumerate() {
        let y = engine.body(*handle).unwrap().position().y;
        assert!((y - (1.0 + level as f64)).abs() < 0.05, "box {} rests at {}", level, y);
    }
}

#[test]
fn test_same_seed_gives_identical_runs() {
    let run = || {
        let mut engine = PhysicsEngine::new(EngineConfig::default().with_solver_seed(42)).unwrap();
        engine.add_body(ground());
        let boxes: Vec<BodyHandle> = (0..3)
            .map(|i| engine.add_body(crate_box(Vector3::new(0.1 * i as f64, 1.2 + 1.1 * i as f64, 0.0))))
            .collect();
        for _ in 0..90 {
            engine.step();
        }
        boxes
            .iter()
            .map(|handle| engine.body(*handle).unwrap().position())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_vetoed_collision_generates_no_manifold() {
    let asked_a = Arc::new(AtomicUsize::new(0));
    let asked_b = Arc::new(AtomicUsize::new(0));
    let (count_a, count_b) = (Arc::clone(&asked_a), Arc::clone(&asked_b));

    let mut engine = PhysicsEngine::new(weightless()).unwrap();
    let a = engine.add_body(
        ball(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)).with_collision_response(Box::new(
            move |_: BodyHandle, _: BodyHandle, _: &RigidBody| {
                count_a.fetch_add(1, Ordering::SeqCst);
                false
            },
        )),
    );
    let b = engine.add_body(
        ball(Vector3::new(0.8, 0.0, 0.0), Vector3::ZERO).with_collision_response(Box::new(
            move |_: BodyHandle, _: BodyHandle, _: &RigidBody| {
                count_b.fetch_add(1, Ordering::SeqCst);
                true
            },
        )),
    );

    engine.step();

    assert!(engine.manifolds().is_empty());
    assert_eq!(asked_a.load(Ordering::SeqCst), 1);
    assert_eq!(asked_b.load(Ordering::SeqCst), 1);
    assert_abs_diff_eq!(engine.body(a).unwrap().linear_velocity(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);

    let collisions: Vec<PhysicsEvent> = engine
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, PhysicsEvent::Collision { .. }))
        .collect();
    assert_eq!(collisions.len(), 1);
    match collisions[0] {
        PhysicsEvent::Collision { body_a, body_b, accepted } => {
            assert!(!accepted);
            assert!(body_a == a || body_a == b);
            assert!(body_b == a || body_b == b);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_same_group_never_collides() {
    let mut engine = PhysicsEngine::new(weightless()).unwrap();
    engine.add_body(ball(Vector3::ZERO, Vector3::ZERO).with_group(2));
    engine.add_body(ball(Vector3::new(0.5, 0.0, 0.0), Vector3::ZERO).with_group(2));
    engine.add_body(ball(Vector3::new(-0.5, 0.0, 0.0), Vector3::ZERO).with_group(3));

    engine.step();

    // Only the cross-group pairs remain.
    assert_eq!(engine.broadphase_pairs().len(), 2);
}

#[test]
fn test_stats_count_each_stage() {
    let config = weightless().with_broadphase(BroadphaseStrategy::BruteForce);
    let mut engine = PhysicsEngine::new(config).unwrap();
    for i in 0..3 {
        engine.add_body(ball(Vector3::new(5.0 * i as f64, 0.0, 0.0), Vector3::ZERO));
    }

    engine.step();
    let stats = *engine.stats();
    assert_eq!(stats.sphere_checks, 3);
    assert_eq!(stats.candidate_pairs, 0);
    assert_eq!(stats.narrowphase_checks, 0);
    assert_eq!(stats.manifolds, 0);

    assert!(!engine.toggle_sphere_culling());
    engine.step();
    let stats = *engine.stats();
    assert_eq!(stats.sphere_checks, 0);
    assert_eq!(stats.candidate_pairs, 3);
    assert_eq!(stats.narrowphase_checks, 3);
    assert_eq!(stats.contacts, 0);
}

#[test]
fn test_octree_regions_follow_strategy() {
    let mut engine = PhysicsEngine::new(weightless()).unwrap();
    for i in 0..10 {
        engine.add_body(ball(Vector3::new(i as f64 * 1.5 - 7.0, 0.0, 0.0), Vector3::ZERO));
    }

    engine.step();
    assert!(!engine.octree_regions().is_empty());

    assert_eq!(engine.toggle_broadphase_strategy(), BroadphaseStrategy::BruteForce);
    engine.step();
    assert!(engine.octree_regions().is_empty());
}

#[test]
fn test_remove_body_drops_attached_constraints() {
    let mut engine = PhysicsEngine::default();
    let anchor = engine.add_body(RigidBody::new());
    let bob = engine.add_body(
        RigidBody::new()
            .with_mass(1.0)
            .unwrap()
            .with_position(Vector3::new(0.0, -2.0, 0.0))
            .with_owner(OwnerId(11)),
    );
    let rod = DistanceConstraint::new(engine.bodies(), anchor, bob, Vector3::ZERO, Vector3::new(0.0, -2.0, 0.0)).unwrap();
    let handle = engine.add_constraint(rod).unwrap();
    assert!(matches!(engine.constraint(handle), Some(Constraint::Distance(_))));

    let removed = engine.remove_body(bob).unwrap();
    assert_eq!(removed.owner(), Some(OwnerId(11)));
    assert!(engine.constraint(handle).is_none());
    assert_eq!(engine.constraints().count(), 0);
    assert!(engine
        .drain_events()
        .contains(&PhysicsEvent::BodyRemoved { body: bob, owner: Some(OwnerId(11)) }));

    assert_eq!(engine.remove_body(bob).err(), Some(PhysicsError::InvalidBodyHandle));
    assert_eq!(engine.remove_constraint(handle).err(), Some(PhysicsError::InvalidConstraintHandle));
}

#[test]
fn test_constraint_on_removed_body_is_rejected() {
    let mut engine = PhysicsEngine::default();
    let a = engine.add_body(RigidBody::new());
    let b = engine.add_body(RigidBody::new().with_mass(1.0).unwrap().with_position(Vector3::X));
    let rod = DistanceConstraint::new(engine.bodies(), a, b, Vector3::ZERO, Vector3::X).unwrap();

    engine.remove_body(b).unwrap();
    assert_eq!(engine.add_constraint(rod).err(), Some(PhysicsError::InvalidBodyHandle));
}

#[test]
fn test_pendulum_through_engine_keeps_length() {
    let mut engine = PhysicsEngine::new(EngineConfig::default().with_damping(1.0).with_solver_seed(1)).unwrap();
    let anchor = engine.add_body(RigidBody::new());
    let bob = engine.add_body(RigidBody::new().with_mass(1.0).unwrap().with_position(Vector3::new(2.0, 0.0, 0.0)));
    let rod = DistanceConstraint::new(engine.bodies(), anchor, bob, Vector3::ZERO, Vector3::new(2.0, 0.0, 0.0)).unwrap();
    engine.add_constraint(rod).unwrap();

    for _ in 0..120 {
        engine.step();
        let length = engine.body(bob).unwrap().position().length();
        assert!((length - 2.0).abs() < 0.1, "rod stretched to {}", length);
    }
}

#[test]
fn test_remove_all_bodies_empties_the_world() {
    let mut engine = PhysicsEngine::default();
    let a = engine.add_body(ground());
    let b = engine.add_body(crate_box(Vector3::new(0.0, 1.0, 0.0)));
    let rod = DistanceConstraint::new(engine.bodies(), a, b, Vector3::ZERO, Vector3::ZERO).unwrap();
    engine.add_constraint(rod).unwrap();
    engine.step();

    engine.remove_all_bodies();

    assert!(engine.bodies().is_empty());
    assert_eq!(engine.constraints().count(), 0);
    assert!(engine.manifolds().is_empty());
    let removed = engine
        .drain_events()
        .iter()
        .filter(|event| matches!(event, PhysicsEvent::BodyRemoved { .. }))
        .count();
    assert_eq!(removed, 2);
}

#[test]
fn test_settings_round_trip_and_reset() {
    let mut engine = PhysicsEngine::default();

    engine.set_gravity(Vector3::new(0.0, -1.0, 0.0));
    engine.set_damping(0.5);
    engine.set_timestep(0.01).unwrap();
    assert_eq!(engine.set_timestep(-0.01).err(), Some(PhysicsError::InvalidTimestep));
    assert_eq!(engine.gravity(), Vector3::new(0.0, -1.0, 0.0));
    assert_eq!(engine.damping(), 0.5);
    assert_eq!(engine.timestep(), 0.01);

    engine.reset_defaults();
    assert_eq!(engine.gravity(), DEFAULT_GRAVITY);
    assert_eq!(engine.timestep(), DEFAULT_TIMESTEP);

    assert_eq!(engine.debug_flags(), DebugDrawFlags::default());
    engine.toggle_debug_flags(DebugDrawFlags::MANIFOLD | DebugDrawFlags::BOUNDING_RADIUS);
    assert!(!engine.debug_flags().contains(DebugDrawFlags::MANIFOLD));
    assert!(engine.debug_flags().contains(DebugDrawFlags::BOUNDING_RADIUS));
    engine.set_debug_flags(DebugDrawFlags::NONE);
    assert!(engine.debug_flags().is_empty());

    engine.set_broadphase_strategy(BroadphaseStrategy::BruteForce);
    assert_eq!(engine.broadphase_strategy(), BroadphaseStrategy::BruteForce);
    engine.set_sphere_culling(false);
    assert!(!engine.sphere_culling());
}

#[test]
fn test_undrained_events_hold_one_frame_only() {
    let mut engine = PhysicsEngine::default();
    engine.add_body(RigidBody::new().with_mass(1.0).unwrap());

    for _ in 0..1000 {
        engine.advance(DEFAULT_TIMESTEP);
    }

    let events = engine.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], PhysicsEvent::TransformUpdated { .. }));
}

#[test]
fn test_invalid_shape_is_rejected() {
    let result = RigidBody::new().with_shape(Box::new(SphereShape::new(0.0)));
    assert!(matches!(result, Err(PhysicsError::InvalidShape(_))));

    let result = RigidBody::new().with_shape(Box::new(CuboidShape::new(Vector3::new(1.0, -1.0, 1.0))));
    assert!(matches!(result, Err(PhysicsError::InvalidShape(_))));
}
