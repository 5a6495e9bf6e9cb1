// demos/falling_stack.rs
//
// Drops a stack of boxes and a few balls onto the ground and prints where they end up.
// Run with `RUST_LOG=debug` to see the per-tick counters.

use rs_rigid::engine::{PhysicsEngine, PhysicsEvent};
use rs_rigid::models::{CuboidShape, OwnerId, RigidBody, SphereShape, Vector3};
use rs_rigid::utils::{EngineConfig, PhysicsError};

fn main() -> Result<(), PhysicsError> {
    env_logger::init();

    let mut engine = PhysicsEngine::new(EngineConfig::default().with_max_updates_per_frame(3))?;
    engine.add_body(
        RigidBody::new()
            .with_shape(Box::new(CuboidShape::new(Vector3::new(10.0, 0.5, 10.0))))?
            .with_owner(OwnerId(0)),
    );

    let mut handles = Vec::new();
    for i in 0..4 {
        let body = RigidBody::new()
            .with_position(Vector3::new(0.0, 1.0 + i as f64 * 1.05, 0.0))
            .with_mass(1.0)?
            .with_shape(Box::new(CuboidShape::cube(0.5)))?
            .with_elasticity(0.1)?
            .with_owner(OwnerId(i + 1));
        handles.push(engine.add_body(body));
    }
    for i in 0..3 {
        let body = RigidBody::new()
            .with_position(Vector3::new(2.0 + i as f64, 4.0, 0.5))
            .with_mass(0.5)?
            .with_shape(Box::new(SphereShape::new(0.4)))?
            .with_owner(OwnerId(10 + i));
        handles.push(engine.add_body(body));
    }

    // Five seconds at a 30 fps render rate.
    let frame = 1.0 / 30.0;
    let mut collisions = 0;
    for _ in 0..150 {
        let report = engine.advance(frame);
        if report.too_slow {
            println!("frame dropped simulation time");
        }
        collisions += engine
            .drain_events()
            .iter()
            .filter(|event| matches!(event, PhysicsEvent::Collision { accepted: true, .. }))
            .count();
    }

    println!("{} ticks, {} accepted collisions", engine.tick_count(), collisions);
    for handle in handles {
        if let Some(body) = engine.body(handle) {
            println!(
                "{:?}: position={:?}, at rest={}",
                body.owner(),
                body.position(),
                body.is_at_rest()
            );
        }
    }
    let stats = engine.stats();
    println!(
        "last tick: {} pairs, {} manifolds, {} contacts, solver {:?}",
        stats.candidate_pairs, stats.manifolds, stats.contacts, stats.solver_time
    );
    Ok(())
}
