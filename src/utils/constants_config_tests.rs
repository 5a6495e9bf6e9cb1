use crate::models::Vector3;
use crate::utils::{EngineConfig, OctreeConfig, PhysicsError, RestConfig, SolverConfig, DEFAULT_TIMESTEP};

#[test]
fn test_default_engine_config_is_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.timestep, DEFAULT_TIMESTEP);
    assert_eq!(config.gravity, Vector3::new(0.0, -9.81, 0.0));
    assert_eq!(config.damping, 0.999);
    assert_eq!(config.max_updates_per_frame, 1);
    assert_eq!(config.solver.iterations, 50);
    assert_eq!(config.rest.linear_threshold, 0.05);
    assert_eq!(config.octree.max_objects, 5);
}

#[test]
fn test_new_falls_back_to_defaults() {
    let config = EngineConfig::new(Some(0.01), None, Some(1.0));
    assert_eq!(config.timestep, 0.01);
    assert_eq!(config.gravity, EngineConfig::default().gravity);
    assert_eq!(config.damping, 1.0);
}

#[test]
fn test_non_positive_timestep_is_rejected() {
    let config = EngineConfig::default().with_timestep(-1.0 / 60.0);
    assert_eq!(config.validate(), Err(PhysicsError::InvalidTimestep));

    let config = EngineConfig::default().with_timestep(0.0);
    assert_eq!(config.validate(), Err(PhysicsError::InvalidTimestep));
}

#[test]
fn test_nested_configs_are_validated() {
    let config = EngineConfig::default().with_solver(SolverConfig::default().with_iterations(0));
    assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfiguration(_))));

    let config = EngineConfig::default().with_rest(RestConfig::default().with_recheck_interval(0.0));
    assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfiguration(_))));

    let inverted = OctreeConfig::default().with_bounds(Vector3::new(1.0, 1.0, 1.0), Vector3::new(-1.0, 2.0, 2.0));
    let config = EngineConfig::default().with_octree(inverted);
    assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfiguration(_))));
}

#[test]
fn test_damping_outside_unit_range_is_rejected() {
    let config = EngineConfig::default().with_damping(1.5);
    assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfiguration(_))));
}
