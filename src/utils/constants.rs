use crate::models::Vector3;
use crate::utils::{OctreeConfig, RestConfig, SolverConfig};

/// Number of recent speed samples kept per body to classify its rest state.
pub const REST_HISTORY_FRAMES: usize = 10;

/// Speed written into the history of a body that has just been created or woken,
/// guaranteeing it is not classified as resting for the next `REST_HISTORY_FRAMES` ticks.
pub const MOVING_SENTINEL_SPEED: f64 = 10.0;

pub const DEFAULT_TIMESTEP: f64 = 1.0 / 60.0;
pub const DEFAULT_GRAVITY: Vector3 = Vector3 { x: 0.0, y: -9.81, z: 0.0 };
pub const DEFAULT_DAMPING: f64 = 0.999;
pub const DEFAULT_MAX_UPDATES_PER_FRAME: usize = 1;

pub const DEFAULT_SOLVER_CONFIG: SolverConfig = SolverConfig {
    iterations: 50,
    baumgarte_scalar: 0.3,
    baumgarte_slop: 0.001,
    elasticity_slop: 0.2,
    elasticity_bias_blend: 0.2,
    friction_epsilon: 0.001,
    distance_baumgarte_scalar: 0.1,
};

pub const DEFAULT_REST_CONFIG: RestConfig = RestConfig {
    linear_threshold: 0.05,
    angular_threshold: 0.01,
    recheck_interval: 2.0,
};

pub const DEFAULT_OCTREE_CONFIG: OctreeConfig = OctreeConfig {
    world_min: Vector3 { x: -16.0, y: -16.0, z: -16.0 },
    world_max: Vector3 { x: 16.0, y: 16.0, z: 16.0 },
    max_objects: 5,
    min_size: 1.0,
};
