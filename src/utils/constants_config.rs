// src/utils/constants_config.rs
use crate::engine::DebugDrawFlags;
use crate::interactions::BroadphaseStrategy;
use crate::models::Vector3;
use crate::utils::{
    errors::PhysicsError,
    DEFAULT_DAMPING, DEFAULT_GRAVITY, DEFAULT_MAX_UPDATES_PER_FRAME, DEFAULT_OCTREE_CONFIG,
    DEFAULT_REST_CONFIG, DEFAULT_SOLVER_CONFIG, DEFAULT_TIMESTEP,
};

fn ensure(condition: bool, message: &str) -> Result<(), PhysicsError> {
    if condition {
        Ok(())
    } else {
        Err(PhysicsError::InvalidConfiguration(message.to_string()))
    }
}

/// Tunables of the sequential impulse solver.
///
/// These values materially change stiffness and stability of contacts, so they are
/// exposed rather than baked into the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Number of impulse passes over every manifold and constraint per tick.
    pub iterations: usize,
    /// Fraction of the penetration error corrected per second (scaled by `1/dt`).
    pub baumgarte_scalar: f64,
    /// Penetration allowed before positional correction starts.
    pub baumgarte_slop: f64,
    /// Approach speeds below this produce no bounce.
    pub elasticity_slop: f64,
    /// Weight of the Baumgarte bias when combined with the elasticity term.
    pub elasticity_bias_blend: f64,
    /// Tangential speeds below this skip friction.
    pub friction_epsilon: f64,
    /// Positional correction factor for distance constraints.
    pub distance_baumgarte_scalar: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        DEFAULT_SOLVER_CONFIG
    }
}

impl SolverConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_baumgarte(mut self, scalar: f64, slop: f64) -> Self {
        self.baumgarte_scalar = scalar;
        self.baumgarte_slop = slop;
        self
    }

    pub fn with_elasticity_slop(mut self, slop: f64) -> Self {
        self.elasticity_slop = slop;
        self
    }

    pub fn with_friction_epsilon(mut self, epsilon: f64) -> Self {
        self.friction_epsilon = epsilon;
        self
    }

    pub fn with_distance_baumgarte(mut self, scalar: f64) -> Self {
        self.distance_baumgarte_scalar = scalar;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        ensure(self.iterations > 0, "solver iterations must be at least 1")?;
        ensure(self.baumgarte_scalar >= 0.0 && self.baumgarte_scalar.is_finite(), "baumgarte scalar must be finite and non-negative")?;
        ensure(self.baumgarte_slop >= 0.0 && self.baumgarte_slop.is_finite(), "baumgarte slop must be finite and non-negative")?;
        ensure(self.elasticity_slop >= 0.0 && self.elasticity_slop.is_finite(), "elasticity slop must be finite and non-negative")?;
        ensure((0.0..=1.0).contains(&self.elasticity_bias_blend), "elasticity bias blend must lie in [0, 1]")?;
        ensure(self.friction_epsilon > 0.0 && self.friction_epsilon.is_finite(), "friction epsilon must be positive")?;
        ensure(self.distance_baumgarte_scalar >= 0.0 && self.distance_baumgarte_scalar.is_finite(), "distance baumgarte scalar must be finite and non-negative")
    }
}

/// Thresholds used to classify bodies as resting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestConfig {
    pub linear_threshold: f64,
    pub angular_threshold: f64,
    /// Seconds a resting body may stay asleep before it is woken and re-validated.
    pub recheck_interval: f64,
}

impl Default for RestConfig {
    fn default() -> Self {
        DEFAULT_REST_CONFIG
    }
}

impl RestConfig {
    pub fn with_thresholds(mut self, linear: f64, angular: f64) -> Self {
        self.linear_threshold = linear;
        self.angular_threshold = angular;
        self
    }

    pub fn with_recheck_interval(mut self, seconds: f64) -> Self {
        self.recheck_interval = seconds;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        ensure(self.linear_threshold >= 0.0 && self.linear_threshold.is_finite(), "linear rest threshold must be finite and non-negative")?;
        ensure(self.angular_threshold >= 0.0 && self.angular_threshold.is_finite(), "angular rest threshold must be finite and non-negative")?;
        ensure(self.recheck_interval > 0.0, "rest re-check interval must be positive")
    }
}

/// Shape of the octree rebuilt every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    pub world_min: Vector3,
    pub world_max: Vector3,
    /// A node holding more bodies than this is subdivided.
    pub max_objects: usize,
    /// Nodes smaller than this along every axis are never subdivided.
    pub min_size: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        DEFAULT_OCTREE_CONFIG
    }
}

impl OctreeConfig {
    pub fn with_bounds(mut self, world_min: Vector3, world_max: Vector3) -> Self {
        self.world_min = world_min;
        self.world_max = world_max;
        self
    }

    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    pub fn with_min_size(mut self, min_size: f64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        ensure(
            self.world_min.x < self.world_max.x && self.world_min.y < self.world_max.y && self.world_min.z < self.world_max.z,
            "octree world box must have positive extent on every axis",
        )?;
        ensure(self.max_objects > 0, "octree max objects must be at least 1")?;
        ensure(self.min_size > 0.0 && self.min_size.is_finite(), "octree min size must be positive")
    }
}

/// Top-level configuration of a [`PhysicsEngine`](crate::engine::PhysicsEngine).
///
/// # Example
/// ```
/// use rs_rigid::utils::EngineConfig;
/// use rs_rigid::models::Vector3;
///
/// let config = EngineConfig::default()
///     .with_gravity(Vector3::new(0.0, -1.62, 0.0))
///     .with_solver_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub timestep: f64,
    pub gravity: Vector3,
    pub damping: f64,
    /// Physics ticks run at most per `advance` call before the remainder is dropped.
    pub max_updates_per_frame: usize,
    pub broadphase: BroadphaseStrategy,
    pub sphere_culling: bool,
    /// Seed for the per-tick solver shuffle. `None` draws one at construction.
    pub solver_seed: Option<u64>,
    pub debug_flags: DebugDrawFlags,
    pub solver: SolverConfig,
    pub rest: RestConfig,
    pub octree: OctreeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIMESTEP,
            gravity: DEFAULT_GRAVITY,
            damping: DEFAULT_DAMPING,
            max_updates_per_frame: DEFAULT_MAX_UPDATES_PER_FRAME,
            broadphase: BroadphaseStrategy::Octree,
            sphere_culling: true,
            solver_seed: None,
            debug_flags: DebugDrawFlags::default(),
            solver: SolverConfig::default(),
            rest: RestConfig::default(),
            octree: OctreeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(
        timestep: Option<f64>,
        gravity: Option<Vector3>,
        damping: Option<f64>,
    ) -> Self {
        let default = Self::default();
        Self {
            timestep: timestep.unwrap_or(default.timestep),
            gravity: gravity.unwrap_or(default.gravity),
            damping: damping.unwrap_or(default.damping),
            ..default
        }
    }

    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_max_updates_per_frame(mut self, max_updates: usize) -> Self {
        self.max_updates_per_frame = max_updates;
        self
    }

    pub fn with_broadphase(mut self, strategy: BroadphaseStrategy) -> Self {
        self.broadphase = strategy;
        self
    }

    pub fn with_sphere_culling(mut self, enabled: bool) -> Self {
        self.sphere_culling = enabled;
        self
    }

    pub fn with_solver_seed(mut self, seed: u64) -> Self {
        self.solver_seed = Some(seed);
        self
    }

    pub fn with_debug_flags(mut self, flags: DebugDrawFlags) -> Self {
        self.debug_flags = flags;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_rest(mut self, rest: RestConfig) -> Self {
        self.rest = rest;
        self
    }

    pub fn with_octree(mut self, octree: OctreeConfig) -> Self {
        self.octree = octree;
        self
    }

    /// Checks every value against its allowed range.
    ///
    /// # Returns
    /// `Err(PhysicsError::InvalidTimestep)` for a non-positive timestep, otherwise
    /// `Err(PhysicsError::InvalidConfiguration)` naming the first offending value.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(PhysicsError::InvalidTimestep);
        }
        ensure(
            self.gravity.x.is_finite() && self.gravity.y.is_finite() && self.gravity.z.is_finite(),
            "gravity must be finite",
        )?;
        ensure((0.0..=1.0).contains(&self.damping), "damping must lie in [0, 1]")?;
        ensure(self.max_updates_per_frame > 0, "at least one update per frame is required")?;
        self.solver.validate()?;
        self.rest.validate()?;
        self.octree.validate()
    }
}
