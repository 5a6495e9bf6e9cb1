// src/engine/physics_engine.rs
use std::time::Instant;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thunderdome as td;
use crate::constraints::{Constraint, ConstraintHandle, Manifold};
use crate::engine::{DebugDrawFlags, PhysicsEvent, PhysicsStats, StepReport};
use crate::interactions::{
    brute_force_pairs, cull_pairs, detect_collision, generate_contacts, Aabb, BroadphaseStrategy,
    CandidatePair, Octree,
};
use crate::models::{BodyHandle, BodySet, RigidBody, Vector3};
use crate::utils::{EngineConfig, PhysicsError, DEFAULT_DAMPING, DEFAULT_GRAVITY, DEFAULT_TIMESTEP};

/// Anything the sequential impulse solver visits once per iteration.
enum SolverItem<'a> {
    Contact(&'a mut Manifold),
    Joint(&'a mut Constraint),
}

/// Owns every body, constraint and manifold of a simulation and steps it with a
/// fixed timestep.
///
/// Each tick runs, in order: discard the previous manifolds, broadphase, narrowphase,
/// presolve, velocity integration, the impulse solver and position integration.
///
/// # Example
/// ```
/// use rs_rigid::engine::PhysicsEngine;
/// use rs_rigid::models::{CuboidShape, RigidBody, SphereShape, Vector3};
/// use rs_rigid::utils::EngineConfig;
///
/// let mut engine = PhysicsEngine::new(EngineConfig::default()).unwrap();
/// engine.add_body(RigidBody::new().with_shape(Box::new(CuboidShape::new(Vector3::new(10.0, 0.5, 10.0)))).unwrap());
/// let ball = engine.add_body(
///     RigidBody::new()
///         .with_position(Vector3::new(0.0, 3.0, 0.0))
///         .with_mass(1.0).unwrap()
///         .with_shape(Box::new(SphereShape::new(0.5)))
///         .unwrap(),
/// );
///
/// for _ in 0..60 {
///     engine.advance(1.0 / 60.0);
/// }
/// assert!(engine.body(ball).unwrap().position().y < 3.0);
/// ```
#[derive(Debug)]
pub struct PhysicsEngine {
    config: EngineConfig,
    bodies: BodySet,
    constraints: td::Arena<Constraint>,
    manifolds: Vec<Manifold>,
    broadphase_pairs: Vec<CandidatePair>,
    octree: Octree,
    accumulator: f64,
    paused: bool,
    tick: u64,
    base_seed: u64,
    stats: PhysicsStats,
    events: Vec<PhysicsEvent>,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }
}

impl PhysicsEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Returns
    /// The first configuration error found, if any.
    pub fn new(config: EngineConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        let base_seed = config.solver_seed.unwrap_or_else(rand::random);
        Self {
            config,
            bodies: BodySet::new(),
            constraints: td::Arena::new(),
            manifolds: Vec::new(),
            broadphase_pairs: Vec::new(),
            octree: Octree::new(),
            accumulator: 0.0,
            paused: false,
            tick: 0,
            base_seed,
            stats: PhysicsStats::default(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Removes a body along with every constraint attached to it.
    ///
    /// A [`PhysicsEvent::BodyRemoved`] is queued so the owner can forget the handle.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody, PhysicsError> {
        let body = self.bodies.remove(handle).ok_or(PhysicsError::InvalidBodyHandle)?;

        let attached: Vec<td::Index> = self
            .constraints
            .iter()
            .filter(|(_, constraint)| constraint.involves(handle))
            .map(|(index, _)| index)
            .collect();
        for index in attached {
            self.constraints.remove(index);
            debug!("removed constraint {:?} attached to body {:?}", index, handle);
        }
        self.manifolds.retain(|manifold| !manifold.involves(handle));
        self.broadphase_pairs.retain(|pair| !pair.contains(handle));

        self.events.push(PhysicsEvent::BodyRemoved { body: handle, owner: body.owner() });
        debug!("removed body {:?}", handle);
        Ok(body)
    }

    /// Removes every body and constraint, e.g. when a scene is unloaded.
    pub fn remove_all_bodies(&mut self) {
        for (handle, body) in self.bodies.drain() {
            self.events.push(PhysicsEvent::BodyRemoved { body: handle, owner: body.owner() });
        }
        self.constraints.clear();
        self.manifolds.clear();
        self.broadphase_pairs.clear();
        debug!("removed all bodies and constraints");
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Adds a standalone constraint between two live bodies.
    pub fn add_constraint(&mut self, constraint: impl Into<Constraint>) -> Result<ConstraintHandle, PhysicsError> {
        let constraint = constraint.into();
        let (a, b) = constraint.bodies();
        if !self.bodies.contains(a) || !self.bodies.contains(b) {
            return Err(PhysicsError::InvalidBodyHandle);
        }
        Ok(ConstraintHandle(self.constraints.insert(constraint)))
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Constraint, PhysicsError> {
        let constraint = self.constraints.remove(handle.0).ok_or(PhysicsError::InvalidConstraintHandle)?;
        debug!("removed constraint {:?}", handle);
        Ok(constraint)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle.0)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> {
        self.constraints.iter().map(|(index, c)| (ConstraintHandle(index), c))
    }

    /// Feeds wall-clock time into the fixed-timestep accumulator.
    ///
    /// Runs at most `max_updates_per_frame` ticks. If a full timestep is still pending
    /// afterwards the remainder is dropped and reported as `too_slow`, so the
    /// accumulator never grows without bound. Rest timers advance by `dt` even while
    /// paused.
    ///
    /// Events still queued from before the call are discarded first, so the queue only
    /// ever holds what one frame produced.
    ///
    /// # Arguments
    ///
    /// * `dt` - Elapsed real time in seconds. Negative or non-finite values count as zero.
    pub fn advance(&mut self, dt: f64) -> StepReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if !self.events.is_empty() {
            trace!("discarding {} undrained events", self.events.len());
            self.events.clear();
        }
        for (_, body) in self.bodies.iter_mut() {
            body.advance_rest_timer(dt);
        }

        let mut report = StepReport::default();
        if self.paused {
            return report;
        }

        self.accumulator += dt;
        while self.accumulator >= self.config.timestep && report.ticks_run < self.config.max_updates_per_frame {
            self.accumulator -= self.config.timestep;
            self.step();
            report.ticks_run += 1;
        }

        if self.accumulator >= self.config.timestep {
            warn!(
                "Physics too slow to run in real time, dropping {:.4}s of simulation",
                self.accumulator
            );
            self.accumulator = 0.0;
            report.too_slow = true;
        }
        report
    }

    /// Runs exactly one physics tick of `timestep` seconds.
    ///
    /// Unlike [`advance`](Self::advance) this appends to the event queue without
    /// clearing it; callers stepping manually drain it themselves.
    pub fn step(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let mut stats = PhysicsStats::default();
        self.manifolds.clear();

        let started = Instant::now();
        self.broad_phase(&mut stats);
        stats.broadphase_time = started.elapsed();

        let started = Instant::now();
        self.narrow_phase(&mut stats);
        stats.narrowphase_time = started.elapsed();

        self.solve(&mut stats);

        debug!(
            "tick {}: {} candidate pairs, {} sphere checks, {} narrowphase checks, {} manifolds, {} contacts",
            self.tick,
            stats.candidate_pairs,
            stats.sphere_checks,
            stats.narrowphase_checks,
            stats.manifolds,
            stats.contacts
        );
        self.stats = stats;
    }

    fn broad_phase(&mut self, stats: &mut PhysicsStats) {
        let rest = self.config.rest;
        for (_, body) in self.bodies.iter_mut() {
            body.update_rest_state(&rest);
        }

        let pairs = match self.config.broadphase {
            BroadphaseStrategy::BruteForce => brute_force_pairs(&self.bodies),
            BroadphaseStrategy::Octree => self.octree.candidate_pairs(&self.bodies, &self.config.octree),
        };
        let (pairs, sphere_checks) = cull_pairs(&self.bodies, &pairs, &rest, self.config.sphere_culling);

        stats.sphere_checks = sphere_checks;
        stats.candidate_pairs = pairs.len();
        self.broadphase_pairs = pairs;
    }

    fn narrow_phase(&mut self, stats: &mut PhysicsStats) {
        for pair in &self.broadphase_pairs {
            let (Some(a), Some(b)) = (self.bodies.get(pair.a), self.bodies.get(pair.b)) else {
                continue;
            };
            let (Some(shape_a), Some(shape_b)) = (a.shape(), b.shape()) else {
                continue;
            };
            stats.narrowphase_checks += 1;

            let (pose_a, pose_b) = (a.pose(), b.pose());
            let Some(data) = detect_collision(shape_a, &pose_a, shape_b, &pose_b) else {
                continue;
            };

            // Both sides are always asked, even if the first one vetoes.
            let accept_a = a.accepts_collision(pair.a, pair.b, b);
            let accept_b = b.accepts_collision(pair.b, pair.a, a);
            let accepted = accept_a && accept_b;
            self.events.push(PhysicsEvent::Collision { body_a: pair.a, body_b: pair.b, accepted });
            if !accepted {
                trace!("collision between {:?} and {:?} vetoed", pair.a, pair.b);
                continue;
            }

            let mut manifold = Manifold::new(pair.a, pair.b);
            for contact in generate_contacts(shape_a, &pose_a, shape_b, &pose_b, &data) {
                manifold.add_contact(
                    pose_a.position,
                    pose_b.position,
                    contact.point_on_a,
                    contact.point_on_b,
                    data.normal,
                    contact.penetration,
                );
            }
            if !manifold.contacts().is_empty() {
                stats.contacts += manifold.contacts().len();
                self.manifolds.push(manifold);
            }
        }
        stats.manifolds = self.manifolds.len();
    }

    fn solve(&mut self, stats: &mut PhysicsStats) {
        let dt = self.config.timestep;
        let solver = self.config.solver;

        let started = Instant::now();
        for manifold in &mut self.manifolds {
            manifold.pre_solver_step(&self.bodies, &solver);
        }
        for (_, constraint) in self.constraints.iter_mut() {
            constraint.pre_solver_step(&self.bodies, &solver, dt);
        }
        let presolve_time = started.elapsed();

        let started = Instant::now();
        let (gravity, damping) = (self.config.gravity, self.config.damping);
        for (_, body) in self.bodies.iter_mut() {
            if !body.is_at_rest() {
                body.integrate_velocity(gravity, damping, dt);
            }
        }
        let velocity_time = started.elapsed();

        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.base_seed.wrapping_add(self.tick));
        let mut items: Vec<SolverItem> = self
            .manifolds
            .iter_mut()
            .map(SolverItem::Contact)
            .chain(self.constraints.iter_mut().map(|(_, c)| SolverItem::Joint(c)))
            .collect();
        items.shuffle(&mut rng);

        for _ in 0..solver.iterations {
            for item in items.iter_mut() {
                match item {
                    SolverItem::Contact(manifold) => manifold.apply_impulse(&mut self.bodies, &solver, dt),
                    SolverItem::Joint(constraint) => constraint.apply_impulse(&mut self.bodies, &solver, dt),
                }
            }
        }
        stats.solver_time = presolve_time + started.elapsed();

        let started = Instant::now();
        for (handle, body) in self.bodies.iter_mut() {
            if body.is_at_rest() {
                continue;
            }
            body.integrate_position(dt);
            self.events.push(PhysicsEvent::TransformUpdated {
                body: handle,
                owner: body.owner(),
                transform: body.pose(),
            });
        }
        stats.integration_time = velocity_time + started.elapsed();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn gravity(&self) -> Vector3 {
        self.config.gravity
    }

    /// Sets gravity and wakes every body so sleeping ones feel the change.
    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.config.gravity = gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.wake();
        }
    }

    pub fn damping(&self) -> f64 {
        self.config.damping
    }

    /// Sets the per-tick velocity damping factor. Expected to lie in `[0, 1]`.
    pub fn set_damping(&mut self, damping: f64) {
        self.config.damping = damping;
    }

    pub fn timestep(&self) -> f64 {
        self.config.timestep
    }

    pub fn set_timestep(&mut self, timestep: f64) -> Result<(), PhysicsError> {
        if !(timestep > 0.0 && timestep.is_finite()) {
            return Err(PhysicsError::InvalidTimestep);
        }
        self.config.timestep = timestep;
        Ok(())
    }

    /// Restores timestep, gravity and damping to their defaults and clears the accumulator.
    pub fn reset_defaults(&mut self) {
        self.config.timestep = DEFAULT_TIMESTEP;
        self.config.gravity = DEFAULT_GRAVITY;
        self.config.damping = DEFAULT_DAMPING;
        self.accumulator = 0.0;
    }

    /// Time accumulated towards the next tick; always below one timestep between calls.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Number of ticks run since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn debug_flags(&self) -> DebugDrawFlags {
        self.config.debug_flags
    }

    pub fn set_debug_flags(&mut self, flags: DebugDrawFlags) {
        self.config.debug_flags = flags;
    }

    pub fn toggle_debug_flags(&mut self, flags: DebugDrawFlags) {
        self.config.debug_flags.toggle(flags);
    }

    pub fn broadphase_strategy(&self) -> BroadphaseStrategy {
        self.config.broadphase
    }

    pub fn set_broadphase_strategy(&mut self, strategy: BroadphaseStrategy) {
        self.config.broadphase = strategy;
    }

    pub fn toggle_broadphase_strategy(&mut self) -> BroadphaseStrategy {
        self.config.broadphase = self.config.broadphase.toggled();
        self.config.broadphase
    }

    pub fn sphere_culling(&self) -> bool {
        self.config.sphere_culling
    }

    pub fn set_sphere_culling(&mut self, enabled: bool) {
        self.config.sphere_culling = enabled;
    }

    pub fn toggle_sphere_culling(&mut self) -> bool {
        self.config.sphere_culling = !self.config.sphere_culling;
        self.config.sphere_culling
    }

    /// Candidate pairs of the last tick, after culling.
    pub fn broadphase_pairs(&self) -> &[CandidatePair] {
        &self.broadphase_pairs
    }

    pub fn manifolds(&self) -> &[Manifold] {
        &self.manifolds
    }

    pub fn stats(&self) -> &PhysicsStats {
        &self.stats
    }

    /// Non-empty octree leaves of the last tick; empty with the brute force strategy.
    pub fn octree_regions(&self) -> &[Aabb] {
        match self.config.broadphase {
            BroadphaseStrategy::Octree => self.octree.leaf_regions(),
            BroadphaseStrategy::BruteForce => &[],
        }
    }

    /// Takes every event queued since the last call or the start of the last
    /// [`advance`](Self::advance), whichever is later.
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }
}
