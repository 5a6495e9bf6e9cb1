use std::fmt;
use crate::models::{BodyHandle, CollisionShape, Matrix3, Pose, Quaternion, Vector3};
use crate::utils::{PhysicsError, RestConfig, MOVING_SENTINEL_SPEED, REST_HISTORY_FRAMES};

/// Identifier of the higher-level object that owns a body (a scene node, an entity...).
///
/// The engine never dereferences it; it is echoed back in events so the owner can find
/// itself again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

/// Accept or veto a collision once narrowphase has confirmed the overlap.
///
/// Returning `false` suppresses the contact for this tick, which is how triggers and
/// pass-through volumes are expressed. Both bodies of a pair are asked and either one
/// can veto.
pub trait CollisionResponse: Send + Sync {
    fn on_collision(&self, this: BodyHandle, other: BodyHandle, other_body: &RigidBody) -> bool;
}

impl<F> CollisionResponse for F
where
    F: Fn(BodyHandle, BodyHandle, &RigidBody) -> bool + Send + Sync,
{
    fn on_collision(&self, this: BodyHandle, other: BodyHandle, other_body: &RigidBody) -> bool {
        self(this, other, other_body)
    }
}

/// Ring buffer of the most recent linear and angular speeds of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedHistory {
    linear: [f64; REST_HISTORY_FRAMES],
    angular: [f64; REST_HISTORY_FRAMES],
    cursor: usize,
}

impl Default for SpeedHistory {
    fn default() -> Self {
        Self::moving()
    }
}

impl SpeedHistory {
    /// A history that reads as "moving" for the next `REST_HISTORY_FRAMES` samples.
    pub fn moving() -> Self {
        Self {
            linear: [MOVING_SENTINEL_SPEED; REST_HISTORY_FRAMES],
            angular: [MOVING_SENTINEL_SPEED; REST_HISTORY_FRAMES],
            cursor: 0,
        }
    }

    pub fn push(&mut self, linear_speed: f64, angular_speed: f64) {
        self.linear[self.cursor] = linear_speed;
        self.angular[self.cursor] = angular_speed;
        self.cursor = (self.cursor + 1) % REST_HISTORY_FRAMES;
    }

    /// True iff every sample in the window is under its threshold.
    pub fn is_at_rest(&self, config: &RestConfig) -> bool {
        self.linear.iter().all(|s| s.abs() <= config.linear_threshold)
            && self.angular.iter().all(|s| s.abs() <= config.angular_threshold)
    }
}

/// A rigid body: kinematic state, mass properties, material and rest tracking.
///
/// An inverse mass of zero makes the body static. Attaching a shape derives the
/// inverse inertia and bounding radius from it.
///
/// # Example
/// ```
/// use rs_rigid::models::{RigidBody, SphereShape, Vector3};
///
/// let ball = RigidBody::new()
///     .with_position(Vector3::new(0.0, 5.0, 0.0))
///     .with_mass(2.0).unwrap()
///     .with_shape(Box::new(SphereShape::new(0.5)))
///     .unwrap();
/// assert_eq!(ball.inverse_mass(), 0.5);
/// assert_eq!(ball.bounding_radius(), 0.5);
/// ```
pub struct RigidBody {
    position: Vector3,
    orientation: Quaternion,
    linear_velocity: Vector3,
    angular_velocity: Vector3,
    force: Vector3,
    torque: Vector3,
    inverse_mass: f64,
    local_inverse_inertia: Matrix3,
    friction: f64,
    elasticity: f64,
    bounding_radius: f64,
    shape: Option<Box<dyn CollisionShape>>,
    history: SpeedHistory,
    at_rest: bool,
    time_since_rest_check: f64,
    group: u32,
    owner: Option<OwnerId>,
    collision_response: Option<Box<dyn CollisionResponse>>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidBody")
            .field("position", &self.position)
            .field("orientation", &self.orientation)
            .field("linear_velocity", &self.linear_velocity)
            .field("angular_velocity", &self.angular_velocity)
            .field("inverse_mass", &self.inverse_mass)
            .field("friction", &self.friction)
            .field("elasticity", &self.elasticity)
            .field("shape", &self.shape)
            .field("at_rest", &self.at_rest)
            .field("group", &self.group)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

fn check_coefficient(value: f64) -> Result<f64, PhysicsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidCoefficient)
    }
}

impl RigidBody {
    /// Creates a static body at the origin with friction 0.5 and elasticity 0.9.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            orientation: Quaternion::identity(),
            linear_velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            force: Vector3::ZERO,
            torque: Vector3::ZERO,
            inverse_mass: 0.0,
            local_inverse_inertia: Matrix3::ZERO,
            friction: 0.5,
            elasticity: 0.9,
            bounding_radius: 1.0,
            shape: None,
            history: SpeedHistory::moving(),
            at_rest: false,
            time_since_rest_check: 0.0,
            group: 0,
            owner: None,
            collision_response: None,
        }
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quaternion) -> Self {
        self.orientation = orientation.normalized();
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vector3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, velocity: Vector3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Sets the mass of a dynamic body.
    ///
    /// # Returns
    /// `Err(PhysicsError::InvalidMass)` unless `mass` is finite and positive.
    pub fn with_mass(self, mass: f64) -> Result<Self, PhysicsError> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(PhysicsError::InvalidMass);
        }
        self.with_inverse_mass(1.0 / mass)
    }

    /// Sets the inverse mass directly; zero makes the body static.
    pub fn with_inverse_mass(mut self, inverse_mass: f64) -> Result<Self, PhysicsError> {
        if !(inverse_mass >= 0.0 && inverse_mass.is_finite()) {
            return Err(PhysicsError::InvalidMass);
        }
        self.inverse_mass = inverse_mass;
        self.refresh_inertia();
        Ok(self)
    }

    /// Attaches collision geometry; bounding radius and inertia are derived from it.
    pub fn with_shape(mut self, shape: Box<dyn CollisionShape>) -> Result<Self, PhysicsError> {
        shape.validate()?;
        self.bounding_radius = shape.bounding_radius();
        self.shape = Some(shape);
        self.refresh_inertia();
        Ok(self)
    }

    pub fn with_bounding_radius(mut self, radius: f64) -> Self {
        self.bounding_radius = radius;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Result<Self, PhysicsError> {
        self.friction = check_coefficient(friction)?;
        Ok(self)
    }

    pub fn with_elasticity(mut self, elasticity: f64) -> Result<Self, PhysicsError> {
        self.elasticity = check_coefficient(elasticity)?;
        Ok(self)
    }

    /// Bodies sharing a non-zero group never collide with each other.
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_collision_response(mut self, response: Box<dyn CollisionResponse>) -> Self {
        self.collision_response = Some(response);
        self
    }

    fn refresh_inertia(&mut self) {
        self.local_inverse_inertia = match &self.shape {
            Some(shape) => shape.inverse_inertia(self.inverse_mass),
            None => Matrix3::ZERO,
        };
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    pub fn linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    pub fn force(&self) -> Vector3 {
        self.force
    }

    pub fn torque(&self) -> Vector3 {
        self.torque
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    pub fn local_inverse_inertia(&self) -> Matrix3 {
        self.local_inverse_inertia
    }

    /// Inverse inertia in world space, `R * I⁻¹ * Rᵀ` for the current orientation.
    pub fn world_inverse_inertia(&self) -> Matrix3 {
        if self.local_inverse_inertia.is_zero() {
            return Matrix3::ZERO;
        }
        let r = self.orientation.to_matrix3();
        r * self.local_inverse_inertia * r.transpose()
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    pub fn shape(&self) -> Option<&dyn CollisionShape> {
        self.shape.as_deref()
    }

    pub fn has_shape(&self) -> bool {
        self.shape.is_some()
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    pub fn time_since_rest_check(&self) -> f64 {
        self.time_since_rest_check
    }

    pub fn speed_history(&self) -> &SpeedHistory {
        &self.history
    }

    /// Velocity of the material point at world position `point`.
    pub fn point_velocity(&self, point: Vector3) -> Vector3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.position)
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.wake();
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation.normalized();
        self.wake();
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3) {
        self.linear_velocity = velocity;
        self.wake();
    }

    pub fn set_angular_velocity(&mut self, velocity: Vector3) {
        self.angular_velocity = velocity;
        self.wake();
    }

    /// Sets the persistent force applied every tick until changed.
    pub fn set_force(&mut self, force: Vector3) {
        self.force = force;
        self.wake();
    }

    pub fn set_torque(&mut self, torque: Vector3) {
        self.torque = torque;
        self.wake();
    }

    pub fn set_inverse_mass(&mut self, inverse_mass: f64) -> Result<(), PhysicsError> {
        if !(inverse_mass >= 0.0 && inverse_mass.is_finite()) {
            return Err(PhysicsError::InvalidMass);
        }
        self.inverse_mass = inverse_mass;
        self.refresh_inertia();
        self.wake();
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f64) -> Result<(), PhysicsError> {
        self.friction = check_coefficient(friction)?;
        Ok(())
    }

    pub fn set_elasticity(&mut self, elasticity: f64) -> Result<(), PhysicsError> {
        self.elasticity = check_coefficient(elasticity)?;
        Ok(())
    }

    pub fn set_group(&mut self, group: u32) {
        self.group = group;
    }

    pub fn set_owner(&mut self, owner: Option<OwnerId>) {
        self.owner = owner;
    }

    pub fn set_collision_response(&mut self, response: Option<Box<dyn CollisionResponse>>) {
        self.collision_response = response;
    }

    /// Forces the body out of the rest state for at least the next full history window.
    pub fn wake(&mut self) {
        self.history = SpeedHistory::moving();
        self.at_rest = false;
        self.time_since_rest_check = 0.0;
    }

    /// Samples the current speeds into the history and reclassifies the rest state.
    pub(crate) fn update_rest_state(&mut self, config: &RestConfig) -> bool {
        if self.at_rest && self.time_since_rest_check >= config.recheck_interval {
            self.wake();
        }
        self.history.push(self.linear_velocity.length(), self.angular_velocity.length());
        self.at_rest = self.history.is_at_rest(config);
        if !self.at_rest {
            self.time_since_rest_check = 0.0;
        }
        self.at_rest
    }

    pub(crate) fn advance_rest_timer(&mut self, dt: f64) {
        self.time_since_rest_check += dt;
    }

    pub(crate) fn integrate_velocity(&mut self, gravity: Vector3, damping: f64, dt: f64) {
        if self.inverse_mass > 0.0 {
            self.linear_velocity += gravity * dt;
        }
        self.linear_velocity += self.force * (self.inverse_mass * dt);
        self.linear_velocity *= damping;

        self.angular_velocity += self.world_inverse_inertia() * self.torque * dt;
        self.angular_velocity *= damping;
    }

    pub(crate) fn integrate_position(&mut self, dt: f64) {
        self.position += self.linear_velocity * dt;
        self.orientation = self.orientation.integrate(self.angular_velocity, dt);
    }

    pub(crate) fn apply_impulse_at(&mut self, impulse: Vector3, offset: Vector3, world_inverse_inertia: &Matrix3) {
        self.linear_velocity += impulse * self.inverse_mass;
        self.angular_velocity += *world_inverse_inertia * offset.cross(impulse);
    }

    pub(crate) fn accepts_collision(&self, this: BodyHandle, other: BodyHandle, other_body: &RigidBody) -> bool {
        self.collision_response
            .as_ref()
            .map_or(true, |response| response.on_collision(this, other, other_body))
    }
}
