use crate::constraints::manifold::apply_pair_impulse;
use crate::constraints::AnchorPair;
use crate::models::{BodyHandle, BodySet, Vector3};
use crate::utils::{PhysicsError, SolverConfig};

/// Damped Hookean spring between two anchor points.
///
/// The force of one tick is spread evenly over the solver iterations, so the total
/// impulse per tick is `(k * stretch + c * separating_speed) * dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConstraint {
    anchors: AnchorPair,
    rest_length: f64,
    stiffness: f64,
    damping: f64,
}

impl SpringConstraint {
    /// Creates a spring whose rest length is the current distance between the anchors.
    ///
    /// # Returns
    /// `Err(PhysicsError::InvalidConstraint)` for a negative or non-finite stiffness
    /// or damping.
    pub fn new(
        bodies: &BodySet,
        body_a: BodyHandle,
        body_b: BodyHandle,
        world_anchor_a: Vector3,
        world_anchor_b: Vector3,
        stiffness: f64,
        damping: f64,
    ) -> Result<Self, PhysicsError> {
        if !(stiffness >= 0.0 && stiffness.is_finite()) || !(damping >= 0.0 && damping.is_finite()) {
            return Err(PhysicsError::InvalidConstraint(
                "spring stiffness and damping must be finite and non-negative".to_string(),
            ));
        }
        let anchors = AnchorPair::new(bodies, body_a, body_b, world_anchor_a, world_anchor_b)?;
        Ok(Self {
            anchors,
            rest_length: (world_anchor_b - world_anchor_a).length(),
            stiffness,
            damping,
        })
    }

    pub fn with_rest_length(mut self, rest_length: f64) -> Self {
        self.rest_length = rest_length.max(0.0);
        self
    }

    pub fn anchors(&self) -> &AnchorPair {
        &self.anchors
    }

    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn pre_solver_step(&mut self, _bodies: &BodySet, _config: &SolverConfig, _dt: f64) {}

    pub fn apply_impulse(&mut self, bodies: &mut BodySet, config: &SolverConfig, dt: f64) {
        let Some((a, b)) = bodies.pair_mut(self.anchors.body_a, self.anchors.body_b) else {
            return;
        };
        if a.inverse_mass() + b.inverse_mass() == 0.0 {
            return;
        }

        let (r1, r2) = self.anchors.world_offsets(a, b);
        let (global_a, global_b) = self.anchors.world_anchors(a, b);
        let ab = global_b - global_a;
        let abn = ab.normalized();
        if abn == Vector3::ZERO {
            return;
        }

        let v0 = a.linear_velocity() + a.angular_velocity().cross(r1);
        let v1 = b.linear_velocity() + b.angular_velocity().cross(r2);
        let separating_speed = (v1 - v0).dot(abn);
        let stretch = ab.length() - self.rest_length;

        let force = self.stiffness * stretch + self.damping * separating_speed;
        let j = force * dt / config.iterations as f64;

        let inertia_a = a.world_inverse_inertia();
        let inertia_b = b.world_inverse_inertia();
        apply_pair_impulse(a, b, &inertia_a, &inertia_b, r1, r2, abn * j);
    }
}
