use crate::constraints::manifold::{apply_pair_impulse, effective_mass};
use crate::models::{BodyHandle, BodySet, RigidBody, Vector3};
use crate::utils::{PhysicsError, SolverConfig};

/// Anchor points of a two-body constraint, stored in each body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub local_anchor_a: Vector3,
    pub local_anchor_b: Vector3,
}

impl AnchorPair {
    /// Converts world anchors into body-local anchors for two distinct live bodies.
    pub fn new(
        bodies: &BodySet,
        body_a: BodyHandle,
        body_b: BodyHandle,
        world_anchor_a: Vector3,
        world_anchor_b: Vector3,
    ) -> Result<Self, PhysicsError> {
        if body_a == body_b {
            return Err(PhysicsError::InvalidConstraint("a constraint needs two distinct bodies".to_string()));
        }
        let a = bodies.get(body_a).ok_or(PhysicsError::InvalidBodyHandle)?;
        let b = bodies.get(body_b).ok_or(PhysicsError::InvalidBodyHandle)?;
        Ok(Self {
            body_a,
            body_b,
            local_anchor_a: a.pose().inverse_transform_point(world_anchor_a),
            local_anchor_b: b.pose().inverse_transform_point(world_anchor_b),
        })
    }

    /// World-space anchors for the bodies' current poses.
    pub fn world_anchors(&self, a: &RigidBody, b: &RigidBody) -> (Vector3, Vector3) {
        (a.pose().transform_point(self.local_anchor_a), b.pose().transform_point(self.local_anchor_b))
    }

    /// Anchor offsets from the centers of mass, rotated into world space.
    pub fn world_offsets(&self, a: &RigidBody, b: &RigidBody) -> (Vector3, Vector3) {
        (a.pose().transform_vector(self.local_anchor_a), b.pose().transform_vector(self.local_anchor_b))
    }
}

/// Keeps two anchor points at a fixed distance, like a rigid rod.
///
/// # Example
/// ```
/// use rs_rigid::constraints::DistanceConstraint;
/// use rs_rigid::models::{BodySet, RigidBody, Vector3};
///
/// let mut bodies = BodySet::new();
/// let a = bodies.insert(RigidBody::new());
/// let b = bodies.insert(RigidBody::new().with_position(Vector3::new(0.0, -2.0, 0.0)));
/// let rod = DistanceConstraint::new(&bodies, a, b, Vector3::ZERO, Vector3::new(0.0, -2.0, 0.0)).unwrap();
/// assert_eq!(rod.target_length(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceConstraint {
    anchors: AnchorPair,
    target_length: f64,
}

impl DistanceConstraint {
    /// Creates a constraint holding the current distance between the two world anchors.
    pub fn new(
        bodies: &BodySet,
        body_a: BodyHandle,
        body_b: BodyHandle,
        world_anchor_a: Vector3,
        world_anchor_b: Vector3,
    ) -> Result<Self, PhysicsError> {
        let anchors = AnchorPair::new(bodies, body_a, body_b, world_anchor_a, world_anchor_b)?;
        Ok(Self {
            anchors,
            target_length: (world_anchor_b - world_anchor_a).length(),
        })
    }

    pub fn anchors(&self) -> &AnchorPair {
        &self.anchors
    }

    pub fn target_length(&self) -> f64 {
        self.target_length
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
        let dv = v0 - v1;

        let inertia_a = a.world_inverse_inertia();
        let inertia_b = b.world_inverse_inertia();
        let constraint_mass = effective_mass(a, b, &inertia_a, &inertia_b, r1, r2, abn);
        if constraint_mass <= 0.0 {
            return;
        }

        let distance_offset = ab.length() - self.target_length;
        let bias = -(config.distance_baumgarte_scalar / dt) * distance_offset;
        let jn = -(dv.dot(abn) + bias) / constraint_mass;
        apply_pair_impulse(a, b, &inertia_a, &inertia_b, r1, r2, abn * jn);
    }
}
