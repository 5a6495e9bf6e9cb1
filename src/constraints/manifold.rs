use std::sync::atomic::{AtomicU64, Ordering};
use crate::models::{BodyHandle, BodySet, Matrix3, RigidBody, Vector3};
use crate::utils::SolverConfig;

static NEXT_MANIFOLD_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one manifold instance. Every manifold ever built gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifoldId(u64);

/// A single contact between the two bodies of a manifold.
///
/// Offsets are taken from each body's center of mass. The scratch fields are
/// reset by [`Manifold::pre_solver_step`] and only live for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub offset_a: Vector3,
    pub offset_b: Vector3,
    /// Unit normal pointing from body A toward body B.
    pub normal: Vector3,
    /// Signed depth, non-positive while the bodies overlap.
    pub penetration: f64,
    /// Normal impulse accumulated over this tick's solver passes. Clamped to stay
    /// non-positive as a whole, so later passes can undo an overshoot.
    pub sum_impulse_contact: f64,
    /// Friction impulse accumulated this tick. Diagnostic only; friction is not
    /// clamped against it.
    pub sum_impulse_friction: Vector3,
    pub elasticity_term: f64,
}

/// Effective mass of a pair of bodies along `direction` at the given offsets.
pub(crate) fn effective_mass(
    a: &RigidBody,
    b: &RigidBody,
    inertia_a: &Matrix3,
    inertia_b: &Matrix3,
    offset_a: Vector3,
    offset_b: Vector3,
    direction: Vector3,
) -> f64 {
    let angular_a = (*inertia_a * offset_a.cross(direction)).cross(offset_a);
    let angular_b = (*inertia_b * offset_b.cross(direction)).cross(offset_b);
    a.inverse_mass() + b.inverse_mass() + direction.dot(angular_a + angular_b)
}

/// Applies `impulse` to A and its opposite to B at the given offsets.
pub(crate) fn apply_pair_impulse(
    a: &mut RigidBody,
    b: &mut RigidBody,
    inertia_a: &Matrix3,
    inertia_b: &Matrix3,
    offset_a: Vector3,
    offset_b: Vector3,
    impulse: Vector3,
) {
    a.apply_impulse_at(impulse, offset_a, inertia_a);
    b.apply_impulse_at(-impulse, offset_b, inertia_b);
}

fn relative_velocity(a: &RigidBody, b: &RigidBody, offset_a: Vector3, offset_b: Vector3) -> Vector3 {
    (a.linear_velocity() + a.angular_velocity().cross(offset_a))
        - (b.linear_velocity() + b.angular_velocity().cross(offset_b))
}

/// Contacts between one ordered pair of bodies for the current tick.
///
/// Manifolds are rebuilt from narrowphase output every tick and discarded at the start
/// of the next one; no contact data carries over between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    id: ManifoldId,
    body_a: BodyHandle,
    body_b: BodyHandle,
    contacts: Vec<ContactPoint>,
}

impl Manifold {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            id: ManifoldId(NEXT_MANIFOLD_ID.fetch_add(1, Ordering::Relaxed)),
            body_a,
            body_b,
            contacts: Vec::new(),
        }
    }

    pub fn id(&self) -> ManifoldId {
        self.id
    }

    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts
    }

    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body_a == handle || self.body_b == handle
    }

    /// Adds a contact given the touching point on each body.
    ///
    /// # Arguments
    ///
    /// * `position_a`, `position_b` - Centers of mass of the two bodies.
    /// * `point_on_a`, `point_on_b` - World contact points on each surface.
    /// * `normal` - Contact normal from A toward B; normalized here.
    /// * `penetration` - Signed depth, non-positive for an overlap.
    pub fn add_contact(
        &mut self,
        position_a: Vector3,
        position_b: Vector3,
        point_on_a: Vector3,
        point_on_b: Vector3,
        normal: Vector3,
        penetration: f64,
    ) {
        self.contacts.push(ContactPoint {
            offset_a: point_on_a - position_a,
            offset_b: point_on_b - position_b,
            normal: normal.normalized(),
            penetration,
            sum_impulse_contact: 0.0,
            sum_impulse_friction: Vector3::ZERO,
            elasticity_term: 0.0,
        });
    }

    /// Resets the per-contact solver state and computes the restitution target.
    ///
    /// Must run before velocities are integrated or any impulse is applied this
    /// tick, since it reads the pre-solve approach speed.
    pub fn pre_solver_step(&mut self, bodies: &BodySet, config: &SolverConfig) {
        let (Some(a), Some(b)) = (bodies.get(self.body_a), bodies.get(self.body_b)) else {
            return;
        };
        let elasticity = (a.elasticity() * b.elasticity()).sqrt();

        for contact in &mut self.contacts {
            contact.sum_impulse_contact = 0.0;
            contact.sum_impulse_friction = Vector3::ZERO;

            let dv = relative_velocity(a, b, contact.offset_a, contact.offset_b);
            let term = elasticity * contact.normal.dot(dv);
            // Separating or too slow to bounce.
            contact.elasticity_term = if term < config.elasticity_slop { 0.0 } else { term };
        }
    }

    /// One solver pass over every contact of the manifold.
    pub fn apply_impulse(&mut self, bodies: &mut BodySet, config: &SolverConfig, dt: f64) {
        let Some((a, b)) = bodies.pair_mut(self.body_a, self.body_b) else {
            return;
        };
        if a.inverse_mass() + b.inverse_mass() == 0.0 {
            return;
        }
        let inertia_a = a.world_inverse_inertia();
        let inertia_b = b.world_inverse_inertia();

        for contact in &mut self.contacts {
            solve_contact_point(a, b, &inertia_a, &inertia_b, contact, config, dt);
        }
    }
}

fn solve_contact_point(
    a: &mut RigidBody,
    b: &mut RigidBody,
    inertia_a: &Matrix3,
    inertia_b: &Matrix3,
    contact: &mut ContactPoint,
    config: &SolverConfig,
    dt: f64,
) {
    let (r1, r2, normal) = (contact.offset_a, contact.offset_b, contact.normal);

    let dv = relative_velocity(a, b, r1, r2);
    let constraint_mass = effective_mass(a, b, inertia_a, inertia_b, r1, r2, normal);
    if constraint_mass <= 0.0 {
        return;
    }

    let baumgarte = -(config.baumgarte_scalar / dt) * (contact.penetration + config.baumgarte_slop).min(0.0);
    let bias = baumgarte.max(contact.elasticity_term + baumgarte * config.elasticity_bias_blend);

    // The running total may never pull the bodies together, but a single pass may
    // hand back part of what earlier passes pushed.
    let delta = -(dv.dot(normal) + bias) / constraint_mass;
    let previous = contact.sum_impulse_contact;
    contact.sum_impulse_contact = (previous + delta).min(0.0);
    let jn = contact.sum_impulse_contact - previous;
    apply_pair_impulse(a, b, inertia_a, inertia_b, r1, r2, normal * jn);

    let dv = relative_velocity(a, b, r1, r2);
    let tangent = dv - normal * dv.dot(normal);
    if tangent.length() <= config.friction_epsilon {
        return;
    }
    let tangent = tangent.normalized();

    let frictional_mass = effective_mass(a, b, inertia_a, inertia_b, r1, r2, tangent);
    if frictional_mass <= 0.0 {
        return;
    }
    let friction = (a.friction() * b.friction()).sqrt();
    // Not clamped against friction * jn.
    let jt = -friction * dv.dot(tangent) / frictional_mass;
    apply_pair_impulse(a, b, inertia_a, inertia_b, r1, r2, tangent * jt);
    contact.sum_impulse_friction += tangent * jt;
}
