use thunderdome as td;
use crate::constraints::{DistanceConstraint, SpringConstraint};
use crate::models::{BodyHandle, BodySet, Vector3};
use crate::utils::SolverConfig;

/// Key type to look up a standalone constraint stored in the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintHandle(pub(crate) td::Index);

impl ConstraintHandle {
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Standalone constraints owned by the engine.
///
/// Contacts are solved through [`Manifold`](crate::constraints::Manifold) with the same
/// two-phase protocol: `pre_solver_step` once per tick, then `apply_impulse` once per
/// solver iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Distance(DistanceConstraint),
    Spring(SpringConstraint),
}

impl From<DistanceConstraint> for Constraint {
    fn from(c: DistanceConstraint) -> Self {
        Constraint::Distance(c)
    }
}

impl From<SpringConstraint> for Constraint {
    fn from(c: SpringConstraint) -> Self {
        Constraint::Spring(c)
    }
}

impl Constraint {
    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        let anchors = match self {
            Constraint::Distance(c) => c.anchors(),
            Constraint::Spring(c) => c.anchors(),
        };
        (anchors.body_a, anchors.body_b)
    }

    pub fn involves(&self, handle: BodyHandle) -> bool {
        let (a, b) = self.bodies();
        a == handle || b == handle
    }

    /// Current world anchor points, for debug drawing.
    pub fn world_anchors(&self, bodies: &BodySet) -> Option<(Vector3, Vector3)> {
        let anchors = match self {
            Constraint::Distance(c) => c.anchors(),
            Constraint::Spring(c) => c.anchors(),
        };
        let a = bodies.get(anchors.body_a)?;
        let b = bodies.get(anchors.body_b)?;
        Some(anchors.world_anchors(a, b))
    }

    pub fn pre_solver_step(&mut self, bodies: &BodySet, config: &SolverConfig, dt: f64) {
        match self {
            Constraint::Distance(c) => c.pre_solver_step(bodies, config, dt),
            Constraint::Spring(c) => c.pre_solver_step(bodies, config, dt),
        }
    }

    pub fn apply_impulse(&mut self, bodies: &mut BodySet, config: &SolverConfig, dt: f64) {
        match self {
            Constraint::Distance(c) => c.apply_impulse(bodies, config, dt),
            Constraint::Spring(c) => c.apply_impulse(bodies, config, dt),
        }
    }
}
