use std::time::Duration;
use crate::models::{BodyHandle, OwnerId, Pose};

/// Notifications produced while stepping, drained by the host with
/// [`PhysicsEngine::drain_events`](crate::engine::PhysicsEngine::drain_events).
///
/// The queue is cleared at the start of every `advance`, so a host that never drains
/// it holds at most one frame of events.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsEvent {
    /// A non-resting body moved during a tick.
    TransformUpdated {
        body: BodyHandle,
        owner: Option<OwnerId>,
        transform: Pose,
    },
    /// Narrowphase confirmed an overlap. `accepted` is false if either body vetoed it.
    Collision {
        body_a: BodyHandle,
        body_b: BodyHandle,
        accepted: bool,
    },
    /// A body left the engine; its owner should drop the handle.
    BodyRemoved {
        body: BodyHandle,
        owner: Option<OwnerId>,
    },
}

/// Diagnostic counters and timings of the last physics tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsStats {
    /// Candidate pairs that survived culling.
    pub candidate_pairs: usize,
    /// Bounding sphere tests run by the culling pass.
    pub sphere_checks: usize,
    /// Pairs handed to the separating axis test.
    pub narrowphase_checks: usize,
    pub manifolds: usize,
    pub contacts: usize,
    pub broadphase_time: Duration,
    pub narrowphase_time: Duration,
    pub integration_time: Duration,
    pub solver_time: Duration,
}

/// Outcome of one [`PhysicsEngine::advance`](crate::engine::PhysicsEngine::advance) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Physics ticks run during the call.
    pub ticks_run: usize,
    /// The simulation could not keep up and the accumulated time was dropped.
    pub too_slow: bool,
}
