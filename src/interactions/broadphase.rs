use crate::models::{BodyHandle, BodySet, RigidBody};
use crate::utils::RestConfig;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Strategy used to produce candidate pairs each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadphaseStrategy {
    /// Every pair of bodies with shapes.
    BruteForce,
    /// Pairs sharing a leaf of an octree rebuilt every tick.
    Octree,
}

impl BroadphaseStrategy {
    pub fn toggled(self) -> Self {
        match self {
            BroadphaseStrategy::BruteForce => BroadphaseStrategy::Octree,
            BroadphaseStrategy::Octree => BroadphaseStrategy::BruteForce,
        }
    }
}

/// Unordered pair of bodies that may be colliding.
///
/// The constructor orders the handles so that `CandidatePair::new(a, b)` and
/// `CandidatePair::new(b, a)` compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl CandidatePair {
    pub fn new(x: BodyHandle, y: BodyHandle) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.a == handle || self.b == handle
    }
}

/// Whether two bodies are allowed to form a pair at all.
///
/// Both need a collision shape, and bodies sharing a non-zero group never collide.
pub fn can_pair(a: &RigidBody, b: &RigidBody) -> bool {
    if !a.has_shape() || !b.has_shape() {
        return false;
    }
    a.group() == 0 || a.group() != b.group()
}

/// Every unordered pair of bodies that [`can_pair`].
pub fn brute_force_pairs(bodies: &BodySet) -> Vec<CandidatePair> {
    let shaped: Vec<(BodyHandle, &RigidBody)> = bodies.iter().filter(|(_, body)| body.has_shape()).collect();
    let mut pairs = Vec::with_capacity(shaped.len() * shaped.len().saturating_sub(1) / 2);
    for (i, (handle_a, body_a)) in shaped.iter().enumerate() {
        for (handle_b, body_b) in &shaped[i + 1..] {
            if can_pair(body_a, body_b) {
                pairs.push(CandidatePair::new(*handle_a, *handle_b));
            }
        }
    }
    pairs
}

fn both_resting(a: &RigidBody, b: &RigidBody, rest: &RestConfig) -> bool {
    a.is_at_rest()
        && b.is_at_rest()
        && a.time_since_rest_check() < rest.recheck_interval
        && b.time_since_rest_check() < rest.recheck_interval
}

fn spheres_overlap(a: &RigidBody, b: &RigidBody) -> bool {
    let reach = a.bounding_radius() + b.bounding_radius();
    (a.position() - b.position()).length_squared() <= reach * reach
}

/// Verdict for one pair: kept or not, and whether the sphere test ran.
fn cull_one(pair: &CandidatePair, bodies: &BodySet, rest: &RestConfig, sphere_culling: bool) -> (bool, bool) {
    let (Some(a), Some(b)) = (bodies.get(pair.a), bodies.get(pair.b)) else {
        return (false, false);
    };
    if both_resting(a, b, rest) {
        return (false, false);
    }
    if !sphere_culling {
        return (true, false);
    }
    (spheres_overlap(a, b), true)
}

/// Drops pairs of sleeping bodies and, when enabled, pairs whose bounding spheres
/// are apart.
///
/// # Returns
/// The surviving pairs (input order preserved) and the number of sphere tests run.
pub fn cull_pairs(
    bodies: &BodySet,
    pairs: &[CandidatePair],
    rest: &RestConfig,
    sphere_culling: bool,
) -> (Vec<CandidatePair>, usize) {
    #[cfg(feature = "parallel")]
    let verdicts: Vec<(bool, bool)> = pairs
        .par_iter()
        .map(|pair| cull_one(pair, bodies, rest, sphere_culling))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let verdicts: Vec<(bool, bool)> = pairs
        .iter()
        .map(|pair| cull_one(pair, bodies, rest, sphere_culling))
        .collect();

    let sphere_checks = verdicts.iter().filter(|(_, checked)| *checked).count();
    let kept = pairs
        .iter()
        .zip(verdicts)
        .filter(|(_, (keep, _))| *keep)
        .map(|(pair, _)| *pair)
        .collect();
    (kept, sphere_checks)
}
