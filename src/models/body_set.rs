use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use thunderdome as td;
use crate::models::RigidBody;

/// Key type to look up a body stored in the engine.
///
/// Handles are generational: a handle to a removed body never resolves to a body
/// inserted later into the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyHandle(pub(crate) td::Index);

impl BodyHandle {
    /// Get the underlying [`thunderdome::Index`] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }

    #[inline]
    pub fn slot(&self) -> u32 {
        self.0.slot()
    }
}

impl Hash for BodyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Ord for BodyHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.slot()
            .cmp(&other.slot())
            .then_with(|| self.0.to_bits().cmp(&other.0.to_bits()))
    }
}

impl PartialOrd for BodyHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Generational arena owning every body of a simulation.
#[derive(Debug)]
pub struct BodySet {
    bodies: td::Arena<RigidBody>,
}

impl Default for BodySet {
    fn default() -> Self {
        Self::new()
    }
}

impl BodySet {
    pub fn new() -> Self {
        Self { bodies: td::Arena::new() }
    }

    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        BodyHandle(self.bodies.insert(body))
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.remove(handle.0)
    }

    #[inline]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Mutably borrows two distinct bodies at once.
    ///
    /// Returns `None` if the handles are equal or either body is gone.
    pub fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a == b {
            return None;
        }
        match self.bodies.get2_mut(a.0, b.0) {
            (Some(body_a), Some(body_b)) => Some((body_a, body_b)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(index, body)| (BodyHandle(index), body))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.bodies.iter_mut().map(|(index, body)| (BodyHandle(index), body))
    }

    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Removes every body, yielding them with their former handles.
    pub fn drain(&mut self) -> Vec<(BodyHandle, RigidBody)> {
        self.bodies.drain().map(|(index, body)| (BodyHandle(index), body)).collect()
    }
}
