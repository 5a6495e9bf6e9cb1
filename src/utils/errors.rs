use std::fmt;
use std::error::Error;

/// Represents errors that can occur when building or driving the physics engine.
///
/// The simulation step itself never fails; these errors come from the API surface
/// (invalid builder input, stale handles and malformed configuration).
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Indicates an invalid mass value (e.g., negative, zero or non-finite mass).
    InvalidMass,
    /// Indicates an invalid material coefficient (friction/elasticity outside [0, 1]).
    InvalidCoefficient,
    /// Indicates an invalid fixed timestep (zero, negative or non-finite).
    InvalidTimestep,
    /// Indicates that a body handle does not refer to a live body.
    InvalidBodyHandle,
    /// Indicates that a constraint handle does not refer to a live constraint.
    InvalidConstraintHandle,
    /// Indicates collision geometry with a non-positive or non-finite size, with the reason.
    InvalidShape(String),
    /// Indicates a constraint that cannot be built, with the reason.
    InvalidConstraint(String),
    /// Indicates a configuration value outside its allowed range, with the reason.
    InvalidConfiguration(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PhysicsError::InvalidMass => write!(f, "Invalid mass value"),
            PhysicsError::InvalidCoefficient => write!(f, "Invalid coefficient value"),
            PhysicsError::InvalidTimestep => write!(f, "Invalid timestep value"),
            PhysicsError::InvalidBodyHandle => write!(f, "Body handle does not refer to a live body"),
            PhysicsError::InvalidConstraintHandle => write!(f, "Constraint handle does not refer to a live constraint"),
            PhysicsError::InvalidShape(msg) => write!(f, "Invalid shape: {}", msg),
            PhysicsError::InvalidConstraint(msg) => write!(f, "Invalid constraint: {}", msg),
            PhysicsError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl Error for PhysicsError {}
