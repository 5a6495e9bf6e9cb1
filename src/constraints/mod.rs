mod manifold;
mod distance;
mod spring;
mod constraint;

pub use manifold::{ContactPoint, Manifold, ManifoldId};
pub use distance::*;
pub use spring::*;
pub use constraint::*;
