mod broadphase;
mod octree;
mod narrowphase;

pub use broadphase::*;
pub use octree::*;
pub use narrowphase::*;
