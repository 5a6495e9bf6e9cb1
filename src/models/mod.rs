mod vector3;
mod matrix3;
mod quaternion;
mod pose;
mod shape_3d;
mod rigid_body;
mod body_set;

pub use vector3::*;
pub use matrix3::*;
pub use quaternion::*;
pub use pose::*;
pub use shape_3d::*;
pub use rigid_body::*;
pub use body_set::*;

#[cfg(test)]
mod quaternion_tests;
