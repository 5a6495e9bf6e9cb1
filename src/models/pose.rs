use crate::models::{Quaternion, Vector3};

/// World placement of a body: position of the center of mass plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }

    pub fn from_position(position: Vector3) -> Self {
        Self { position, orientation: Quaternion::identity() }
    }

    /// Maps a body-local point into world space.
    pub fn transform_point(&self, local: Vector3) -> Vector3 {
        self.position + self.orientation.rotate_vector(local)
    }

    /// Maps a world point into body-local space.
    pub fn inverse_transform_point(&self, world: Vector3) -> Vector3 {
        self.orientation.conjugate().rotate_vector(world - self.position)
    }

    pub fn transform_vector(&self, local: Vector3) -> Vector3 {
        self.orientation.rotate_vector(local)
    }

    pub fn inverse_transform_vector(&self, world: Vector3) -> Vector3 {
        self.orientation.conjugate().rotate_vector(world)
    }

    /// Column-major 4x4 world matrix, the layout render layers usually upload.
    pub fn to_matrix4(&self) -> [f64; 16] {
        let r = self.orientation.to_matrix3();
        let p = self.position;
        [
            r.rows[0][0], r.rows[1][0], r.rows[2][0], 0.0,
            r.rows[0][1], r.rows[1][1], r.rows[2][1], 0.0,
            r.rows[0][2], r.rows[1][2], r.rows[2][2], 0.0,
            p.x, p.y, p.z, 1.0,
        ]
    }
}
