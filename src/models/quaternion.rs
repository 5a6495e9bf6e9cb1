use std::ops::Mul;
use approx::{AbsDiffEq, RelativeEq};
use crate::models::{Matrix3, Vector3};

/// Quaternion representation for 3D rotations to avoid gimbal lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::identity()
    }
}

impl Quaternion {
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Creates a new identity quaternion (no rotation)
    pub const fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Pure quaternion `(0, v)`, used for the orientation derivative.
    pub const fn from_vector(v: Vector3) -> Self {
        Self { w: 0.0, x: v.x, y: v.y, z: v.z }
    }

    pub fn is_near_identity(&self, epsilon: f64) -> bool {
        (self.w - 1.0).abs() < epsilon &&
            self.x.abs() < epsilon &&
            self.y.abs() < epsilon &&
            self.z.abs() < epsilon
    }

    /// Creates a quaternion from axis-angle representation
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        let magnitude = axis.length();
        if magnitude < 1e-10 {
            return Quaternion::identity();
        }

        let half_angle = angle / 2.0;
        let n = axis / magnitude * half_angle.sin();
        Quaternion { w: half_angle.cos(), x: n.x, y: n.y, z: n.z }
    }

    /// Returns the length/magnitude of the quaternion
    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns a normalized version of the quaternion
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < 1e-10 {
            return Quaternion::identity();
        }
        Quaternion {
            w: self.w / mag,
            x: self.x / mag,
            y: self.y / mag,
            z: self.z / mag,
        }
    }

    /// Multiplies two quaternions (composition of rotations)
    pub fn multiply(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Returns the conjugate of the quaternion, which is the inverse rotation for unit quaternions
    pub fn conjugate(&self) -> Quaternion {
        Quaternion { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    /// Rotates a vector by this (unit) quaternion: `q * (0, v) * q⁻¹`.
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let rotated = self.multiply(&Quaternion::from_vector(v)).multiply(&self.conjugate());
        Vector3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Advances the orientation by an angular velocity over `dt`.
    ///
    /// Uses the first-order derivative `q += 0.5 * dt * (ω, 0) * q` and re-normalizes
    /// to control the drift of the linear approximation.
    ///
    /// # Example
    /// ```
    /// use rs_rigid::models::{Quaternion, Vector3};
    ///
    /// let q = Quaternion::identity().integrate(Vector3::new(0.0, 1.0, 0.0), 0.01);
    /// assert!((q.magnitude() - 1.0).abs() < 1e-12);
    /// assert!(q.y > 0.0);
    /// ```
    pub fn integrate(&self, angular_velocity: Vector3, dt: f64) -> Quaternion {
        let spin = Quaternion::from_vector(angular_velocity * (dt * 0.5)).multiply(self);
        Quaternion {
            w: self.w + spin.w,
            x: self.x + spin.x,
            y: self.y + spin.y,
            z: self.z + spin.z,
        }
        .normalized()
    }

    /// Rotation matrix equivalent of this (unit) quaternion.
    pub fn to_matrix3(&self) -> Matrix3 {
        let Quaternion { w, x, y, z } = self.normalized();
        Matrix3::from_rows([
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
            [2.0 * (x * y + w * z), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - w * x)],
            [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), 1.0 - 2.0 * (x * x + y * y)],
        ])
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        self.multiply(&rhs)
    }
}

impl AbsDiffEq for Quaternion {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.w.abs_diff_eq(&other.w, epsilon)
            && self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl RelativeEq for Quaternion {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.w.relative_eq(&other.w, epsilon, max_relative)
            && self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && self.z.relative_eq(&other.z, epsilon, max_relative)
    }
}
