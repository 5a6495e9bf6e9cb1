use std::ops::{Add, Mul};
use crate::models::Vector3;

/// Row-major 3x3 matrix, used for inertia tensors and rotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub rows: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Matrix3::ZERO
    }
}

impl Matrix3 {
    pub const ZERO: Matrix3 = Matrix3 { rows: [[0.0; 3]; 3] };
    pub const IDENTITY: Matrix3 = Matrix3 {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    pub const fn from_diagonal(d: Vector3) -> Self {
        Self {
            rows: [[d.x, 0.0, 0.0], [0.0, d.y, 0.0], [0.0, 0.0, d.z]],
        }
    }

    pub fn transpose(&self) -> Matrix3 {
        let r = &self.rows;
        Matrix3::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    pub fn column(&self, i: usize) -> Vector3 {
        Vector3::new(self.rows[0][i], self.rows[1][i], self.rows[2][i])
    }

    pub fn is_zero(&self) -> bool {
        self.rows.iter().flatten().all(|v| *v == 0.0)
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Vector3 {
        let r = &self.rows;
        Vector3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Matrix3::from_rows(out)
    }
}

impl Add for Matrix3 {
    type Output = Matrix3;

    fn add(self, rhs: Matrix3) -> Matrix3 {
        let mut out = self.rows;
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell += rhs.rows[i][j];
            }
        }
        Matrix3::from_rows(out)
    }
}
