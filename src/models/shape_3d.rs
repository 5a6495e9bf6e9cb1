use std::fmt::Debug;
use crate::models::{Matrix3, Pose, Vector3};
use crate::utils::PhysicsError;

/// A plane `normal · p = distance`. Points with a non-positive signed distance are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3,
    pub distance: f64,
}

impl Plane {
    pub fn new(normal: Vector3, distance: f64) -> Self {
        Self { normal, distance }
    }

    /// Plane through `point` facing along `normal`.
    pub fn from_point(normal: Vector3, point: Vector3) -> Self {
        Self { normal, distance: normal.dot(point) }
    }

    pub fn signed_distance(&self, point: Vector3) -> f64 {
        self.normal.dot(point) - self.distance
    }
}

/// The feature of a shape that faces along a collision axis.
///
/// Polyhedra return a face loop together with the planes of its neighbouring faces,
/// which bound the region an incident face is clipped to. Curved shapes return a
/// single point and no planes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactFace {
    pub vertices: Vec<Vector3>,
    pub normal: Vector3,
    pub adjacent_planes: Vec<Plane>,
}

/// Convex collision geometry owned by a body.
///
/// Everything narrowphase needs is expressed through world-space queries against the
/// body's current pose, so new primitives only have to answer these questions.
pub trait CollisionShape: Debug + Send + Sync {
    /// Checks that the dimensions describe a solid with positive, finite extent.
    fn validate(&self) -> Result<(), PhysicsError>;

    /// Body-local inverse inertia tensor for a body with the given inverse mass.
    fn inverse_inertia(&self, inverse_mass: f64) -> Matrix3;

    /// Radius of a sphere around the center of mass enclosing the whole shape.
    fn bounding_radius(&self) -> f64;

    /// Candidate separating axes contributed by this shape against `other`.
    fn collision_axes(&self, pose: &Pose, other: &dyn CollisionShape, other_pose: &Pose) -> Vec<Vector3>;

    /// Edge directions used to build cross-product axes. Curved shapes have none.
    fn edge_directions(&self, pose: &Pose) -> Vec<Vector3>;

    /// Closest point of the (solid) shape to `point`.
    fn closest_point(&self, pose: &Pose, point: Vector3) -> Vector3;

    /// World points of the shape with the smallest and largest projection on `axis`.
    fn min_max_on_axis(&self, pose: &Pose, axis: Vector3) -> (Vector3, Vector3);

    /// The face (or point) of the shape most aligned with `axis`.
    fn reference_face(&self, pose: &Pose, axis: Vector3) -> ContactFace;

    /// Line segments outlining the shape, for debug drawing.
    fn debug_outline(&self, _pose: &Pose) -> Vec<(Vector3, Vector3)> {
        Vec::new()
    }
}

/// Solid sphere centred on the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    pub radius: f64,
}

impl SphereShape {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl CollisionShape for SphereShape {
    fn validate(&self) -> Result<(), PhysicsError> {
        if self.radius > 0.0 && self.radius.is_finite() {
            Ok(())
        } else {
            Err(PhysicsError::InvalidShape(format!("sphere radius {} must be positive", self.radius)))
        }
    }

    fn inverse_inertia(&self, inverse_mass: f64) -> Matrix3 {
        // I = 2/5 m r^2
        let i = 2.5 * inverse_mass / (self.radius * self.radius);
        Matrix3::from_diagonal(Vector3::splat(i))
    }

    fn bounding_radius(&self) -> f64 {
        self.radius
    }

    fn collision_axes(&self, pose: &Pose, other: &dyn CollisionShape, other_pose: &Pose) -> Vec<Vector3> {
        let towards = other.closest_point(other_pose, pose.position) - pose.position;
        let axis = towards.normalized();
        if axis == Vector3::ZERO {
            // Centre inside the other shape: its own axes decide.
            return Vec::new();
        }
        vec![axis]
    }

    fn edge_directions(&self, _pose: &Pose) -> Vec<Vector3> {
        Vec::new()
    }

    fn closest_point(&self, pose: &Pose, point: Vector3) -> Vector3 {
        let offset = point - pose.position;
        if offset.length() <= self.radius {
            return point;
        }
        pose.position + offset.normalized() * self.radius
    }

    fn min_max_on_axis(&self, pose: &Pose, axis: Vector3) -> (Vector3, Vector3) {
        let n = axis.normalized();
        (pose.position - n * self.radius, pose.position + n * self.radius)
    }

    fn reference_face(&self, pose: &Pose, axis: Vector3) -> ContactFace {
        let n = axis.normalized();
        ContactFace {
            vertices: vec![pose.position + n * self.radius],
            normal: n,
            adjacent_planes: Vec::new(),
        }
    }

    fn debug_outline(&self, pose: &Pose) -> Vec<(Vector3, Vector3)> {
        const SEGMENTS: usize = 16;
        let mut lines = Vec::with_capacity(SEGMENTS * 3);
        let point = |u: Vector3, v: Vector3, i: usize| {
            let angle = i as f64 / SEGMENTS as f64 * std::f64::consts::TAU;
            pose.transform_point((u * angle.cos() + v * angle.sin()) * self.radius)
        };
        for (u, v) in [(Vector3::X, Vector3::Y), (Vector3::Y, Vector3::Z), (Vector3::Z, Vector3::X)] {
            for i in 0..SEGMENTS {
                lines.push((point(u, v, i), point(u, v, i + 1)));
            }
        }
        lines
    }
}

/// Oriented box described by its half extents along the body's local axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuboidShape {
    pub half_extents: Vector3,
}

impl CuboidShape {
    pub fn new(half_extents: Vector3) -> Self {
        Self { half_extents }
    }

    /// Cube with the given half width.
    pub fn cube(half_width: f64) -> Self {
        Self { half_extents: Vector3::splat(half_width) }
    }

    fn local_axis(i: usize) -> Vector3 {
        match i {
            0 => Vector3::X,
            1 => Vector3::Y,
            _ => Vector3::Z,
        }
    }

    fn corners(&self, pose: &Pose) -> [Vector3; 8] {
        let h = self.half_extents;
        let mut out = [Vector3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
            *corner = pose.transform_point(Vector3::new(sx * h.x, sy * h.y, sz * h.z));
        }
        out
    }
}

impl CollisionShape for CuboidShape {
    fn validate(&self) -> Result<(), PhysicsError> {
        let h = self.half_extents;
        if [h.x, h.y, h.z].iter().all(|e| *e > 0.0 && e.is_finite()) {
            Ok(())
        } else {
            Err(PhysicsError::InvalidShape(format!("cuboid half extents {:?} must be positive", h)))
        }
    }

    fn inverse_inertia(&self, inverse_mass: f64) -> Matrix3 {
        // I_x = m (h_y^2 + h_z^2) / 3 for half extents
        let h = self.half_extents;
        let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
        Matrix3::from_diagonal(Vector3::new(
            3.0 * inverse_mass / (y2 + z2),
            3.0 * inverse_mass / (x2 + z2),
            3.0 * inverse_mass / (x2 + y2),
        ))
    }

    fn bounding_radius(&self) -> f64 {
        self.half_extents.length()
    }

    fn collision_axes(&self, pose: &Pose, _other: &dyn CollisionShape, _other_pose: &Pose) -> Vec<Vector3> {
        (0..3).map(|i| pose.transform_vector(Self::local_axis(i))).collect()
    }

    fn edge_directions(&self, pose: &Pose) -> Vec<Vector3> {
        (0..3).map(|i| pose.transform_vector(Self::local_axis(i))).collect()
    }

    fn closest_point(&self, pose: &Pose, point: Vector3) -> Vector3 {
        let local = pose.inverse_transform_point(point);
        let h = self.half_extents;
        let clamped = Vector3::new(
            local.x.clamp(-h.x, h.x),
            local.y.clamp(-h.y, h.y),
            local.z.clamp(-h.z, h.z),
        );
        pose.transform_point(clamped)
    }

    fn min_max_on_axis(&self, pose: &Pose, axis: Vector3) -> (Vector3, Vector3) {
        let corners = self.corners(pose);
        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            let d = corner.dot(axis);
            if d < min.dot(axis) {
                min = *corner;
            }
            if d > max.dot(axis) {
                max = *corner;
            }
        }
        (min, max)
    }

    fn reference_face(&self, pose: &Pose, axis: Vector3) -> ContactFace {
        let local = pose.inverse_transform_vector(axis);
        let a = local.abs();
        let face_axis = if a.x >= a.y && a.x >= a.z {
            0
        } else if a.y >= a.z {
            1
        } else {
            2
        };
        let sign = if local[face_axis] >= 0.0 { 1.0 } else { -1.0 };
        let (u_axis, v_axis) = ((face_axis + 1) % 3, (face_axis + 2) % 3);

        let h = self.half_extents;
        let n_local = Self::local_axis(face_axis) * sign;
        let u = Self::local_axis(u_axis) * h[u_axis];
        let v = Self::local_axis(v_axis) * h[v_axis];
        let centre = n_local * h[face_axis];

        let vertices = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)]
            .iter()
            .map(|(su, sv)| pose.transform_point(centre + u * *su + v * *sv))
            .collect();

        let mut adjacent_planes = Vec::with_capacity(4);
        for side in [u_axis, v_axis] {
            for s in [1.0, -1.0] {
                let normal = pose.transform_vector(Self::local_axis(side) * s);
                let on_face = pose.transform_point(Self::local_axis(side) * (s * h[side]));
                adjacent_planes.push(Plane::from_point(normal, on_face));
            }
        }

        ContactFace {
            vertices,
            normal: pose.transform_vector(n_local),
            adjacent_planes,
        }
    }

    fn debug_outline(&self, pose: &Pose) -> Vec<(Vector3, Vector3)> {
        let c = self.corners(pose);
        let mut lines = Vec::with_capacity(12);
        for i in 0..8usize {
            for bit in [1usize, 2, 4] {
                if i & bit == 0 {
                    lines.push((c[i], c[i | bit]));
                }
            }
        }
        lines
    }
}
