use crate::models::{CollisionShape, ContactFace, Plane, Pose, Vector3};

/// Two unit axes closer than this (in `1 - |cos|`) count as the same axis.
const AXIS_DUPLICATE_TOLERANCE: f64 = 1e-6;
/// Edge cross products shorter than this come from parallel edges and are skipped.
const PARALLEL_EDGE_TOLERANCE: f64 = 1e-6;

/// Result of a separating axis test that found an overlap.
///
/// `normal` points from shape A toward shape B and `penetration` is signed and
/// non-positive; `point` is a representative point on the reference face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionData {
    pub normal: Vector3,
    pub penetration: f64,
    pub point: Vector3,
}

/// One contact produced by clipping: the touching point on each body and its depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    pub point_on_a: Vector3,
    pub point_on_b: Vector3,
    pub penetration: f64,
}

fn push_unique_axis(axes: &mut Vec<Vector3>, axis: Vector3) {
    let axis = axis.normalized();
    if axis == Vector3::ZERO {
        return;
    }
    if axes.iter().any(|existing| existing.dot(axis).abs() >= 1.0 - AXIS_DUPLICATE_TOLERANCE) {
        return;
    }
    axes.push(axis);
}

/// Every distinct axis the separating axis test has to try for this pair.
pub fn candidate_axes(
    shape_a: &dyn CollisionShape,
    pose_a: &Pose,
    shape_b: &dyn CollisionShape,
    pose_b: &Pose,
) -> Vec<Vector3> {
    let mut axes = Vec::new();
    for axis in shape_a.collision_axes(pose_a, shape_b, pose_b) {
        push_unique_axis(&mut axes, axis);
    }
    for axis in shape_b.collision_axes(pose_b, shape_a, pose_a) {
        push_unique_axis(&mut axes, axis);
    }

    let edges_b = shape_b.edge_directions(pose_b);
    for edge_a in shape_a.edge_directions(pose_a) {
        for edge_b in &edges_b {
            let cross = edge_a.cross(*edge_b);
            if cross.length() > PARALLEL_EDGE_TOLERANCE {
                push_unique_axis(&mut axes, cross);
            }
        }
    }

    if axes.is_empty() {
        // Concentric curved shapes offer no direction at all.
        axes.push(Vector3::X);
    }
    axes
}

/// Projects both shapes on `axis` and reports the overlap, if any.
///
/// With A's interval `[a_min, a_max]` and B's `[b_min, b_max]`, an overlap where B
/// starts inside A yields `axis` as the normal; B ending inside A yields `-axis`.
pub fn check_collision_axis(
    axis: Vector3,
    shape_a: &dyn CollisionShape,
    pose_a: &Pose,
    shape_b: &dyn CollisionShape,
    pose_b: &Pose,
) -> Option<CollisionData> {
    let (min_a, max_a) = shape_a.min_max_on_axis(pose_a, axis);
    let (min_b, max_b) = shape_b.min_max_on_axis(pose_b, axis);

    let a = axis.dot(min_a);
    let b = axis.dot(max_a);
    let c = axis.dot(min_b);
    let d = axis.dot(max_b);

    if a <= c && b >= c {
        let penetration = c - b;
        return Some(CollisionData {
            normal: axis,
            penetration,
            point: max_a + axis * penetration,
        });
    }

    if c <= a && d >= a {
        let normal = -axis;
        let penetration = a - d;
        return Some(CollisionData {
            normal,
            penetration,
            point: min_a + normal * penetration,
        });
    }

    None
}

/// Separating axis test between two convex shapes.
///
/// # Returns
/// `None` as soon as one axis separates the shapes, otherwise the axis of least
/// penetration.
///
/// # Example
/// ```
/// use rs_rigid::interactions::detect_collision;
/// use rs_rigid::models::{Pose, SphereShape, Vector3};
///
/// let a = SphereShape::new(1.0);
/// let b = SphereShape::new(1.0);
/// let hit = detect_collision(
///     &a, &Pose::from_position(Vector3::ZERO),
///     &b, &Pose::from_position(Vector3::new(1.5, 0.0, 0.0)),
/// ).unwrap();
/// assert!((hit.penetration + 0.5).abs() < 1e-12);
/// assert!((hit.normal.x - 1.0).abs() < 1e-12);
/// ```
pub fn detect_collision(
    shape_a: &dyn CollisionShape,
    pose_a: &Pose,
    shape_b: &dyn CollisionShape,
    pose_b: &Pose,
) -> Option<CollisionData> {
    let mut best: Option<CollisionData> = None;
    for axis in candidate_axes(shape_a, pose_a, shape_b, pose_b) {
        let data = check_collision_axis(axis, shape_a, pose_a, shape_b, pose_b)?;
        if best.map_or(true, |current| data.penetration > current.penetration) {
            best = Some(data);
        }
    }
    best
}

/// Clips a closed polygon against each plane in turn, keeping the inside part.
pub fn sutherland_hodgman_clip(polygon: &[Vector3], planes: &[Plane]) -> Vec<Vector3> {
    let mut output = polygon.to_vec();
    for plane in planes {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut start = input[input.len() - 1];
        for &end in &input {
            let start_in = plane.signed_distance(start) <= 0.0;
            let end_in = plane.signed_distance(end) <= 0.0;
            if start_in && end_in {
                output.push(end);
            } else if start_in && !end_in {
                output.push(plane_edge_intersection(plane, start, end));
            } else if !start_in && end_in {
                output.push(plane_edge_intersection(plane, start, end));
                output.push(end);
            }
            start = end;
        }
    }
    output
}

fn plane_edge_intersection(plane: &Plane, start: Vector3, end: Vector3) -> Vector3 {
    let ds = plane.signed_distance(start);
    let de = plane.signed_distance(end);
    let t = ds / (ds - de);
    start + (end - start) * t
}

/// Builds the contact points for an overlap found by [`detect_collision`].
///
/// Curved features contribute a single point. Two faces are resolved by clipping the
/// incident face (the one less aligned with the normal) against the side planes of
/// the reference face and keeping the points below the reference face.
pub fn generate_contacts(
    shape_a: &dyn CollisionShape,
    pose_a: &Pose,
    shape_b: &dyn CollisionShape,
    pose_b: &Pose,
    data: &CollisionData,
) -> Vec<ContactGeometry> {
    let n = data.normal;
    let face_a = shape_a.reference_face(pose_a, n);
    let face_b = shape_b.reference_face(pose_b, -n);

    if face_a.vertices.is_empty() || face_b.vertices.is_empty() {
        return Vec::new();
    }
    if face_a.vertices.len() == 1 {
        let v = face_a.vertices[0];
        return vec![ContactGeometry { point_on_a: v, point_on_b: v + n * data.penetration, penetration: data.penetration }];
    }
    if face_b.vertices.len() == 1 {
        let v = face_b.vertices[0];
        return vec![ContactGeometry { point_on_a: v - n * data.penetration, point_on_b: v, penetration: data.penetration }];
    }

    let flipped = n.dot(face_a.normal).abs() < n.dot(face_b.normal).abs();
    let (reference, incident) = if flipped { (&face_b, &face_a) } else { (&face_a, &face_b) };

    let contacts = clip_face(reference, incident, flipped);
    if contacts.is_empty() {
        let on_b = data.point;
        return vec![ContactGeometry { point_on_a: on_b - n * data.penetration, point_on_b: on_b, penetration: data.penetration }];
    }
    contacts
}

fn clip_face(reference: &ContactFace, incident: &ContactFace, reference_is_b: bool) -> Vec<ContactGeometry> {
    let clipped = sutherland_hodgman_clip(&incident.vertices, &reference.adjacent_planes);
    let face_plane = Plane::from_point(reference.normal, reference.vertices[0]);

    clipped
        .into_iter()
        .filter_map(|p| {
            let depth = face_plane.signed_distance(p);
            if depth > 0.0 {
                return None;
            }
            let on_reference = p - reference.normal * depth;
            Some(if reference_is_b {
                ContactGeometry { point_on_a: p, point_on_b: on_reference, penetration: depth }
            } else {
                ContactGeometry { point_on_a: on_reference, point_on_b: p, penetration: depth }
            })
        })
        .collect()
}
