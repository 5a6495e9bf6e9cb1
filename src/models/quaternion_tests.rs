use approx::assert_abs_diff_eq;
use std::f64::consts::PI;
use crate::assert_float_eq;
use crate::models::{Matrix3, Pose, Quaternion, Vector3};

#[test]
fn test_identity_leaves_vectors_unchanged() {
    let v = Vector3::new(1.0, -2.0, 3.0);
    assert_abs_diff_eq!(Quaternion::identity().rotate_vector(v), v, epsilon = 1e-12);
    assert!(Quaternion::identity().is_near_identity(1e-12));
}

#[test]
fn test_axis_angle_rotation() {
    let q = Quaternion::from_axis_angle(Vector3::Z, PI / 2.0);
    let rotated = q.rotate_vector(Vector3::X);
    assert_abs_diff_eq!(rotated, Vector3::Y, epsilon = 1e-12);
}

#[test]
fn test_zero_axis_gives_identity() {
    let q = Quaternion::from_axis_angle(Vector3::ZERO, 1.0);
    assert_eq!(q, Quaternion::identity());
}

#[test]
fn test_matrix_matches_vector_rotation() {
    let q = Quaternion::from_axis_angle(Vector3::new(1.0, 2.0, -0.5), 0.7);
    let v = Vector3::new(0.3, -1.2, 2.0);
    assert_abs_diff_eq!(q.to_matrix3() * v, q.rotate_vector(v), epsilon = 1e-12);
}

#[test]
fn test_rotation_matrix_is_orthonormal() {
    let r = Quaternion::from_axis_angle(Vector3::new(0.2, 1.0, 0.4), 1.3).to_matrix3();
    let product = r * r.transpose();
    for i in 0..3 {
        for j in 0..3 {
            let expected = Matrix3::IDENTITY.rows[i][j];
            assert_float_eq(product.rows[i][j], expected, 1e-12, None);
        }
    }
}

#[test]
fn test_integrate_stays_normalized_and_approximates_rotation() {
    let omega = Vector3::new(0.0, 0.0, 1.0);
    let dt = 1.0 / 600.0;
    let mut q = Quaternion::identity();
    for _ in 0..600 {
        q = q.integrate(omega, dt);
        assert_float_eq(q.magnitude(), 1.0, 1e-12, Some("orientation must stay unit length"));
    }
    // One second at 1 rad/s about z.
    let expected = Quaternion::from_axis_angle(Vector3::Z, 1.0);
    assert_abs_diff_eq!(q, expected, epsilon = 1e-3);
}

#[test]
fn test_pose_round_trips_points() {
    let pose = Pose::new(
        Vector3::new(1.0, 2.0, 3.0),
        Quaternion::from_axis_angle(Vector3::Y, 0.4),
    );
    let local = Vector3::new(0.5, -0.25, 2.0);
    let world = pose.transform_point(local);
    assert_abs_diff_eq!(pose.inverse_transform_point(world), local, epsilon = 1e-12);
}

#[test]
fn test_pose_matrix_is_column_major() {
    let pose = Pose::from_position(Vector3::new(4.0, 5.0, 6.0));
    let m = pose.to_matrix4();
    assert_eq!(&m[12..15], &[4.0, 5.0, 6.0]);
    assert_eq!(m[0], 1.0);
    assert_eq!(m[15], 1.0);
}
