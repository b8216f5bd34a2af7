//! Helper functions

use std::f64::consts::PI;
use nalgebra::{Isometry3, UnitQuaternion, Vector3};

/// Below this angle the rotation axis of a quaternion is treated as undefined (zero).
pub const NEAR_IDENTITY_ANGLE: f64 = 1e-3;

/// Wraps the angle into (-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI { wrapped - 2.0 * PI } else { wrapped }
}

/// Converts the rotation into the axis-angle (scaled axis) vector and returns it with the
/// signed angle. The angle is wrapped into (-PI, PI]; rotations smaller than
/// [`NEAR_IDENTITY_ANGLE`] give a zero vector as their axis is not well defined.
pub fn axis_angle(rotation: &UnitQuaternion<f64>) -> (Vector3<f64>, f64) {
    let q = rotation.quaternion();
    let sin_half = q.vector().norm();
    let angle = wrap_angle(2.0 * sin_half.atan2(q.w));
    if angle.abs() < NEAR_IDENTITY_ANGLE || sin_half == 0.0 {
        return (Vector3::zeros(), angle);
    }
    let axis = q.vector() / sin_half;
    (axis * angle, angle)
}

/// Converts joints in degrees to radians
pub fn as_radians(degrees: &[f64]) -> Vec<f64> {
    degrees.iter().map(|d| d.to_radians()).collect()
}

/// Print joint values, converting radians to degrees.
pub fn dump_joints(joints: &[f64]) {
    let row_str: Vec<String> = joints.iter().map(|q| format!("{:5.2}", q.to_degrees())).collect();
    println!("[{}]", row_str.join(" "));
}

pub fn dump_pose(isometry: &Isometry3<f64>) {
    // Extract translation components
    let translation = isometry.translation.vector;

    // Extract rotation components
    let rotation: UnitQuaternion<f64> = isometry.rotation;

    // Print translation and rotation
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.i, rotation.j, rotation.k, rotation.w
    );
}

/// formatting for YAML output
pub(crate) fn deg(x: &f64) -> String {
    if *x == 0.0 {
        return "0".to_string();
    }
    format!("deg({:.4})", x.to_degrees())
}

/// Translation and rotation distance between two poses.
pub fn pose_distance(ta: &Isometry3<f64>, tb: &Isometry3<f64>) -> (f64, f64) {
    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);
    (translation_distance, angular_distance)
}
