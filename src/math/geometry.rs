use nalgebra::{Rotation3, Unit, Vector3};

use std::f64::consts::TAU;

/// Wraps an angle into [0, 2pi).
///
/// `rem_euclid` can round up to exactly 2pi for tiny negative inputs, so that
/// case is folded back onto zero.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Rotates `v` by `angle` radians around `axis`, right-handed.
pub fn rotate_about(v: &Vector3<f32>, axis: &Unit<Vector3<f32>>, angle: f32) -> Vector3<f32> {
    Rotation3::from_axis_angle(axis, angle) * v
}

/// Returns the unit vector pointing along `(cos yaw cos pitch, sin pitch, sin yaw cos pitch)`.
pub fn direction_from_angles(yaw: f32, pitch: f32) -> Vector3<f32> {
    Vector3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
}
