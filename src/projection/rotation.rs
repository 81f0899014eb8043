use crate::foundation::math::Mat3;

/// Camera orientation for a (yaw, pitch) view direction, in radians.
///
/// Composed as `R = R_pitch · R_yaw`: yaw turns about the camera's vertical (y) axis first, then
/// pitch tilts about the horizontal (x) axis. There is no roll. Defined for every real angle.
pub fn rotation_matrix(yaw_rad: f64, pitch_rad: f64) -> Mat3 {
    let (sy, cy) = yaw_rad.sin_cos();
    let (sp, cp) = pitch_rad.sin_cos();

    let r_yaw = Mat3([[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]]);
    let r_pitch = Mat3([[1.0, 0.0, 0.0], [0.0, cp, -sp], [0.0, sp, cp]]);

    r_pitch.mul(&r_yaw)
}

#[cfg(test)]
#[path = "../../tests/unit/projection/rotation.rs"]
mod tests;
