use super::*;
use crate::foundation::math::Vec3;
use std::f64::consts::{FRAC_PI_2, PI};

fn assert_close(a: Vec3, b: Vec3) {
    assert!(
        (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12,
        "{a:?} != {b:?}"
    );
}

#[test]
fn zero_angles_give_identity() {
    let r = rotation_matrix(0.0, 0.0);
    assert_eq!(r, Mat3::IDENTITY);
}

#[test]
fn result_is_orthonormal_for_arbitrary_angles() {
    for &(yaw, pitch) in &[(0.3, 1.1), (-2.0, 0.2), (7.5, -3.3), (PI, FRAC_PI_2)] {
        let r = rotation_matrix(yaw, pitch);
        let rt_r = r.transpose().mul(&r);
        for i in 0..3 {
            for j in 0..3 {
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((rt_r.0[i][j] - want).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn pitch_is_applied_after_yaw() {
    // Optical axis (0,0,1): yaw 90° swings it to +x, a following pitch about x leaves it there.
    let r = rotation_matrix(FRAC_PI_2, FRAC_PI_2);
    assert_close(r.mul_vec(Vec3::new(0.0, 0.0, 1.0)), Vec3::new(1.0, 0.0, 0.0));

    // Pitch 90° alone tilts the optical axis onto -y.
    let r = rotation_matrix(0.0, FRAC_PI_2);
    assert_close(r.mul_vec(Vec3::new(0.0, 0.0, 1.0)), Vec3::new(0.0, -1.0, 0.0));
}

#[test]
fn angles_are_periodic() {
    let a = rotation_matrix(0.4, 1.2);
    let b = rotation_matrix(0.4 + 2.0 * PI, 1.2 - 2.0 * PI);
    for i in 0..3 {
        for j in 0..3 {
            assert!((a.0[i][j] - b.0[i][j]).abs() < 1e-12);
        }
    }
}
