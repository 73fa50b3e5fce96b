// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Matrix4, Point3};

/// Tolerance used when deciding whether a scalar is effectively zero
pub const SMALL_FASTF: f64 = 1.0e-77;

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Check if a value is zero within [`SMALL_FASTF`]
pub fn is_zero(value: f64) -> bool {
    value.abs() < SMALL_FASTF
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Convert radians to degrees
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Build a rotation matrix from three Euler angles in degrees.
///
/// The angles rotate about X (`alpha`), Y (`beta`) and Z (`gamma`), and the
/// result is laid out row-major exactly as the raytracer's view code expects.
/// All-zero angles yield the identity.
pub fn mat_angles(alpha: f64, beta: f64, gamma: f64) -> Matrix4<f64> {
    if alpha == 0.0 && beta == 0.0 && gamma == 0.0 {
        return Matrix4::identity();
    }

    let alpha = deg_to_rad(alpha);
    let beta = deg_to_rad(beta);
    let gamma = deg_to_rad(gamma);

    let (salpha, calpha) = alpha.sin_cos();
    let cbeta = beta.cos();
    let (sgamma, cgamma) = gamma.sin_cos();

    // sin(180deg) is not exactly zero in floating point, and azimuth/elevation
    // recovered from the matrix would drift.
    let sbeta = if approx_eq(beta, std::f64::consts::PI, 1.0e-12) {
        0.0
    } else {
        beta.sin()
    };

    Matrix4::new(
        cbeta * cgamma,
        -cbeta * sgamma,
        sbeta,
        0.0,
        salpha * sbeta * cgamma + calpha * sgamma,
        -salpha * sbeta * sgamma + calpha * cgamma,
        -salpha * cbeta,
        0.0,
        salpha * sgamma - calpha * sbeta * cgamma,
        salpha * cgamma + calpha * sbeta * sgamma,
        calpha * cbeta,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
    )
}

/// Rotation about Z from a precomputed sine and cosine
pub fn mat_zrot(sinz: f64, cosz: f64) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m[(0, 0)] = cosz;
    m[(0, 1)] = -sinz;
    m[(1, 0)] = sinz;
    m[(1, 1)] = cosz;
    m
}

/// Apply a 4x4 matrix to a point, including the homogeneous divide.
///
/// Returns `None` when the resulting `w` is zero.
pub fn transform_point(m: &Matrix4<f64>, p: &Point3<f64>) -> Option<Point3<f64>> {
    Point3::from_homogeneous(m * p.to_homogeneous())
}
