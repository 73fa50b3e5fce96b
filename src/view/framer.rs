// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Automatic view framing from azimuth, elevation and model extents

use crate::db::RaytraceContext;
use crate::geometry::BoundingBox;
use crate::utils::math::{deg_to_rad, is_zero, mat_angles, mat_zrot, transform_point};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// View size used whenever the computed one is degenerate
pub const DEFAULT_VIEWSIZE: f64 = 2.0;

/// Default distance from the eye to the view centre, in view units
pub const DEFAULT_EYE_BACKOFF: f64 = 1.414;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("no primitives active")]
    NoPrimitives,
    #[error("no regions active")]
    NoRegions,
    #[error("model-to-view matrix is singular")]
    Singular,
}

/// Caller-supplied viewing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    /// Degrees about +Z, measured from +X
    pub azimuth: f64,
    /// Degrees above the XY plane
    pub elevation: f64,
    /// Degrees of roll about the view direction
    pub twist: f64,
    /// World-space diameter mapped onto the image; derived from the model
    /// when unset or not positive
    pub viewsize: Option<f64>,
    /// Pixel aspect ratio (width / height)
    pub aspect: f64,
    pub eye_backoff: f64,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            azimuth: 35.0,
            elevation: 25.0,
            twist: 0.0,
            viewsize: None,
            aspect: 1.0,
            eye_backoff: DEFAULT_EYE_BACKOFF,
        }
    }
}

/// Result of framing: transforms, eye and the box they were derived from
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub model2view: Matrix4<f64>,
    pub view2model: Matrix4<f64>,
    pub eye_model: Point3<f64>,
    pub viewsize: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub bounds: BoundingBox,
}

/// Frame the whole prepared model.
///
/// Refuses models without solids or regions, normalizes the model box and
/// derives the view from it.
pub fn frame_view(rt: &RaytraceContext<'_>, params: &ViewParams) -> Result<ViewFrame, ViewError> {
    let stats = rt.stats();
    if stats.nsolids == 0 {
        return Err(ViewError::NoPrimitives);
    }
    if stats.nregions == 0 {
        return Err(ViewError::NoRegions);
    }

    let bounds = rt.model_bounds().normalize();
    frame_bounds(&bounds, params)
}

/// Derive the view transforms for an already normalized box
pub fn frame_bounds(bounds: &BoundingBox, params: &ViewParams) -> Result<ViewFrame, ViewError> {
    let mut viewrotscale = mat_angles(270.0 + params.elevation, 0.0, 270.0 - params.azimuth);
    if params.twist != 0.0 {
        let twist = -deg_to_rad(params.twist);
        viewrotscale = mat_zrot(twist.sin(), twist.cos()) * viewrotscale;
    }

    // Look at the center of the model
    let center = bounds.center();
    let to_eye = Matrix4::new_translation(&Vector3::new(-center.x, -center.y, -center.z));

    let mut viewsize = match params.viewsize {
        Some(v) if v > 0.0 => v,
        _ => {
            let mut v = bounds.diagonal();
            if params.aspect > 1.0 {
                // don't clip any of the image when autoscaling
                v *= params.aspect;
            }
            v
        }
    };

    if !viewsize.is_finite() || viewsize < 0.0 || is_zero(viewsize) {
        viewsize = DEFAULT_VIEWSIZE;
    }

    viewrotscale[(3, 3)] = 0.5 * viewsize;
    let model2view = viewrotscale * to_eye;
    let view2model = model2view.try_inverse().ok_or(ViewError::Singular)?;
    let eye_model = transform_point(&view2model, &Point3::new(0.0, 0.0, params.eye_backoff))
        .ok_or(ViewError::Singular)?;

    debug!(
        viewsize,
        eye = ?eye_model,
        azimuth = params.azimuth,
        elevation = params.elevation,
        "view framed"
    );

    Ok(ViewFrame {
        model2view,
        view2model,
        eye_model,
        viewsize,
        azimuth: params.azimuth,
        elevation: params.elevation,
        bounds: *bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_params(azimuth: f64, elevation: f64) -> ViewParams {
        ViewParams {
            azimuth,
            elevation,
            ..ViewParams::default()
        }
    }

    #[test]
    fn test_inverse_pair_is_identity() {
        let bounds = BoundingBox::new(Point3::new(-3.0, 0.0, 2.0), Point3::new(7.0, 4.0, 9.0));
        for az in (-180..=360).step_by(35) {
            for el in (-90..=90).step_by(15) {
                let frame = frame_bounds(&bounds, &unit_params(az as f64, el as f64)).unwrap();
                let product = frame.model2view * frame.view2model;
                assert_relative_eq!(product, Matrix4::identity(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_unit_box_viewsize_is_diagonal() {
        let frame = frame_bounds(&BoundingBox::unit(), &unit_params(35.0, 25.0)).unwrap();
        assert_relative_eq!(frame.viewsize, 2.0 * 3f64.sqrt(), epsilon = 1e-12);

        let distance = (frame.eye_model - Point3::origin()).norm();
        assert_relative_eq!(distance, DEFAULT_EYE_BACKOFF * 3f64.sqrt(), epsilon = 1e-9);

        let back = transform_point(&frame.model2view, &frame.eye_model).unwrap();
        assert_relative_eq!(back, Point3::new(0.0, 0.0, DEFAULT_EYE_BACKOFF), epsilon = 1e-9);
    }

    #[test]
    fn test_point_box_falls_back_to_default_size() {
        let p = Point3::new(5.0, 5.0, 5.0);
        let frame = frame_bounds(&BoundingBox::new(p, p), &ViewParams::default()).unwrap();
        assert_eq!(frame.viewsize, DEFAULT_VIEWSIZE);
    }

    #[test]
    fn test_override_and_aspect() {
        let params = ViewParams {
            viewsize: Some(10.0),
            aspect: 2.0,
            ..ViewParams::default()
        };
        assert_eq!(frame_bounds(&BoundingBox::unit(), &params).unwrap().viewsize, 10.0);

        let params = ViewParams {
            viewsize: Some(-1.0),
            aspect: 2.0,
            ..ViewParams::default()
        };
        let frame = frame_bounds(&BoundingBox::unit(), &params).unwrap();
        assert_relative_eq!(frame.viewsize, 4.0 * 3f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_eye_direction_follows_angles() {
        let b = BoundingBox::unit();
        let eye = frame_bounds(&b, &unit_params(0.0, 0.0)).unwrap().eye_model;
        assert!(eye.x > 0.0);
        assert_relative_eq!(eye.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(eye.z, 0.0, epsilon = 1e-9);

        let eye = frame_bounds(&b, &unit_params(90.0, 0.0)).unwrap().eye_model;
        assert!(eye.y > 0.0);
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-9);

        let eye = frame_bounds(&b, &unit_params(0.0, 90.0)).unwrap().eye_model;
        assert!(eye.z > 0.0);
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_twist_keeps_eye_position() {
        let b = BoundingBox::unit();
        let plain = frame_bounds(&b, &unit_params(35.0, 25.0)).unwrap();
        let twisted = frame_bounds(
            &b,
            &ViewParams {
                twist: 30.0,
                ..unit_params(35.0, 25.0)
            },
        )
        .unwrap();
        assert_relative_eq!(plain.eye_model, twisted.eye_model, epsilon = 1e-9);
        assert!((plain.model2view - twisted.model2view).abs().max() > 1e-3);
    }
}
