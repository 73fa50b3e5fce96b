// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive solids and their bounding extents

use super::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Primitive solids a database may contain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// Axis-aligned rectangular parallelepiped
    Rpp { min: [f64; 3], max: [f64; 3] },
    /// Sphere
    #[serde(rename = "sph")]
    Sphere { center: [f64; 3], radius: f64 },
    /// Right circular cylinder from `base` along `height`
    Rcc {
        base: [f64; 3],
        height: [f64; 3],
        radius: f64,
    },
    /// Arbitrary convex solid with eight vertices
    Arb8 { points: [[f64; 3]; 8] },
    /// Half-space `{ p : normal · p <= distance }`, never bounded
    #[serde(rename = "half")]
    HalfSpace { normal: [f64; 3], distance: f64 },
}

impl Primitive {
    pub fn rpp(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::Rpp { min, max }
    }

    pub fn sphere(center: [f64; 3], radius: f64) -> Self {
        Self::Sphere { center, radius }
    }

    pub fn rcc(base: [f64; 3], height: [f64; 3], radius: f64) -> Self {
        Self::Rcc {
            base,
            height,
            radius,
        }
    }

    /// Short type tag, as used in database listings
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rpp { .. } => "rpp",
            Self::Sphere { .. } => "sph",
            Self::Rcc { .. } => "rcc",
            Self::Arb8 { .. } => "arb8",
            Self::HalfSpace { .. } => "half",
        }
    }

    /// Bounding box in the primitive's local coordinates
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Self::Rpp { min, max } => BoundingBox::new(Point3::from(*min), Point3::from(*max)),

            Self::Sphere { center, radius } => {
                let c = Point3::from(*center);
                let r = Vector3::repeat(radius.abs());
                BoundingBox::new(c - r, c + r)
            }

            Self::Rcc {
                base,
                height,
                radius,
            } => rcc_bounds(Point3::from(*base), Vector3::from(*height), radius.abs()),

            Self::Arb8 { points } => {
                let mut bbox = BoundingBox::empty();
                for p in points {
                    bbox.expand_to_include(&Point3::from(*p));
                }
                bbox
            }

            Self::HalfSpace { .. } => BoundingBox::infinite(),
        }
    }
}

/// Tight box of a cylinder: each end disc extends `r * sqrt(1 - n_i^2)` on
/// axis `i`, where `n` is the unit axis direction.
fn rcc_bounds(base: Point3<f64>, height: Vector3<f64>, radius: f64) -> BoundingBox {
    let top = base + height;
    let len = height.norm();
    let extent = if len > 0.0 {
        let n = height / len;
        Vector3::new(
            radius * (1.0 - n.x * n.x).max(0.0).sqrt(),
            radius * (1.0 - n.y * n.y).max(0.0).sqrt(),
            radius * (1.0 - n.z * n.z).max(0.0).sqrt(),
        )
    } else {
        Vector3::repeat(radius)
    };

    let mut bbox = BoundingBox::empty();
    bbox.expand_to_include(&(base - extent));
    bbox.expand_to_include(&(base + extent));
    bbox.expand_to_include(&(top - extent));
    bbox.expand_to_include(&(top + extent));
    bbox
}
