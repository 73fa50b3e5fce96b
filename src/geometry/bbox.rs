// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::utils::math::transform_point;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// An empty box: any point expands it to exactly that point
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// A box covering all of space
    pub fn infinite() -> Self {
        Self {
            min: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            max: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        }
    }

    /// The unit box `[-1, 1]` on every axis
    pub fn unit() -> Self {
        Self {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Overlap of both boxes; inverted when they are disjoint
    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        }
    }

    /// Transform all eight corners and re-fit an axis-aligned box.
    ///
    /// Unbounded or empty boxes are returned unchanged.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> BoundingBox {
        if !self.is_finite() || self.is_inverted() {
            return *self;
        }
        let mut out = BoundingBox::empty();
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            match transform_point(matrix, &corner) {
                Some(p) => out.expand_to_include(&p),
                None => return BoundingBox::infinite(),
            }
        }
        out
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Length of the min-to-max diagonal
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// True when any axis has `min > max`
    pub fn is_inverted(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Produce a finite, integer-aligned box suitable for view framing.
    ///
    /// Unbounded, empty or inverted axes become `[-1, 1]`. Minimums are then
    /// floored and maximums ceiled; an axis left with zero extent grows its
    /// maximum by one unit.
    pub fn normalize(&self) -> BoundingBox {
        let mut min = self.min;
        let mut max = self.max;

        for axis in 0..3 {
            let (lo, hi) = (min[axis], max[axis]);
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                warn!(
                    axis,
                    min = lo,
                    max = hi,
                    "infinite model bounds? setting a unit extent"
                );
                min[axis] = -1.0;
                max[axis] = 1.0;
            }

            min[axis] = min[axis].floor();
            max[axis] = max[axis].ceil();

            if min[axis] == max[axis] {
                max[axis] = min[axis] + 1.0;
            }
        }

        BoundingBox { min, max }
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() < tolerance
                && (self.max[i] - other.max[i]).abs() < tolerance
        })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}
