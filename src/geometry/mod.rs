// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - primitive solids and bounding volumes

mod bbox;
mod primitives;

pub use bbox::BoundingBox;
pub use primitives::Primitive;
