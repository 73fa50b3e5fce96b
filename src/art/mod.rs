// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Art module - translation of a prepared model into a renderer project

mod compose;
mod context;
mod error;
mod region;

pub use compose::{camera_transform, Composition, SceneComposer, FILM_HEIGHT, FOCAL_LENGTH};
pub use context::{ArtContext, RenderOptions, DEFAULT_IMAGE_SIZE, DEFAULT_SAMPLES};
pub use error::ArtError;
pub use region::{
    ClusterNames, DisneyMaterialParams, GeometryParams, PhysicalSurfaceParams, RegionReport,
    RegionTranslator, OBJECT_MODEL, SURFACE_SHADER_NAME,
};
