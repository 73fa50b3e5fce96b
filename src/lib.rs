// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Art
//!
//! Translates a CSG region database into an appleseed renderer project with
//! an automatically framed camera.

pub mod art;
pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod geometry;
pub mod render;
pub mod scene;
pub mod utils;
pub mod view;

pub use art::{ArtContext, ArtError, Composition, RegionReport, RenderOptions, SceneComposer};
pub use config::ArtConfig;
pub use db::{Database, RaytraceContext};
pub use geometry::{BoundingBox, Primitive};
pub use scene::{project_to_xml, Project};
pub use view::{ViewFrame, ViewParams};

use std::path::Path;

/// Translate the named top-level objects of `db` into a renderer project
pub fn translate<S: AsRef<str>>(
    db: &Database,
    objects: &[S],
    options: RenderOptions,
) -> Result<Composition, ArtError> {
    if objects.is_empty() {
        return Err(ArtError::NoRegionSpecified);
    }
    let rt = db.prepare(objects)?;
    let ctx = ArtContext::new(&rt, options)?;
    SceneComposer::new(&ctx).build_project()
}

/// Load a database file and translate the named top-level objects
pub fn translate_file<S: AsRef<str>>(
    path: impl AsRef<Path>,
    objects: &[S],
    options: RenderOptions,
) -> Result<Composition, ArtError> {
    let db = Database::from_file(path)?;
    translate(&db, objects, options)
}
