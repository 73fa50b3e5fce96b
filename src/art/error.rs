// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use crate::db::DbError;
use crate::scene::SceneError;
use crate::view::ViewError;
use thiserror::Error;

/// Errors raised while translating a model into a renderer project
#[derive(Error, Debug)]
pub enum ArtError {
    #[error("No Region specified")]
    NoRegionSpecified,
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("View error: {0}")]
    View(#[from] ViewError),
    #[error("Scene error in region {region}: {source}")]
    Region {
        region: String,
        #[source]
        source: SceneError,
    },
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}
