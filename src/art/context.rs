// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-render state shared by the translator and the composer

use super::ArtError;
use crate::db::{RaytraceContext, Resource};
use crate::view::{frame_view, ViewFrame, ViewParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Image size used when a dimension is left at zero
pub const DEFAULT_IMAGE_SIZE: usize = 512;

/// Default uniform pixel sampler sample count
pub const DEFAULT_SAMPLES: u32 = 25;

/// Options for one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub project_name: String,
    pub width: usize,
    pub height: usize,
    pub samples: u32,
    pub view: ViewParams,
    /// appleseed install whose shader directories are searched
    pub appleseed_root: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            project_name: "art".to_string(),
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            samples: DEFAULT_SAMPLES,
            view: ViewParams::default(),
            appleseed_root: None,
        }
    }
}

impl RenderOptions {
    /// Width and height with zero replaced by the default size
    pub fn resolution(&self) -> (usize, usize) {
        let pick = |v: usize| if v == 0 { DEFAULT_IMAGE_SIZE } else { v };
        (pick(self.width), pick(self.height))
    }
}

/// Everything a render needs: options, the prepared model and its framing
pub struct ArtContext<'rt, 'db> {
    options: RenderOptions,
    rt: &'rt RaytraceContext<'db>,
    view: ViewFrame,
}

impl<'rt, 'db> ArtContext<'rt, 'db> {
    /// Frame the prepared model. Fails when it has no solids or regions.
    pub fn new(rt: &'rt RaytraceContext<'db>, options: RenderOptions) -> Result<Self, ArtError> {
        let view = frame_view(rt, &options.view)?;
        info!(
            "View model: ({:.6}, {:.6}, {:.6})",
            view.eye_model.x, -view.eye_model.z, view.eye_model.y
        );
        Ok(Self { options, rt, view })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn raytrace(&self) -> &'rt RaytraceContext<'db> {
        self.rt
    }

    pub fn view(&self) -> &ViewFrame {
        &self.view
    }

    /// Resource slot used by the single-threaded translator
    pub fn resource(&self) -> &'rt Resource {
        self.rt.resources().primary()
    }
}
