// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render module - project output and the external renderer

mod runner;

pub use runner::ExternalRenderer;

use crate::scene::{write_project_file, Project};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

/// Write the project file, replacing any previous one
pub fn write_project(project: &Project, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_project_file(project, path)
        .with_context(|| format!("Failed to write project file: {:?}", path))?;
    info!(path = ?path, "project written");
    Ok(())
}

/// Open the rendered image and check it matches the frame resolution
pub fn verify_image(path: impl AsRef<Path>, expected: (usize, usize)) -> Result<()> {
    let path = path.as_ref();
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("Failed to read rendered image: {:?}", path))?;
    if (width as usize, height as usize) != expected {
        bail!(
            "Rendered image {:?} is {}x{}, expected {}x{}",
            path,
            width,
            height,
            expected.0,
            expected.1
        );
    }
    Ok(())
}

/// Write `project` to `scene_path`, render it to `image_path` and check the
/// result
pub fn render_project(
    renderer: &ExternalRenderer,
    project: &Project,
    scene_path: &Path,
    image_path: &Path,
) -> Result<()> {
    write_project(project, scene_path)?;
    renderer.render(scene_path, image_path)?;
    if let Some(frame) = project.frame() {
        verify_image(image_path, frame.resolution)?;
    }
    Ok(())
}
