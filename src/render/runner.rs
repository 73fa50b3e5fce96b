// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Subprocess runner for the appleseed command line renderer

use crate::config::DEFAULT_RENDERER;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Runner for the external renderer executable
#[derive(Debug, Clone)]
pub struct ExternalRenderer {
    executable: PathBuf,
    extra_args: Vec<String>,
}

impl Default for ExternalRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDERER)
    }
}

impl ExternalRenderer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append an argument passed before the project path
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.extra_args
    }

    /// Check the renderer can be started
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Render `project` into `image`
    pub fn render(&self, project: &Path, image: &Path) -> Result<Duration> {
        if let Some(parent) = image.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
            }
        }

        let start = Instant::now();
        debug!(renderer = ?self.executable, project = ?project, "starting renderer");

        let status = Command::new(&self.executable)
            .args(&self.extra_args)
            .arg(project)
            .arg("--output")
            .arg(image)
            .status()
            .with_context(|| format!("Failed to execute renderer {:?}", self.executable))?;

        if !status.success() {
            bail!("Renderer exited with status: {}", status);
        }

        let elapsed = start.elapsed();
        info!(image = ?image, seconds = elapsed.as_secs_f64(), "render finished");
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ExternalRenderer::new(dir.path().join("no-such-renderer"));
        assert!(!renderer.is_available());
        let err = renderer
            .render(&dir.path().join("p.appleseed"), &dir.path().join("out/a.png"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to execute renderer"));
        assert!(dir.path().join("out").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExternalRenderer::new("false")
            .render(&dir.path().join("p.appleseed"), &dir.path().join("a.png"))
            .unwrap_err();
        assert!(err.to_string().contains("exited with status"));
    }

    #[cfg(unix)]
    #[test]
    fn test_extra_args_precede_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.png");
        // sh -c <script> <project> --output <image>: $0 is the project, $2 the image
        ExternalRenderer::new("sh")
            .with_arg("-c")
            .with_arg("test \"$1\" = --output && touch \"$2\"")
            .render(&dir.path().join("p.appleseed"), &image)
            .unwrap();
        assert!(image.is_file());
    }
}
