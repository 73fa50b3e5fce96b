// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render configuration file and environment overrides

use crate::art::{RenderOptions, DEFAULT_IMAGE_SIZE, DEFAULT_SAMPLES};
use crate::render::ExternalRenderer;
use crate::view::ViewParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "art.toml";

/// Renderer executable used when none is configured
pub const DEFAULT_RENDERER: &str = "appleseed.cli";

/// Settings for a render, as read from `art.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtConfig {
    pub project_name: String,
    /// appleseed install root; adds its shader directories to the search paths
    pub appleseed_root: Option<PathBuf>,
    pub samples: u32,
    pub width: usize,
    pub height: usize,
    /// Directory receiving the image and the project file
    pub output_dir: PathBuf,
    pub image_name: String,
    pub scene_name: String,
    /// Renderer command line executable
    pub renderer: String,
    /// Arguments passed to the renderer before the project path
    pub renderer_args: Vec<String>,
    /// Run the renderer after writing the project
    pub render: bool,
    pub view: ViewParams,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            project_name: "art".to_string(),
            appleseed_root: None,
            samples: DEFAULT_SAMPLES,
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            view: ViewParams::default(),
            output_dir: PathBuf::from("output"),
            image_name: "art.png".to_string(),
            scene_name: "objects.appleseed".to_string(),
            renderer: DEFAULT_RENDERER.to_string(),
            renderer_args: Vec::new(),
            render: true,
        }
    }
}

impl ArtConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ArtConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load the given file, or `art.toml` when present, then apply
    /// environment variable overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `APPLESEED_ROOT`, `ART_SAMPLES`, `ART_OUTPUT_DIR` and
    /// `ART_RENDERER` from the given lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("APPLESEED_ROOT") {
            self.appleseed_root = Some(PathBuf::from(root));
        }

        if let Some(samples) = lookup("ART_SAMPLES") {
            match samples.parse() {
                Ok(samples) => self.samples = samples,
                Err(_) => warn!(value = %samples, "ignoring invalid ART_SAMPLES"),
            }
        }

        if let Some(output_dir) = lookup("ART_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(renderer) = lookup("ART_RENDERER") {
            self.renderer = renderer;
        }

        debug!(config = ?self, "configuration loaded");
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(&self.image_name)
    }

    pub fn scene_path(&self) -> PathBuf {
        self.output_dir.join(&self.scene_name)
    }

    /// Renderer configured by `renderer` and `renderer_args`
    pub fn renderer(&self) -> ExternalRenderer {
        self.renderer_args
            .iter()
            .fold(ExternalRenderer::new(&self.renderer), |r, arg| r.with_arg(arg.clone()))
    }

    /// Options for one render
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            project_name: self.project_name.clone(),
            width: self.width,
            height: self.height,
            samples: self.samples,
            view: self.view,
            appleseed_root: self.appleseed_root.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ArtConfig::default();
        assert_eq!(config.image_path(), PathBuf::from("output/art.png"));
        assert_eq!(config.scene_path(), PathBuf::from("output/objects.appleseed"));
        assert_eq!(config.samples, 25);
        assert_eq!(config.view.azimuth, 35.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.toml");
        std::fs::write(
            &path,
            "samples = 4\nwidth = 320\n\n[view]\nazimuth = 90.0\n",
        )
        .unwrap();
        let config = ArtConfig::from_file(&path).unwrap();
        assert_eq!(config.samples, 4);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 512);
        assert_eq!(config.view.azimuth, 90.0);
        assert_eq!(config.view.elevation, 25.0);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("APPLESEED_ROOT", "/opt/appleseed"),
            ("ART_SAMPLES", "64"),
            ("ART_OUTPUT_DIR", "renders"),
        ]
        .into_iter()
        .collect();
        let mut config = ArtConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.appleseed_root, Some(PathBuf::from("/opt/appleseed")));
        assert_eq!(config.samples, 64);
        assert_eq!(config.image_path(), PathBuf::from("renders/art.png"));
        assert_eq!(config.renderer, DEFAULT_RENDERER);
    }

    #[test]
    fn test_invalid_sample_override_ignored() {
        let mut config = ArtConfig::default();
        config.apply_overrides(|key| (key == "ART_SAMPLES").then(|| "many".to_string()));
        assert_eq!(config.samples, DEFAULT_SAMPLES);
    }

    #[test]
    fn test_renderer_arguments() {
        let config: ArtConfig = toml::from_str(
            r#"
renderer = "/opt/appleseed/bin/appleseed.cli"
renderer_args = ["--threads", "4"]
"#,
        )
        .unwrap();
        let renderer = config.renderer();
        assert_eq!(renderer.executable(), Path::new("/opt/appleseed/bin/appleseed.cli"));
        assert_eq!(renderer.args(), ["--threads", "4"]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.toml");
        let mut config = ArtConfig::default();
        config.render = false;
        config.renderer_args = vec!["--threads".into(), "2".into()];
        config.save(&path).unwrap();
        assert_eq!(ArtConfig::from_file(&path).unwrap(), config);
    }
}
