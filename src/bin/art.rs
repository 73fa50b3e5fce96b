// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Art CLI

use anyhow::{Context, Result};
use clap::Parser;
use polyframe_art::cli::Reporter;
use polyframe_art::command::apply_script;
use polyframe_art::render;
use polyframe_art::{ArtConfig, ArtContext, Database, SceneComposer};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "art")]
#[command(about = "Render a CSG region database with appleseed", long_about = None)]
struct Cli {
    /// Geometry database (.toml or .json)
    #[arg(value_name = "DATABASE")]
    database: PathBuf,

    /// Top-level objects to render
    #[arg(value_name = "OBJECTS")]
    objects: Vec<String>,

    /// Render to the specified image file
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Square image size
    #[arg(short = 's', long)]
    size: Option<usize>,

    /// Image width in pixels
    #[arg(short = 'w', long)]
    width: Option<usize>,

    /// Image height in pixels
    #[arg(short = 'n', long)]
    height: Option<usize>,

    /// Azimuth in degrees
    #[arg(short = 'a', long, allow_negative_numbers = true)]
    azimuth: Option<f64>,

    /// Elevation in degrees
    #[arg(short = 'e', long, allow_negative_numbers = true)]
    elevation: Option<f64>,

    /// Twist in degrees
    #[arg(long, allow_negative_numbers = true)]
    twist: Option<f64>,

    /// View (pixel) aspect ratio (width/height)
    #[arg(short = 'V', long)]
    aspect: Option<f64>,

    /// Eye distance from the model, in view units
    #[arg(short = 'E', long)]
    eye_backoff: Option<f64>,

    /// World-space view size; derived from the model when omitted
    #[arg(long)]
    viewsize: Option<f64>,

    /// Semicolon-separated list of commands, e.g. "set samples=64"
    #[arg(short = 'c', long, value_name = "SCRIPT")]
    command: Option<String>,

    /// Write the appleseed project to this file
    #[arg(long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Configuration file (defaults to art.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the project file without running the renderer
    #[arg(long)]
    no_render: bool,

    /// Renderer executable
    #[arg(long, value_name = "PATH")]
    renderer: Option<String>,

    /// Extra renderer argument; may be repeated
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    renderer_args: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn apply_flags(cli: &Cli, config: &mut ArtConfig) {
    if let Some(size) = cli.size {
        config.width = size;
        config.height = size;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(azimuth) = cli.azimuth {
        config.view.azimuth = azimuth;
    }
    if let Some(elevation) = cli.elevation {
        config.view.elevation = elevation;
    }
    if let Some(twist) = cli.twist {
        config.view.twist = twist;
    }
    if let Some(aspect) = cli.aspect {
        config.view.aspect = aspect;
    }
    if let Some(eye_backoff) = cli.eye_backoff {
        config.view.eye_backoff = eye_backoff;
    }
    if cli.viewsize.is_some() {
        config.view.viewsize = cli.viewsize;
    }
    if let Some(renderer) = &cli.renderer {
        config.renderer = renderer.clone();
    }
    if !cli.renderer_args.is_empty() {
        config.renderer_args = cli.renderer_args.clone();
    }
    if cli.no_render {
        config.render = false;
    }
}

fn run(cli: Cli) -> Result<()> {
    info!("Polyframe Art v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ArtConfig::load(cli.config.as_deref())?;
    apply_flags(&cli, &mut config);

    if cli.objects.is_empty() {
        anyhow::bail!("No Region specified");
    }

    let mut options = config.render_options();
    if let Some(script) = &cli.command {
        for listing in apply_script(script, &mut options).context("Invalid -c command script")? {
            Reporter::report_parameters(&listing);
        }
    }

    let database_name = cli.database.display().to_string();
    let db = Database::from_file(&cli.database)
        .with_context(|| format!("building the database directory for [{}] FAILED", database_name))?;
    let rt = db
        .prepare(&cli.objects)
        .with_context(|| format!("loading the geometry for [{}...] FAILED", cli.objects[0]))?;
    Reporter::report_database(&database_name, db.title(), rt.stats());

    let start = Instant::now();
    let ctx = ArtContext::new(&rt, options)?;
    Reporter::report_view(ctx.view());

    let composition = SceneComposer::new(&ctx).build_project()?;
    Reporter::report_composition(&composition, start.elapsed());

    let scene_path = cli.scene.clone().unwrap_or_else(|| config.scene_path());
    let image_path = cli.output.clone().unwrap_or_else(|| config.image_path());

    if config.render {
        let renderer = config.renderer();
        render::render_project(&renderer, &composition.project, &scene_path, &image_path)?;
        Reporter::report_output(&scene_path, Some(&image_path));
    } else {
        render::write_project(&composition.project, &scene_path)?;
        Reporter::report_output(&scene_path, None);
    }

    Reporter::success("Done");
    Ok(())
}
