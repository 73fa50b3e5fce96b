// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::art::{Composition, RegionReport};
use crate::db::PrepStats;
use crate::view::ViewFrame;
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the prepared database
    pub fn report_database(file: &str, title: &str, stats: PrepStats) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Database:".bold(), file.cyan());
        if !title.is_empty() {
            println!("  {} {}", "Title:".bright_black(), title);
        }
        println!(
            "  {} {}   {} {}",
            "Solids:".bright_black(),
            stats.nsolids.to_string().cyan(),
            "Regions:".bright_black(),
            stats.nregions.to_string().cyan()
        );
    }

    /// Report the camera placement
    pub fn report_view(view: &ViewFrame) {
        println!(
            "  {} az {:.1} el {:.1}   {} {:.3}",
            "View:".bright_black(),
            view.azimuth,
            view.elevation,
            "Size:".bright_black(),
            view.viewsize
        );
        println!(
            "  {} ({:.6}, {:.6}, {:.6})",
            "Eye:".bright_black(),
            view.eye_model.x,
            view.eye_model.y,
            view.eye_model.z
        );
    }

    /// Report every translated region and the ones skipped
    pub fn report_composition(composition: &Composition, duration: Duration) {
        println!("{}", "━".repeat(80).bright_black());
        for region in &composition.regions {
            Self::report_region(region);
        }
        for region in &composition.regions {
            if let Some(anomaly) = &region.anomaly {
                Self::report_warning(&format!("{}: {}", region.region, anomaly));
            }
        }
        for path in &composition.skipped {
            println!("  {} {} {}", "↷".yellow(), path.yellow(), "(already translated)".bright_black());
        }
        println!(
            "  {} {}   {} {}",
            "Regions:".bright_black(),
            composition.regions.len().to_string().cyan(),
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    fn report_region(region: &RegionReport) {
        let marker = if region.anomaly.is_some() {
            "⚠".yellow()
        } else {
            "✓".green()
        };
        println!(
            "  {} {} {} {}",
            marker,
            region.region.cyan(),
            "→".bright_black(),
            region.names.assembly.bright_black()
        );
    }

    /// Report written output files
    pub fn report_output(scene: &Path, image: Option<&Path>) {
        println!("  {} {}", "Scene:".bright_black(), scene.display().to_string().cyan());
        if let Some(image) = image {
            println!("  {} {}", "Image:".bright_black(), image.display().to_string().cyan());
        }
    }

    /// Print the listing produced by a bare `set`
    pub fn report_parameters(listing: &str) {
        println!("{}", "Parameter values:".bold());
        for entry in listing.split_whitespace() {
            println!("  {}", entry);
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
