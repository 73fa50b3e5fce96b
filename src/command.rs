// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Command scripts using pest
//!
//! A script is a semicolon-separated list of `set` commands. `set key=value`
//! changes a render parameter; a bare `set` lists the current values.

use crate::art::RenderOptions;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;
use tracing::info;

#[derive(Parser)]
#[grammar = "command.pest"]
struct CommandParser;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Failed to parse command script: {0}")]
    Parse(String),
    #[error("Unknown parameter: {0}")]
    UnknownKey(String),
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// One parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `set` with its assignments in order; empty means "show"
    Set(Vec<(String, String)>),
}

/// Parse a script into commands
pub fn parse_script(source: &str) -> Result<Vec<Command>, CommandError> {
    let mut pairs = CommandParser::parse(Rule::script, source)
        .map_err(|e| CommandError::Parse(e.to_string()))?;

    let mut commands = Vec::new();
    if let Some(script) = pairs.next() {
        for pair in script.into_inner() {
            match pair.as_rule() {
                Rule::set_cmd => commands.push(parse_set(pair)),
                Rule::EOI => {}
                _ => {}
            }
        }
    }
    Ok(commands)
}

fn parse_set(pair: pest::iterators::Pair<Rule>) -> Command {
    let mut assignments = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() != Rule::assignment {
            continue;
        }
        let mut parts = inner.into_inner();
        let key = parts.next().map(|p| p.as_str().to_string()).unwrap_or_default();
        let value = parts.next().map(|p| p.as_str().to_string()).unwrap_or_default();
        assignments.push((key, value));
    }
    Command::Set(assignments)
}

/// Current values of every settable parameter
pub fn describe(options: &RenderOptions) -> String {
    format!("samples={}", options.samples)
}

fn set_param(options: &mut RenderOptions, key: &str, value: &str) -> Result<(), CommandError> {
    match key {
        "samples" | "s" => {
            options.samples = value.parse().map_err(|_| CommandError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            Ok(())
        }
        _ => Err(CommandError::UnknownKey(key.to_string())),
    }
}

/// Run a script against the options.
///
/// Returns one listing per bare `set`. Stops at the first failing
/// assignment; earlier ones stay applied.
pub fn apply_script(source: &str, options: &mut RenderOptions) -> Result<Vec<String>, CommandError> {
    let mut listings = Vec::new();
    for command in parse_script(source)? {
        match command {
            Command::Set(assignments) if assignments.is_empty() => {
                listings.push(describe(options));
            }
            Command::Set(assignments) => {
                for (key, value) in &assignments {
                    set_param(options, key, value)?;
                    info!(key = %key, value = %value, "parameter set");
                }
            }
        }
    }
    Ok(listings)
}
