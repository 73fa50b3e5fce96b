// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry database: named primitive solids and boolean combinations

use crate::geometry::Primitive;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to read database {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse database: {0}")]
    Parse(String),
    #[error("Unsupported database format: {0:?} (expected .toml or .json)")]
    UnknownFormat(PathBuf),
    #[error("Duplicate object name: {0}")]
    DuplicateName(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Combination {parent} references missing member {member}")]
    DanglingReference { parent: String, member: String },
    #[error("Reference cycle through {0}")]
    Cycle(String),
    #[error("No objects specified")]
    NoObjects,
}

/// Boolean operation applied by a combination member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    #[default]
    Union,
    Subtract,
    Intersect,
}

/// A reference from a combination to another object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub op: BoolOp,
    pub name: String,
    /// Row-major 4x4 placement matrix; identity when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f64; 16]>,
}

impl Member {
    pub fn new(op: BoolOp, name: impl Into<String>) -> Self {
        Self {
            op,
            name: name.into(),
            matrix: None,
        }
    }

    pub fn with_matrix(mut self, matrix: Matrix4<f64>) -> Self {
        let mut rows = [0.0; 16];
        for r in 0..4 {
            for c in 0..4 {
                rows[r * 4 + c] = matrix[(r, c)];
            }
        }
        self.matrix = Some(rows);
        self
    }

    pub fn placement(&self) -> Matrix4<f64> {
        match &self.matrix {
            Some(m) => Matrix4::from_row_slice(m),
            None => Matrix4::identity(),
        }
    }
}

/// A named primitive solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub name: String,
    pub shape: Primitive,
}

/// A boolean combination of other objects, optionally flagged as a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub name: String,
    #[serde(default)]
    pub region: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<[u8; 3]>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Combination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: false,
            region_id: None,
            rgb: None,
            members: Vec::new(),
        }
    }

    pub fn region(name: impl Into<String>, rgb: [u8; 3]) -> Self {
        Self {
            region: true,
            rgb: Some(rgb),
            ..Self::new(name)
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Region colour, white when unset
    pub fn color(&self) -> [u8; 3] {
        self.rgb.unwrap_or([255, 255, 255])
    }
}

/// A directory entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Object<'a> {
    Solid(&'a Solid),
    Combination(&'a Combination),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Solid(usize),
    Combination(usize),
}

/// On-disk layout shared by the TOML and JSON forms
#[derive(Debug, Default, Serialize, Deserialize)]
struct DatabaseFile {
    #[serde(default)]
    title: String,
    #[serde(default = "default_units")]
    units: String,
    #[serde(default, rename = "solid")]
    solids: Vec<Solid>,
    #[serde(default, rename = "combination")]
    combinations: Vec<Combination>,
}

fn default_units() -> String {
    "mm".to_string()
}

/// An in-memory geometry database
#[derive(Debug, Clone)]
pub struct Database {
    title: String,
    units: String,
    solids: Vec<Solid>,
    combinations: Vec<Combination>,
    directory: HashMap<String, Slot>,
}

impl Database {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            units: default_units(),
            solids: Vec::new(),
            combinations: Vec::new(),
            directory: HashMap::new(),
        }
    }

    /// Load a database, choosing the format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DbError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(DbError::UnknownFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, DbError> {
        let file: DatabaseFile =
            toml::from_str(source).map_err(|e| DbError::Parse(e.to_string()))?;
        Self::from_parts(file)
    }

    pub fn from_json_str(source: &str) -> Result<Self, DbError> {
        let file: DatabaseFile =
            serde_json::from_str(source).map_err(|e| DbError::Parse(e.to_string()))?;
        Self::from_parts(file)
    }

    /// Serialize back to the TOML layout
    pub fn to_toml_string(&self) -> Result<String, DbError> {
        let file = DatabaseFile {
            title: self.title.clone(),
            units: self.units.clone(),
            solids: self.solids.clone(),
            combinations: self.combinations.clone(),
        };
        toml::to_string_pretty(&file).map_err(|e| DbError::Parse(e.to_string()))
    }

    fn from_parts(file: DatabaseFile) -> Result<Self, DbError> {
        let mut db = Database::new(file.title);
        db.units = file.units;
        for solid in file.solids {
            db.add_solid(solid)?;
        }
        for comb in file.combinations {
            db.add_combination(comb)?;
        }
        Ok(db)
    }

    pub fn add_solid(&mut self, solid: Solid) -> Result<(), DbError> {
        self.claim_name(&solid.name, Slot::Solid(self.solids.len()))?;
        self.solids.push(solid);
        Ok(())
    }

    pub fn add_combination(&mut self, comb: Combination) -> Result<(), DbError> {
        self.claim_name(&comb.name, Slot::Combination(self.combinations.len()))?;
        self.combinations.push(comb);
        Ok(())
    }

    fn claim_name(&mut self, name: &str, slot: Slot) -> Result<(), DbError> {
        if self.directory.contains_key(name) {
            return Err(DbError::DuplicateName(name.to_string()));
        }
        self.directory.insert(name.to_string(), slot);
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn lookup(&self, name: &str) -> Option<Object<'_>> {
        self.directory.get(name).map(|slot| match *slot {
            Slot::Solid(i) => Object::Solid(&self.solids[i]),
            Slot::Combination(i) => Object::Combination(&self.combinations[i]),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directory.contains_key(name)
    }

    pub fn object_count(&self) -> usize {
        self.directory.len()
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
title = "sample"

[[solid]]
name = "box.s"
shape = { type = "rpp", min = [0.0, 0.0, 0.0], max = [10.0, 10.0, 0.0] }

[[combination]]
name = "part1"
region = true
rgb = [255, 0, 0]
members = [{ name = "box.s" }]
"#;

    #[test]
    fn test_parse_toml() {
        let db = Database::from_toml_str(SAMPLE).unwrap();
        assert_eq!(db.title(), "sample");
        assert_eq!(db.units(), "mm");
        assert_eq!(db.object_count(), 2);

        match db.lookup("part1") {
            Some(Object::Combination(c)) => {
                assert!(c.region);
                assert_eq!(c.color(), [255, 0, 0]);
                assert_eq!(c.members[0].op, BoolOp::Union);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut db = Database::new("dup");
        db.add_solid(Solid {
            name: "a".into(),
            shape: Primitive::sphere([0.0; 3], 1.0),
        })
        .unwrap();
        let err = db.add_combination(Combination::new("a")).unwrap_err();
        assert!(matches!(err, DbError::DuplicateName(ref n) if n == "a"));
    }

    #[test]
    fn test_toml_round_trip_preserves_objects() {
        let db = Database::from_toml_str(SAMPLE).unwrap();
        let again = Database::from_toml_str(&db.to_toml_string().unwrap()).unwrap();
        assert_eq!(again.solids(), db.solids());
        assert_eq!(again.combinations(), db.combinations());
    }

    #[test]
    fn test_member_matrix_is_row_major() {
        let m = Matrix4::new_translation(&nalgebra::Vector3::new(1.0, 2.0, 3.0));
        let member = Member::new(BoolOp::Union, "x").with_matrix(m);
        let rows = member.matrix.unwrap();
        assert_eq!(rows[3], 1.0);
        assert_eq!(rows[7], 2.0);
        assert_eq!(rows[11], 3.0);
        assert_eq!(member.placement(), m);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.g");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            Database::from_file(&path),
            Err(DbError::UnknownFormat(_))
        ));
    }
}
