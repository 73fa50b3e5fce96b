// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene module - the renderer-facing scene graph
//!
//! Entities live in nested containers (project, scene, assembly) and are
//! identified by caller-chosen names. Inserting an entity yields a typed
//! handle, and entities that reference others are built from those handles.

mod assembly;
mod entities;
mod params;
mod project;
mod writer;

use thiserror::Error;

pub use assembly::{Assembly, EntityList};
pub use entities::{
    AssemblyInstance, AssemblyInstanceRef, AssemblyRef, Camera, CameraRef, Color, ColorRef,
    Configuration, Entity, Environment, EnvironmentEdf, EnvironmentEdfRef, EnvironmentShader,
    EnvironmentShaderRef, Frame, Handle, Light, LightRef, Material, MaterialRef, MaterialSlot,
    Object, ObjectInstance, ObjectInstanceRef, ObjectRef, Scope, ShaderConnection, ShaderGroup,
    ShaderGroupRef, ShaderLayer, ShaderNode, SurfaceShader, SurfaceShaderRef, TransformSequence,
};
pub use params::{osl_color, ParamArray, ParamValue};
pub use project::{Project, Scene};
pub use writer::{project_to_xml, write_project_file, FORMAT_REVISION};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Duplicate {kind} name {name:?} in {container}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        container: String,
    },
    #[error("{name} references an entity of {found}, expected {expected}")]
    ForeignReference {
        name: String,
        expected: String,
        found: String,
    },
    #[error("Missing {kind} {name:?}")]
    MissingReference { kind: &'static str, name: String },
    #[error("Failed to write project XML: {0}")]
    Xml(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
