// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Renderer scene entities and the typed handles that reference them

use super::params::ParamArray;
use nalgebra::Matrix4;
use std::fmt;
use std::marker::PhantomData;

/// Container an entity lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Scene,
    Assembly(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Scene => write!(f, "scene"),
            Scope::Assembly(name) => write!(f, "assembly {}", name),
        }
    }
}

/// Proof that an entity of kind `K` was inserted into a container.
///
/// Handles are only produced by insertion, so anything holding one refers
/// to an entity that exists.
pub struct Handle<K> {
    name: String,
    scope: Scope,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    pub(super) fn new(name: &str, scope: Scope) -> Self {
        Self {
            name: name.to_string(),
            scope,
            _kind: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            scope: self.scope.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({} in {})", self.name, self.scope)
    }
}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.scope == other.scope
    }
}

pub type ObjectRef = Handle<Object>;
pub type ObjectInstanceRef = Handle<ObjectInstance>;
pub type ShaderGroupRef = Handle<ShaderGroup>;
pub type SurfaceShaderRef = Handle<SurfaceShader>;
pub type MaterialRef = Handle<Material>;
pub type ColorRef = Handle<Color>;
pub type LightRef = Handle<Light>;
pub type AssemblyRef = Handle<super::Assembly>;
pub type AssemblyInstanceRef = Handle<AssemblyInstance>;
pub type EnvironmentEdfRef = Handle<EnvironmentEdf>;
pub type EnvironmentShaderRef = Handle<EnvironmentShader>;
pub type CameraRef = Handle<Camera>;

/// Anything stored in a named container
pub trait Entity {
    /// Container-facing kind label, e.g. `"material"`
    const KIND: &'static str;

    fn name(&self) -> &str;

    /// Scopes of every handle this entity was built from
    fn references(&self) -> &[Scope] {
        &[]
    }
}

/// Time-keyed sequence of local-to-parent transforms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformSequence {
    entries: Vec<(f32, Matrix4<f64>)>,
}

impl TransformSequence {
    pub fn identity() -> Self {
        let mut seq = Self::default();
        seq.set_transform(0.0, Matrix4::identity());
        seq
    }

    /// Set the transform at `time`, replacing any existing one at that time
    pub fn set_transform(&mut self, time: f32, matrix: Matrix4<f64>) {
        match self.entries.iter_mut().find(|(t, _)| *t == time) {
            Some(entry) => entry.1 = matrix,
            None => {
                self.entries.push((time, matrix));
                self.entries.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f32, Matrix4<f64>)> {
        self.entries.iter()
    }

    pub fn get(&self, time: f32) -> Option<&Matrix4<f64>> {
        self.entries.iter().find(|(t, _)| *t == time).map(|(_, m)| m)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

macro_rules! named_entity {
    ($ty:ident, $kind:literal) => {
        impl Entity for $ty {
            const KIND: &'static str = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn references(&self) -> &[Scope] {
                &self.refs
            }
        }
    };
}

/// A geometry object handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl Object {
    pub fn new(name: impl Into<String>, model: impl Into<String>, params: ParamArray) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            params,
            refs: Vec::new(),
        }
    }
}

named_entity!(Object, "object");

/// A material binding on an object instance
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSlot {
    pub slot: String,
    pub material: String,
}

/// A placed instance of an object with its material bindings
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    pub name: String,
    pub object: String,
    pub params: ParamArray,
    pub transform: Matrix4<f64>,
    pub materials: Vec<MaterialSlot>,
    refs: Vec<Scope>,
}

impl ObjectInstance {
    pub fn new(name: impl Into<String>, object: &ObjectRef, transform: Matrix4<f64>) -> Self {
        Self {
            name: name.into(),
            object: object.name().to_string(),
            params: ParamArray::new(),
            transform,
            materials: Vec::new(),
            refs: vec![object.scope().clone()],
        }
    }

    /// Bind `material` to `slot`
    pub fn with_material(mut self, slot: impl Into<String>, material: &MaterialRef) -> Self {
        self.materials.push(MaterialSlot {
            slot: slot.into(),
            material: material.name().to_string(),
        });
        self.refs.push(material.scope().clone());
        self
    }
}

named_entity!(ObjectInstance, "object instance");

/// One node of a shader network
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderNode {
    pub kind: String,
    pub shader: String,
    pub layer: String,
    pub params: ParamArray,
}

/// Output-to-input edge between two layers
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderConnection {
    pub src_layer: String,
    pub src_param: String,
    pub dst_layer: String,
    pub dst_param: String,
}

/// Handle to a layer inside one shader group
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderLayer {
    group: String,
    layer: String,
}

impl ShaderLayer {
    pub fn name(&self) -> &str {
        &self.layer
    }
}

/// A small shading network evaluated by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderGroup {
    pub name: String,
    pub params: ParamArray,
    shaders: Vec<ShaderNode>,
    connections: Vec<ShaderConnection>,
    refs: Vec<Scope>,
}

impl ShaderGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamArray::new(),
            shaders: Vec::new(),
            connections: Vec::new(),
            refs: Vec::new(),
        }
    }

    /// Add a compiled shader as a new layer
    pub fn add_shader(
        &mut self,
        kind: &str,
        shader: &str,
        layer: &str,
        params: ParamArray,
    ) -> Result<ShaderLayer, super::SceneError> {
        if self.shaders.iter().any(|s| s.layer == layer) {
            return Err(super::SceneError::DuplicateName {
                kind: "shader layer",
                name: layer.to_string(),
                container: format!("shader group {}", self.name),
            });
        }
        self.shaders.push(ShaderNode {
            kind: kind.to_string(),
            shader: shader.to_string(),
            layer: layer.to_string(),
            params,
        });
        Ok(ShaderLayer {
            group: self.name.clone(),
            layer: layer.to_string(),
        })
    }

    /// Connect an output of `src` to an input of `dst`
    pub fn add_connection(
        &mut self,
        src: &ShaderLayer,
        src_param: &str,
        dst: &ShaderLayer,
        dst_param: &str,
    ) -> Result<(), super::SceneError> {
        for layer in [src, dst] {
            if layer.group != self.name {
                return Err(super::SceneError::ForeignReference {
                    name: layer.layer.clone(),
                    expected: format!("shader group {}", self.name),
                    found: format!("shader group {}", layer.group),
                });
            }
        }
        self.connections.push(ShaderConnection {
            src_layer: src.layer.clone(),
            src_param: src_param.to_string(),
            dst_layer: dst.layer.clone(),
            dst_param: dst_param.to_string(),
        });
        Ok(())
    }

    pub fn shaders(&self) -> &[ShaderNode] {
        &self.shaders
    }

    pub fn connections(&self) -> &[ShaderConnection] {
        &self.connections
    }
}

named_entity!(ShaderGroup, "shader group");

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceShader {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl SurfaceShader {
    pub fn physical(name: impl Into<String>, params: ParamArray) -> Self {
        Self {
            name: name.into(),
            model: "physical_surface_shader".to_string(),
            params,
            refs: Vec::new(),
        }
    }
}

named_entity!(SurfaceShader, "surface shader");

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl Material {
    /// OSL material driven by a shader group, with a surface shader fallback
    pub fn osl(
        name: impl Into<String>,
        osl_surface: &ShaderGroupRef,
        surface_shader: &SurfaceShaderRef,
    ) -> Self {
        Self {
            name: name.into(),
            model: "osl_material".to_string(),
            params: ParamArray::new()
                .insert("osl_surface", osl_surface.name())
                .insert("surface_shader", surface_shader.name()),
            refs: vec![osl_surface.scope().clone(), surface_shader.scope().clone()],
        }
    }
}

named_entity!(Material, "material");

/// A named colour with its channel values
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub name: String,
    pub params: ParamArray,
    pub values: Vec<f32>,
    pub alpha: f32,
    refs: Vec<Scope>,
}

impl Color {
    pub fn new(name: impl Into<String>, params: ParamArray, values: &[f32]) -> Self {
        Self {
            name: name.into(),
            params,
            values: values.to_vec(),
            alpha: 1.0,
            refs: Vec::new(),
        }
    }
}

named_entity!(Color, "color");

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    pub transform: Matrix4<f64>,
    refs: Vec<Scope>,
}

impl Light {
    pub fn point(name: impl Into<String>, intensity: &ColorRef, transform: Matrix4<f64>) -> Self {
        Self {
            name: name.into(),
            model: "point_light".to_string(),
            params: ParamArray::new().insert("intensity", intensity.name()),
            transform,
            refs: vec![intensity.scope().clone()],
        }
    }
}

named_entity!(Light, "light");

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentEdf {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl EnvironmentEdf {
    pub fn constant(name: impl Into<String>, radiance: &ColorRef) -> Self {
        Self {
            name: name.into(),
            model: "constant_environment_edf".to_string(),
            params: ParamArray::new().insert("radiance", radiance.name()),
            refs: vec![radiance.scope().clone()],
        }
    }
}

named_entity!(EnvironmentEdf, "environment EDF");

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentShader {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl EnvironmentShader {
    pub fn edf(name: impl Into<String>, edf: &EnvironmentEdfRef) -> Self {
        Self {
            name: name.into(),
            model: "edf_environment_shader".to_string(),
            params: ParamArray::new().insert("environment_edf", edf.name()),
            refs: vec![edf.scope().clone()],
        }
    }
}

named_entity!(EnvironmentShader, "environment shader");

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    refs: Vec<Scope>,
}

impl Environment {
    pub fn new(
        name: impl Into<String>,
        edf: &EnvironmentEdfRef,
        shader: &EnvironmentShaderRef,
    ) -> Self {
        Self {
            name: name.into(),
            model: "generic_environment".to_string(),
            params: ParamArray::new()
                .insert("environment_edf", edf.name())
                .insert("environment_shader", shader.name()),
            refs: vec![edf.scope().clone(), shader.scope().clone()],
        }
    }
}

named_entity!(Environment, "environment");

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: String,
    pub model: String,
    pub params: ParamArray,
    pub transforms: TransformSequence,
    refs: Vec<Scope>,
}

impl Camera {
    pub fn pinhole(name: impl Into<String>, params: ParamArray) -> Self {
        Self {
            name: name.into(),
            model: "pinhole_camera".to_string(),
            params,
            transforms: TransformSequence::default(),
            refs: Vec::new(),
        }
    }
}

named_entity!(Camera, "camera");

/// A placed instance of an assembly
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyInstance {
    pub name: String,
    pub assembly: String,
    pub params: ParamArray,
    pub transforms: TransformSequence,
    refs: Vec<Scope>,
}

impl AssemblyInstance {
    pub fn new(name: impl Into<String>, assembly: &AssemblyRef) -> Self {
        Self {
            name: name.into(),
            assembly: assembly.name().to_string(),
            params: ParamArray::new(),
            transforms: TransformSequence::default(),
            refs: vec![assembly.scope().clone()],
        }
    }
}

named_entity!(AssemblyInstance, "assembly instance");

/// Output frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub params: ParamArray,
    pub resolution: (usize, usize),
    pub(super) camera: String,
}

impl Frame {
    pub fn new(name: impl Into<String>, camera: &CameraRef, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            params: ParamArray::new()
                .insert("camera", camera.name())
                .insert("resolution", format!("{} {}", width, height)),
            resolution: (width, height),
            camera: camera.name().to_string(),
        }
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }
}

/// A named render configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub name: String,
    pub base: Option<String>,
    pub params: ParamArray,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            params: ParamArray::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl Entity for Configuration {
    const KIND: &'static str = "configuration";

    fn name(&self) -> &str {
        &self.name
    }
}
