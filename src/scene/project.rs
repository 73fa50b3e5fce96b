// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Top-level scene and project containers

use super::assembly::{Assembly, EntityList};
use super::entities::{
    AssemblyInstance, AssemblyInstanceRef, AssemblyRef, Camera, CameraRef, Color, ColorRef,
    Configuration, Entity, Environment, EnvironmentEdf, EnvironmentEdfRef, EnvironmentShader,
    EnvironmentShaderRef, Frame, Scope,
};
use super::SceneError;

/// The scene: every assembly, its instances, and the shared environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    colors: EntityList<Color>,
    environment_edfs: EntityList<EnvironmentEdf>,
    environment_shaders: EntityList<EnvironmentShader>,
    environment: Option<Environment>,
    cameras: EntityList<Camera>,
    assemblies: EntityList<Assembly>,
    assembly_instances: EntityList<AssemblyInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_color(&mut self, color: Color) -> Result<ColorRef, SceneError> {
        self.colors.insert(color, &Scope::Scene)
    }

    pub fn insert_environment_edf(
        &mut self,
        edf: EnvironmentEdf,
    ) -> Result<EnvironmentEdfRef, SceneError> {
        self.environment_edfs.insert(edf, &Scope::Scene)
    }

    pub fn insert_environment_shader(
        &mut self,
        shader: EnvironmentShader,
    ) -> Result<EnvironmentShaderRef, SceneError> {
        self.environment_shaders.insert(shader, &Scope::Scene)
    }

    /// Bind the environment, replacing any previous one
    pub fn set_environment(&mut self, environment: Environment) -> Result<(), SceneError> {
        if let Some(found) = environment.references().iter().find(|s| **s != Scope::Scene) {
            return Err(SceneError::ForeignReference {
                name: environment.name.clone(),
                expected: Scope::Scene.to_string(),
                found: found.to_string(),
            });
        }
        self.environment = Some(environment);
        Ok(())
    }

    pub fn insert_camera(&mut self, camera: Camera) -> Result<CameraRef, SceneError> {
        self.cameras.insert(camera, &Scope::Scene)
    }

    pub fn insert_assembly(&mut self, assembly: Assembly) -> Result<AssemblyRef, SceneError> {
        self.assemblies.insert(assembly, &Scope::Scene)
    }

    pub fn insert_assembly_instance(
        &mut self,
        instance: AssemblyInstance,
    ) -> Result<AssemblyInstanceRef, SceneError> {
        self.assembly_instances.insert(instance, &Scope::Scene)
    }

    pub fn colors(&self) -> &EntityList<Color> {
        &self.colors
    }

    pub fn environment_edfs(&self) -> &EntityList<EnvironmentEdf> {
        &self.environment_edfs
    }

    pub fn environment_shaders(&self) -> &EntityList<EnvironmentShader> {
        &self.environment_shaders
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn cameras(&self) -> &EntityList<Camera> {
        &self.cameras
    }

    pub fn assemblies(&self) -> &EntityList<Assembly> {
        &self.assemblies
    }

    pub fn assembly_instances(&self) -> &EntityList<AssemblyInstance> {
        &self.assembly_instances
    }
}

/// Root aggregate handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    name: String,
    search_paths: Vec<String>,
    configurations: EntityList<Configuration>,
    scene: Option<Scene>,
    frame: Option<Frame>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_paths: Vec::new(),
            configurations: EntityList::default(),
            scene: None,
            frame: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push_search_path(&mut self, path: impl Into<String>) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[String] {
        &self.search_paths
    }

    /// Add the `final` and `interactive` configurations
    pub fn add_default_configurations(&mut self) -> Result<(), SceneError> {
        self.add_configuration(Configuration::new("final").with_base("base_final"))?;
        self.add_configuration(Configuration::new("interactive").with_base("base_interactive"))?;
        Ok(())
    }

    pub fn add_configuration(&mut self, configuration: Configuration) -> Result<(), SceneError> {
        self.configurations
            .insert(configuration, &Scope::Scene)
            .map(|_| ())
    }

    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    pub fn configuration_mut(&mut self, name: &str) -> Option<&mut Configuration> {
        self.configurations.get_mut(name)
    }

    pub fn configurations(&self) -> &EntityList<Configuration> {
        &self.configurations
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = Some(scene);
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Bind the output frame. The scene must already hold its camera.
    pub fn set_frame(&mut self, frame: Frame) -> Result<(), SceneError> {
        let has_camera = self
            .scene
            .as_ref()
            .map(|s| s.cameras().contains(frame.camera()))
            .unwrap_or(false);
        if !has_camera {
            return Err(SceneError::MissingReference {
                kind: "camera",
                name: frame.camera().to_string(),
            });
        }
        self.frame = Some(frame);
        Ok(())
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }
}
