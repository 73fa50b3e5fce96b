// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Named entity containers and the assembly

use super::entities::{
    Color, ColorRef, Entity, Handle, Light, LightRef, Material, MaterialRef, Object,
    ObjectInstance, ObjectInstanceRef, ObjectRef, Scope, ShaderGroup, ShaderGroupRef,
    SurfaceShader, SurfaceShaderRef,
};
use super::params::ParamArray;
use super::SceneError;

/// Insertion-ordered list of uniquely named entities
#[derive(Debug, Clone, PartialEq)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityList<T> {
    /// Insert an entity owned by `scope`.
    ///
    /// Rejects a name already present and any entity built from handles that
    /// belong to a different container.
    pub(super) fn insert(&mut self, item: T, scope: &Scope) -> Result<Handle<T>, SceneError> {
        if let Some(found) = item.references().iter().find(|s| *s != scope) {
            return Err(SceneError::ForeignReference {
                name: item.name().to_string(),
                expected: scope.to_string(),
                found: found.to_string(),
            });
        }
        if self.contains(item.name()) {
            return Err(SceneError::DuplicateName {
                kind: T::KIND,
                name: item.name().to_string(),
                container: scope.to_string(),
            });
        }
        let handle = Handle::new(item.name(), scope.clone());
        self.items.push(item);
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|i| i.name() == name)
    }

    pub(super) fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Renderer-side grouping of objects, instances, shaders and materials
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    name: String,
    pub params: ParamArray,
    colors: EntityList<Color>,
    lights: EntityList<Light>,
    objects: EntityList<Object>,
    object_instances: EntityList<ObjectInstance>,
    shader_groups: EntityList<ShaderGroup>,
    surface_shaders: EntityList<SurfaceShader>,
    materials: EntityList<Material>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamArray::new(),
            colors: EntityList::default(),
            lights: EntityList::default(),
            objects: EntityList::default(),
            object_instances: EntityList::default(),
            shader_groups: EntityList::default(),
            surface_shaders: EntityList::default(),
            materials: EntityList::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        Scope::Assembly(self.name.clone())
    }

    pub fn insert_color(&mut self, color: Color) -> Result<ColorRef, SceneError> {
        let scope = self.scope();
        self.colors.insert(color, &scope)
    }

    pub fn insert_light(&mut self, light: Light) -> Result<LightRef, SceneError> {
        let scope = self.scope();
        self.lights.insert(light, &scope)
    }

    pub fn insert_object(&mut self, object: Object) -> Result<ObjectRef, SceneError> {
        let scope = self.scope();
        self.objects.insert(object, &scope)
    }

    pub fn insert_object_instance(
        &mut self,
        instance: ObjectInstance,
    ) -> Result<ObjectInstanceRef, SceneError> {
        let scope = self.scope();
        self.object_instances.insert(instance, &scope)
    }

    pub fn insert_shader_group(&mut self, group: ShaderGroup) -> Result<ShaderGroupRef, SceneError> {
        let scope = self.scope();
        self.shader_groups.insert(group, &scope)
    }

    pub fn insert_surface_shader(
        &mut self,
        shader: SurfaceShader,
    ) -> Result<SurfaceShaderRef, SceneError> {
        let scope = self.scope();
        self.surface_shaders.insert(shader, &scope)
    }

    pub fn insert_material(&mut self, material: Material) -> Result<MaterialRef, SceneError> {
        let scope = self.scope();
        self.materials.insert(material, &scope)
    }

    pub fn colors(&self) -> &EntityList<Color> {
        &self.colors
    }

    pub fn lights(&self) -> &EntityList<Light> {
        &self.lights
    }

    pub fn objects(&self) -> &EntityList<Object> {
        &self.objects
    }

    pub fn object_instances(&self) -> &EntityList<ObjectInstance> {
        &self.object_instances
    }

    pub fn shader_groups(&self) -> &EntityList<ShaderGroup> {
        &self.shader_groups
    }

    pub fn surface_shaders(&self) -> &EntityList<SurfaceShader> {
        &self.surface_shaders
    }

    pub fn materials(&self) -> &EntityList<Material> {
        &self.materials
    }
}

impl Entity for Assembly {
    const KIND: &'static str = "assembly";

    fn name(&self) -> &str {
        &self.name
    }
}
