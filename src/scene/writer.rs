// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! appleseed project file writer

use super::params::{ParamArray, ParamValue};
use super::{
    Assembly, Camera, Color, Configuration, Frame, Light, Project, Scene, SceneError,
    ShaderGroup, TransformSequence,
};
use nalgebra::Matrix4;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;

/// Project file format revision written to the root element
pub const FORMAT_REVISION: u32 = 31;

/// Serialize a project to appleseed XML
pub fn project_to_xml(project: &Project) -> Result<String, SceneError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut root = BytesStart::new("project");
    root.push_attribute(("format_revision", FORMAT_REVISION.to_string().as_str()));
    emit(&mut writer, Event::Start(root))?;

    if !project.search_paths().is_empty() {
        emit(&mut writer, Event::Start(BytesStart::new("search_paths")))?;
        for path in project.search_paths() {
            text_element(&mut writer, "search_path", path)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("search_paths")))?;
    }

    if let Some(scene) = project.scene() {
        write_scene(&mut writer, scene)?;
    }

    if let Some(frame) = project.frame() {
        emit(&mut writer, Event::Start(BytesStart::new("output")))?;
        write_frame(&mut writer, frame)?;
        emit(&mut writer, Event::End(BytesEnd::new("output")))?;
    }

    if !project.configurations().is_empty() {
        emit(&mut writer, Event::Start(BytesStart::new("configurations")))?;
        for configuration in project.configurations() {
            write_configuration(&mut writer, configuration)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("configurations")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("project")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| SceneError::Xml(e.to_string()))
}

/// Write the project file, creating parent directories and overwriting any
/// existing file
pub fn write_project_file(project: &Project, path: impl AsRef<Path>) -> Result<(), SceneError> {
    let path = path.as_ref();
    let xml = project_to_xml(project)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, xml)?;
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), SceneError> {
    writer
        .write_event(event)
        .map_err(|e| SceneError::Xml(e.to_string()))
}

fn text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<(), SceneError> {
    emit(writer, Event::Start(BytesStart::new(tag)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn named(tag: &str, name: &str, model: Option<&str>) -> BytesStart<'static> {
    let mut start = BytesStart::new(tag.to_string());
    start.push_attribute(("name", name));
    if let Some(model) = model {
        start.push_attribute(("model", model));
    }
    start
}

fn write_params<W: Write>(writer: &mut Writer<W>, params: &ParamArray) -> Result<(), SceneError> {
    for (key, value) in params.iter() {
        match value {
            ParamValue::Value(v) => {
                let mut p = BytesStart::new("parameter");
                p.push_attribute(("name", key));
                p.push_attribute(("value", v.as_str()));
                emit(writer, Event::Empty(p))?;
            }
            ParamValue::Dict(dict) => {
                let mut p = BytesStart::new("parameters");
                p.push_attribute(("name", key));
                emit(writer, Event::Start(p))?;
                write_params(writer, dict)?;
                emit(writer, Event::End(BytesEnd::new("parameters")))?;
            }
        }
    }
    Ok(())
}

fn matrix_text(m: &Matrix4<f64>) -> String {
    let mut values = Vec::with_capacity(16);
    for r in 0..4 {
        for c in 0..4 {
            values.push(format!("{}", m[(r, c)]));
        }
    }
    values.join(" ")
}

fn write_transform<W: Write>(
    writer: &mut Writer<W>,
    time: Option<f32>,
    m: &Matrix4<f64>,
) -> Result<(), SceneError> {
    let mut start = BytesStart::new("transform");
    if let Some(time) = time {
        start.push_attribute(("time", time.to_string().as_str()));
    }
    emit(writer, Event::Start(start))?;
    text_element(writer, "matrix", &matrix_text(m))?;
    emit(writer, Event::End(BytesEnd::new("transform")))
}

fn write_sequence<W: Write>(
    writer: &mut Writer<W>,
    seq: &TransformSequence,
) -> Result<(), SceneError> {
    for (time, m) in seq.iter() {
        write_transform(writer, Some(*time), m)?;
    }
    Ok(())
}

fn write_color<W: Write>(writer: &mut Writer<W>, color: &Color) -> Result<(), SceneError> {
    emit(writer, Event::Start(named("color", &color.name, None)))?;
    write_params(writer, &color.params)?;
    let values: Vec<String> = color.values.iter().map(|v| v.to_string()).collect();
    text_element(writer, "values", &values.join(" "))?;
    text_element(writer, "alpha", &color.alpha.to_string())?;
    emit(writer, Event::End(BytesEnd::new("color")))
}

fn write_light<W: Write>(writer: &mut Writer<W>, light: &Light) -> Result<(), SceneError> {
    emit(
        writer,
        Event::Start(named("light", &light.name, Some(&light.model))),
    )?;
    write_params(writer, &light.params)?;
    write_transform(writer, None, &light.transform)?;
    emit(writer, Event::End(BytesEnd::new("light")))
}

fn write_camera<W: Write>(writer: &mut Writer<W>, camera: &Camera) -> Result<(), SceneError> {
    emit(
        writer,
        Event::Start(named("camera", &camera.name, Some(&camera.model))),
    )?;
    write_params(writer, &camera.params)?;
    write_sequence(writer, &camera.transforms)?;
    emit(writer, Event::End(BytesEnd::new("camera")))
}

fn write_shader_group<W: Write>(
    writer: &mut Writer<W>,
    group: &ShaderGroup,
) -> Result<(), SceneError> {
    emit(writer, Event::Start(named("shader_group", &group.name, None)))?;
    write_params(writer, &group.params)?;
    for node in group.shaders() {
        let mut start = BytesStart::new("shader");
        start.push_attribute(("type", node.kind.as_str()));
        start.push_attribute(("name", node.shader.as_str()));
        start.push_attribute(("layer", node.layer.as_str()));
        if node.params.is_empty() {
            emit(writer, Event::Empty(start))?;
        } else {
            emit(writer, Event::Start(start))?;
            write_params(writer, &node.params)?;
            emit(writer, Event::End(BytesEnd::new("shader")))?;
        }
    }
    for edge in group.connections() {
        let mut c = BytesStart::new("connect_shaders");
        c.push_attribute(("src_layer", edge.src_layer.as_str()));
        c.push_attribute(("src_param", edge.src_param.as_str()));
        c.push_attribute(("dst_layer", edge.dst_layer.as_str()));
        c.push_attribute(("dst_param", edge.dst_param.as_str()));
        emit(writer, Event::Empty(c))?;
    }
    emit(writer, Event::End(BytesEnd::new("shader_group")))
}

fn write_assembly<W: Write>(writer: &mut Writer<W>, assembly: &Assembly) -> Result<(), SceneError> {
    emit(writer, Event::Start(named("assembly", assembly.name(), None)))?;
    write_params(writer, &assembly.params)?;

    for color in assembly.colors() {
        write_color(writer, color)?;
    }

    for group in assembly.shader_groups() {
        write_shader_group(writer, group)?;
    }

    for shader in assembly.surface_shaders() {
        emit(
            writer,
            Event::Start(named("surface_shader", &shader.name, Some(&shader.model))),
        )?;
        write_params(writer, &shader.params)?;
        emit(writer, Event::End(BytesEnd::new("surface_shader")))?;
    }

    for material in assembly.materials() {
        emit(
            writer,
            Event::Start(named("material", &material.name, Some(&material.model))),
        )?;
        write_params(writer, &material.params)?;
        emit(writer, Event::End(BytesEnd::new("material")))?;
    }

    for light in assembly.lights() {
        write_light(writer, light)?;
    }

    for object in assembly.objects() {
        emit(
            writer,
            Event::Start(named("object", &object.name, Some(&object.model))),
        )?;
        write_params(writer, &object.params)?;
        emit(writer, Event::End(BytesEnd::new("object")))?;
    }

    for instance in assembly.object_instances() {
        let mut start = named("object_instance", &instance.name, None);
        start.push_attribute(("object", instance.object.as_str()));
        emit(writer, Event::Start(start))?;
        write_params(writer, &instance.params)?;
        write_transform(writer, None, &instance.transform)?;
        for binding in &instance.materials {
            let mut a = BytesStart::new("assign_material");
            a.push_attribute(("slot", binding.slot.as_str()));
            a.push_attribute(("side", "front"));
            a.push_attribute(("material", binding.material.as_str()));
            emit(writer, Event::Empty(a))?;
        }
        emit(writer, Event::End(BytesEnd::new("object_instance")))?;
    }

    emit(writer, Event::End(BytesEnd::new("assembly")))
}

fn write_scene<W: Write>(writer: &mut Writer<W>, scene: &Scene) -> Result<(), SceneError> {
    emit(writer, Event::Start(BytesStart::new("scene")))?;

    for camera in scene.cameras() {
        write_camera(writer, camera)?;
    }

    for color in scene.colors() {
        write_color(writer, color)?;
    }

    for edf in scene.environment_edfs() {
        emit(
            writer,
            Event::Start(named("environment_edf", &edf.name, Some(&edf.model))),
        )?;
        write_params(writer, &edf.params)?;
        emit(writer, Event::End(BytesEnd::new("environment_edf")))?;
    }

    for shader in scene.environment_shaders() {
        emit(
            writer,
            Event::Start(named("environment_shader", &shader.name, Some(&shader.model))),
        )?;
        write_params(writer, &shader.params)?;
        emit(writer, Event::End(BytesEnd::new("environment_shader")))?;
    }

    if let Some(env) = scene.environment() {
        emit(
            writer,
            Event::Start(named("environment", &env.name, Some(&env.model))),
        )?;
        write_params(writer, &env.params)?;
        emit(writer, Event::End(BytesEnd::new("environment")))?;
    }

    for assembly in scene.assemblies() {
        write_assembly(writer, assembly)?;
    }

    for instance in scene.assembly_instances() {
        let mut start = named("assembly_instance", &instance.name, None);
        start.push_attribute(("assembly", instance.assembly.as_str()));
        emit(writer, Event::Start(start))?;
        write_params(writer, &instance.params)?;
        write_sequence(writer, &instance.transforms)?;
        emit(writer, Event::End(BytesEnd::new("assembly_instance")))?;
    }

    emit(writer, Event::End(BytesEnd::new("scene")))
}

fn write_frame<W: Write>(writer: &mut Writer<W>, frame: &Frame) -> Result<(), SceneError> {
    emit(writer, Event::Start(named("frame", &frame.name, None)))?;
    write_params(writer, &frame.params)?;
    emit(writer, Event::End(BytesEnd::new("frame")))
}

fn write_configuration<W: Write>(
    writer: &mut Writer<W>,
    configuration: &Configuration,
) -> Result<(), SceneError> {
    let mut start = named("configuration", &configuration.name, None);
    if let Some(base) = &configuration.base {
        start.push_attribute(("base", base.as_str()));
    }
    emit(writer, Event::Start(start))?;
    write_params(writer, &configuration.params)?;
    emit(writer, Event::End(BytesEnd::new("configuration")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AssemblyInstance, Object};

    fn tiny_project() -> Project {
        let mut scene = Scene::new();
        let camera = scene
            .insert_camera(Camera::pinhole(
                "camera",
                ParamArray::new().insert("focal_length", "0.035"),
            ))
            .unwrap();

        let mut asm = Assembly::new("a & b");
        asm.insert_object(Object::new(
            "o",
            "brlcad_object",
            ParamArray::new().insert("minX", -1.5),
        ))
        .unwrap();
        let asm_ref = scene.insert_assembly(asm).unwrap();
        let mut inst = AssemblyInstance::new("a_inst", &asm_ref);
        inst.transforms.set_transform(0.0, Matrix4::identity());
        scene.insert_assembly_instance(inst).unwrap();

        let mut project = Project::new("p");
        project.push_search_path("shaders/appleseed");
        project.add_default_configurations().unwrap();
        if let Some(c) = project.configuration_mut("final") {
            c.params.set_path("uniform_pixel_renderer.samples", 25);
        }
        project.set_scene(scene);
        project.set_frame(Frame::new("beauty", &camera, 16, 8)).unwrap();
        project
    }

    #[test]
    fn test_xml_structure() {
        let xml = project_to_xml(&tiny_project()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<project format_revision=\"31\">"));
        assert!(xml.contains("<search_path>shaders/appleseed</search_path>"));
        assert!(xml.contains("<assembly name=\"a &amp; b\">"));
        assert!(xml.contains("<parameter name=\"minX\" value=\"-1.5\"/>"));
        assert!(xml.contains("<assembly_instance name=\"a_inst\" assembly=\"a &amp; b\">"));
        assert!(xml.contains("<matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</matrix>"));
        assert!(xml.contains("<parameters name=\"uniform_pixel_renderer\">"));
        assert!(xml.contains("<configuration name=\"final\" base=\"base_final\">"));
        assert!(xml.contains("<parameter name=\"resolution\" value=\"16 8\"/>"));
    }

    #[test]
    fn test_xml_is_deterministic() {
        let a = project_to_xml(&tiny_project()).unwrap();
        let b = project_to_xml(&tiny_project()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_project_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("objects.appleseed");
        write_project_file(&tiny_project(), &path).unwrap();
        write_project_file(&tiny_project(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<frame name=\"beauty\">"));
    }
}
