// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Project composition: shared scene entities around the region clusters

use super::region::{RegionReport, RegionTranslator};
use super::{ArtContext, ArtError};
use crate::scene::{
    Assembly, AssemblyInstance, Camera, Color, Environment, EnvironmentEdf, EnvironmentShader,
    Frame, Light, ParamArray, Project, Scene, SceneError,
};
use crate::utils::math::deg_to_rad;
use nalgebra::{Matrix4, Rotation3, Vector3};
use tracing::info;

/// Film height of the pinhole camera, in metres
pub const FILM_HEIGHT: f64 = 0.08;

pub const FOCAL_LENGTH: f64 = 0.035;

/// A composed project with the per-region outcomes
#[derive(Debug, Clone)]
pub struct Composition {
    pub project: Project,
    pub regions: Vec<RegionReport>,
    /// Paths of regions reached a second time and not translated again
    pub skipped: Vec<String>,
}

/// Builds the renderer project for one [`ArtContext`]
pub struct SceneComposer<'c, 'rt, 'db> {
    ctx: &'c ArtContext<'rt, 'db>,
}

impl<'c, 'rt, 'db> SceneComposer<'c, 'rt, 'db> {
    pub fn new(ctx: &'c ArtContext<'rt, 'db>) -> Self {
        Self { ctx }
    }

    /// Compose the full project. Any traversal error aborts composition.
    pub fn build_project(&self) -> Result<Composition, ArtError> {
        let options = self.ctx.options();
        let (width, height) = options.resolution();

        let mut project = Project::new(&options.project_name);
        project.push_search_path("build/Debug");
        if let Some(root) = &options.appleseed_root {
            project.push_search_path(root.join("shaders/appleseed").display().to_string());
            project.push_search_path(root.join("shaders/max").display().to_string());
        }

        project.add_default_configurations()?;
        if let Some(config) = project.configuration_mut("final") {
            config
                .params
                .set_path("uniform_pixel_renderer.samples", options.samples);
            config.params.set_path("rendering_threads", "1");
        }
        if let Some(config) = project.configuration_mut("interactive") {
            config.params.set_path("rendering_threads", "1");
        }

        let mut scene = Scene::new();

        let mut translator = RegionTranslator::new(self.ctx, &mut scene);
        let walked = self.ctx.raytrace().walk_regions(&mut translator)?;
        let (regions, skipped) = translator.into_reports();
        info!(
            walked,
            translated = regions.len(),
            skipped = skipped.len(),
            "regions registered"
        );

        add_light_assembly(&mut scene)?;
        add_sky(&mut scene)?;

        let camera = self.camera(width, height);
        let camera = scene.insert_camera(camera)?;

        project.set_scene(scene);
        project.set_frame(Frame::new("beauty", &camera, width, height))?;

        Ok(Composition {
            project,
            regions,
            skipped,
        })
    }

    fn camera(&self, width: usize, height: usize) -> Camera {
        let view = self.ctx.view();
        let film = format!(
            "{:.6} {:.6}",
            FILM_HEIGHT * width as f64 / height as f64,
            FILM_HEIGHT
        );
        let mut camera = Camera::pinhole(
            "camera",
            ParamArray::new()
                .insert("film_dimensions", film)
                .insert("focal_length", FOCAL_LENGTH),
        );
        camera.transforms.set_transform(
            0.0,
            camera_transform(view.eye_model.coords, view.azimuth, view.elevation),
        );
        camera
    }
}

/// Place the camera at the eye and orient it by azimuth and elevation.
///
/// The renderer is Y-up, so model `(x, y, z)` maps to `(x, z, -y)`.
pub fn camera_transform(eye: Vector3<f64>, azimuth: f64, elevation: f64) -> Matrix4<f64> {
    let location = Matrix4::new_translation(&Vector3::new(eye.x, eye.z, -eye.y));
    let az = Rotation3::from_axis_angle(&Vector3::y_axis(), deg_to_rad(azimuth - 270.0));
    let el = Rotation3::from_axis_angle(&Vector3::x_axis(), deg_to_rad(-elevation));
    location * az.to_homogeneous() * el.to_homogeneous()
}

fn add_light_assembly(scene: &mut Scene) -> Result<(), SceneError> {
    let mut assembly = Assembly::new("assembly");
    let intensity = assembly.insert_color(Color::new(
        "light_intensity",
        ParamArray::new()
            .insert("color_space", "srgb")
            .insert("multiplier", "30.0"),
        &[1.0, 1.0, 1.0],
    ))?;
    assembly.insert_light(Light::point(
        "light",
        &intensity,
        Matrix4::new_translation(&Vector3::new(0.6, 2.0, 1.0)),
    ))?;

    let assembly = scene.insert_assembly(assembly)?;
    let mut instance = AssemblyInstance::new("assembly_inst", &assembly);
    instance.transforms.set_transform(0.0, Matrix4::identity());
    scene.insert_assembly_instance(instance)?;
    Ok(())
}

fn add_sky(scene: &mut Scene) -> Result<(), SceneError> {
    let radiance = scene.insert_color(Color::new(
        "sky_radiance",
        ParamArray::new()
            .insert("color_space", "srgb")
            .insert("multiplier", "0.5"),
        &[1.0, 1.0, 1.0],
    ))?;
    let edf = scene.insert_environment_edf(EnvironmentEdf::constant("sky_edf", &radiance))?;
    let shader = scene.insert_environment_shader(EnvironmentShader::edf("sky_shader", &edf))?;
    scene.set_environment(Environment::new("sky", &edf, &shader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::RenderOptions;
    use crate::db::{BoolOp, Combination, Database, Member, Solid};
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn two_regions() -> Database {
        let mut db = Database::new("pair");
        db.add_solid(Solid {
            name: "a.s".into(),
            shape: Primitive::rpp([-1.0; 3], [1.0; 3]),
        })
        .unwrap();
        db.add_solid(Solid {
            name: "b.s".into(),
            shape: Primitive::sphere([3.0, 0.0, 0.0], 1.0),
        })
        .unwrap();
        db.add_combination(
            Combination::region("left", [255, 255, 0]).with_member(Member::new(BoolOp::Union, "a.s")),
        )
        .unwrap();
        db.add_combination(
            Combination::region("right", [0, 0, 255]).with_member(Member::new(BoolOp::Union, "b.s")),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_camera_transform_at_reference_angles() {
        // az 270, el 0: no rotation, only the Y-up relocation
        let m = camera_transform(Vector3::new(1.0, 2.0, 3.0), 270.0, 0.0);
        let origin = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vector4::new(1.0, 3.0, -2.0, 1.0), epsilon = 1e-12);
        let forward = m * Vector4::new(0.0, 0.0, -1.0, 0.0);
        assert_relative_eq!(forward, Vector4::new(0.0, 0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_build_project_shared_entities() {
        let db = two_regions();
        let rt = db.prepare(&["left", "right"]).unwrap();
        let options = RenderOptions {
            width: 640,
            height: 0,
            samples: 9,
            appleseed_root: Some("/opt/appleseed".into()),
            ..RenderOptions::default()
        };
        let ctx = ArtContext::new(&rt, options).unwrap();
        let composition = SceneComposer::new(&ctx).build_project().unwrap();
        let project = &composition.project;

        assert_eq!(
            project.search_paths(),
            &[
                "build/Debug".to_string(),
                "/opt/appleseed/shaders/appleseed".to_string(),
                "/opt/appleseed/shaders/max".to_string(),
            ]
        );
        let final_cfg = project.configuration("final").unwrap();
        assert_eq!(final_cfg.params.get_path("uniform_pixel_renderer.samples"), Some("9"));
        assert_eq!(final_cfg.params.get("rendering_threads"), Some("1"));
        let interactive = project.configuration("interactive").unwrap();
        assert_eq!(interactive.params.get("rendering_threads"), Some("1"));

        let scene = project.scene().unwrap();
        assert_eq!(
            scene.assemblies().names(),
            vec!["left_object_assembly", "right_object_assembly", "assembly"]
        );
        assert!(scene.assembly_instances().contains("assembly_inst"));
        assert_eq!(scene.environment().map(|e| e.name.as_str()), Some("sky"));

        let camera = scene.cameras().get("camera").unwrap();
        assert_eq!(camera.params.get("film_dimensions"), Some("0.100000 0.080000"));
        assert_eq!(camera.params.get("focal_length"), Some("0.035"));

        let frame = project.frame().unwrap();
        assert_eq!(frame.resolution, (640, 512));
        assert_eq!(composition.regions.len(), 2);
    }

    #[test]
    fn test_no_regions_is_fatal() {
        let mut db = Database::new("bare");
        db.add_solid(Solid {
            name: "s".into(),
            shape: Primitive::sphere([0.0; 3], 1.0),
        })
        .unwrap();
        let rt = db.prepare(&["s"]).unwrap();
        assert!(matches!(
            ArtContext::new(&rt, RenderOptions::default()),
            Err(ArtError::View(crate::view::ViewError::NoRegions))
        ));
    }
}
