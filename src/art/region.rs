// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-region scene synthesis
//!
//! Each region becomes one cluster: a geometry object, a two-layer shader
//! network, a material, an assembly holding them and an instance of that
//! assembly in the scene.

use super::{ArtContext, ArtError};
use crate::db::{BoundsError, Combination, FullPath, RegionVisitor, TreeState};
use crate::geometry::BoundingBox;
use crate::scene::{
    osl_color, Assembly, AssemblyInstance, Material, Object, ObjectInstance, ParamArray, Scene,
    SceneError, ShaderGroup, SurfaceShader,
};
use nalgebra::Matrix4;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Renderer-side model of the geometry object
pub const OBJECT_MODEL: &str = "brlcad_object";

/// Surface shader shared by name across every region assembly
pub const SURFACE_SHADER_NAME: &str = "Material_mat_surface_shader";

/// Entity names of one region cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNames {
    pub object: String,
    pub assembly: String,
    pub shader_group: String,
    pub material: String,
    pub object_instance: String,
    pub assembly_instance: String,
}

impl ClusterNames {
    pub fn for_region(region: &str) -> Self {
        let assembly = format!("{}_object_assembly", region);
        let shader_group = format!("{}_shader", region);
        Self {
            object: region.to_string(),
            object_instance: format!("{}_brlcad_inst", assembly),
            assembly_instance: format!("{}_inst", assembly),
            material: format!("{}_mat", shader_group),
            assembly,
            shader_group,
        }
    }
}

/// Parameters of the geometry object handed to the renderer plugin
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParams {
    pub database_path: String,
    pub object_count: usize,
    pub bounds: BoundingBox,
}

impl GeometryParams {
    pub fn to_params(&self) -> ParamArray {
        let b = &self.bounds;
        ParamArray::new()
            .insert("database_path", &self.database_path)
            .insert("object_count", self.object_count)
            .insert("minX", b.min.x)
            .insert("minY", b.min.y)
            .insert("minZ", b.min.z)
            .insert("maxX", b.max.x)
            .insert("maxY", b.max.y)
            .insert("maxZ", b.max.z)
    }
}

/// Inputs of the `as_disney_material` layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisneyMaterialParams {
    /// Base colour, each channel in `[0, 1]`
    pub in_color: [f64; 3],
}

impl DisneyMaterialParams {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            in_color: rgb.map(|c| f64::from(c) / 255.0),
        }
    }

    pub fn to_params(&self) -> ParamArray {
        ParamArray::new().insert("in_color", osl_color(self.in_color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSurfaceParams {
    pub lighting_samples: u32,
}

impl Default for PhysicalSurfaceParams {
    fn default() -> Self {
        Self { lighting_samples: 1 }
    }
}

impl PhysicalSurfaceParams {
    pub fn to_params(&self) -> ParamArray {
        ParamArray::new().insert("lighting_samples", self.lighting_samples)
    }
}

/// Outcome of translating one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionReport {
    pub region: String,
    /// Path the region was reached by, e.g. `/all/part1`
    pub path: String,
    pub names: ClusterNames,
    /// Bounds written into the geometry object
    pub bounds: BoundingBox,
    /// Bounds query failure that was absorbed, if any
    pub anomaly: Option<BoundsError>,
}

/// Walk visitor that adds one cluster per region to the scene
pub struct RegionTranslator<'a, 'rt, 'db> {
    ctx: &'a ArtContext<'rt, 'db>,
    scene: &'a mut Scene,
    seen: HashSet<String>,
    reports: Vec<RegionReport>,
    skipped: Vec<String>,
}

impl<'a, 'rt, 'db> RegionTranslator<'a, 'rt, 'db> {
    pub fn new(ctx: &'a ArtContext<'rt, 'db>, scene: &'a mut Scene) -> Self {
        Self {
            ctx,
            scene,
            seen: HashSet::new(),
            reports: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[RegionReport] {
        &self.reports
    }

    /// Paths of regions already translated through another path
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn into_reports(self) -> (Vec<RegionReport>, Vec<String>) {
        (self.reports, self.skipped)
    }

    /// Bounds for the region, absorbing query failures
    fn region_bounds(&self, name: &str) -> (BoundingBox, Option<BoundsError>) {
        match self
            .ctx
            .raytrace()
            .object_bounds(name, self.ctx.resource())
        {
            Ok(bounds) => (bounds, None),
            Err(err) => {
                let bounds = match &err {
                    BoundsError::Suspicious { bounds, .. } => *bounds,
                    BoundsError::NotFound(_) | BoundsError::ForeignResource { .. } => {
                        self.ctx.view().bounds
                    }
                };
                warn!(region = name, "{}; using {:?} - {:?}", err, bounds.min, bounds.max);
                (bounds, Some(err))
            }
        }
    }

    /// Build and attach the cluster for one region
    pub fn translate(&mut self, path: &FullPath, comb: &Combination) -> Result<RegionReport, ArtError> {
        let name = comb.name.as_str();
        let names = ClusterNames::for_region(name);
        let (bounds, anomaly) = self.region_bounds(name);

        let geometry = GeometryParams {
            database_path: name.to_string(),
            object_count: self.ctx.raytrace().tops().len(),
            bounds,
        };

        debug!(
            region = name,
            min = ?bounds.min,
            max = ?bounds.max,
            "translating region"
        );

        self.build_cluster(&names, &geometry, comb.color())
            .map_err(|source| ArtError::Region {
                region: name.to_string(),
                source,
            })?;

        Ok(RegionReport {
            region: name.to_string(),
            path: path.to_string(),
            names,
            bounds,
            anomaly,
        })
    }

    fn build_cluster(
        &mut self,
        names: &ClusterNames,
        geometry: &GeometryParams,
        rgb: [u8; 3],
    ) -> Result<(), SceneError> {
        let object = Object::new(&names.object, OBJECT_MODEL, geometry.to_params());
        let mut assembly = Assembly::new(&names.assembly);

        let mut group = ShaderGroup::new(&names.shader_group);
        let shader_in = group.add_shader(
            "shader",
            "as_disney_material",
            "shader_in",
            DisneyMaterialParams::from_rgb(rgb).to_params(),
        )?;
        let close = group.add_shader("surface", "as_closure2surface", "close", ParamArray::new())?;
        group.add_connection(&shader_in, "out_outColor", &close, "in_input")?;
        let group = assembly.insert_shader_group(group)?;

        let surface = assembly.insert_surface_shader(SurfaceShader::physical(
            SURFACE_SHADER_NAME,
            PhysicalSurfaceParams::default().to_params(),
        ))?;
        let material =
            assembly.insert_material(Material::osl(&names.material, &group, &surface))?;

        let object = assembly.insert_object(object)?;
        assembly.insert_object_instance(
            ObjectInstance::new(&names.object_instance, &object, Matrix4::identity())
                .with_material("default", &material)
                .with_material("default2", &material),
        )?;

        let assembly = self.scene.insert_assembly(assembly)?;
        let mut instance = AssemblyInstance::new(&names.assembly_instance, &assembly);
        instance.transforms.set_transform(0.0, Matrix4::identity());
        self.scene.insert_assembly_instance(instance)?;
        Ok(())
    }
}

impl RegionVisitor for RegionTranslator<'_, '_, '_> {
    type Error = ArtError;

    fn visit_region(
        &mut self,
        _state: &TreeState,
        path: &FullPath,
        comb: &Combination,
    ) -> Result<(), ArtError> {
        if !self.seen.insert(comb.name.clone()) {
            warn!(region = %comb.name, path = %path, "region already translated, skipping");
            self.skipped.push(path.to_string());
            return Ok(());
        }
        let report = self.translate(path, comb)?;
        self.reports.push(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::RenderOptions;
    use crate::db::{BoolOp, Database, Member, Solid};
    use crate::geometry::Primitive;
    use nalgebra::Point3;

    fn part_db() -> Database {
        let mut db = Database::new("parts");
        db.add_solid(Solid {
            name: "plate.s".into(),
            shape: Primitive::rpp([0.0, 0.0, 0.0], [10.0, 10.0, 0.0]),
        })
        .unwrap();
        db.add_combination(
            Combination::region("part1", [255, 0, 0])
                .with_member(Member::new(BoolOp::Union, "plate.s")),
        )
        .unwrap();
        db.add_combination(
            Combination::new("all")
                .with_member(Member::new(BoolOp::Union, "part1"))
                .with_member(Member::new(BoolOp::Union, "part1")),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_cluster_names() {
        let n = ClusterNames::for_region("part1");
        assert_eq!(n.object, "part1");
        assert_eq!(n.assembly, "part1_object_assembly");
        assert_eq!(n.shader_group, "part1_shader");
        assert_eq!(n.material, "part1_shader_mat");
        assert_eq!(n.object_instance, "part1_object_assembly_brlcad_inst");
        assert_eq!(n.assembly_instance, "part1_object_assembly_inst");
    }

    #[test]
    fn test_disney_color_six_decimals() {
        let p = DisneyMaterialParams::from_rgb([255, 0, 128]).to_params();
        assert_eq!(p.get("in_color"), Some("color 1.000000 0.000000 0.501961"));
    }

    #[test]
    fn test_translate_builds_cluster() {
        let db = part_db();
        let rt = db.prepare(&["all"]).unwrap();
        let ctx = ArtContext::new(&rt, RenderOptions::default()).unwrap();
        let mut scene = Scene::new();
        let mut translator = RegionTranslator::new(&ctx, &mut scene);
        rt.walk_regions(&mut translator).unwrap();
        let (reports, skipped) = translator.into_reports();

        assert_eq!(reports.len(), 1);
        assert_eq!(skipped, vec!["/all/part1".to_string()]);
        assert_eq!(reports[0].bounds.max, Point3::new(10.0, 10.0, 0.0));
        assert!(reports[0].anomaly.is_none());

        let asm = scene.assemblies().get("part1_object_assembly").unwrap();
        let obj = asm.objects().get("part1").unwrap();
        assert_eq!(obj.model, "brlcad_object");
        assert_eq!(obj.params.get("database_path"), Some("part1"));
        assert_eq!(obj.params.get("object_count"), Some("1"));
        assert_eq!(obj.params.get("maxX"), Some("10"));

        let group = asm.shader_groups().get("part1_shader").unwrap();
        assert_eq!(group.shaders().len(), 2);
        assert_eq!(
            group.shaders()[0].params.get("in_color"),
            Some("color 1.000000 0.000000 0.000000")
        );
        let edge = &group.connections()[0];
        assert_eq!(
            (edge.src_layer.as_str(), edge.src_param.as_str()),
            ("shader_in", "out_outColor")
        );
        assert_eq!(
            (edge.dst_layer.as_str(), edge.dst_param.as_str()),
            ("close", "in_input")
        );

        assert!(asm.surface_shaders().contains(SURFACE_SHADER_NAME));
        assert!(asm.materials().contains("part1_shader_mat"));
        let inst = asm
            .object_instances()
            .get("part1_object_assembly_brlcad_inst")
            .unwrap();
        assert_eq!(inst.object, "part1");
        assert!(inst.materials.iter().all(|m| m.material == "part1_shader_mat"));

        let ai = scene
            .assembly_instances()
            .get("part1_object_assembly_inst")
            .unwrap();
        assert_eq!(ai.assembly, "part1_object_assembly");
        assert_eq!(ai.transforms.get(0.0), Some(&Matrix4::identity()));
    }

    #[test]
    fn test_unbounded_region_keeps_carried_values() {
        let mut db = Database::new("floor");
        db.add_solid(Solid {
            name: "ground.s".into(),
            shape: Primitive::HalfSpace {
                normal: [0.0, 0.0, 1.0],
                distance: 0.0,
            },
        })
        .unwrap();
        db.add_solid(Solid {
            name: "cube.s".into(),
            shape: Primitive::rpp([0.0; 3], [1.0; 3]),
        })
        .unwrap();
        db.add_combination(
            Combination::region("floor", [90, 90, 90])
                .with_member(Member::new(BoolOp::Union, "ground.s")),
        )
        .unwrap();
        db.add_combination(
            Combination::region("cube", [0, 255, 0])
                .with_member(Member::new(BoolOp::Union, "cube.s")),
        )
        .unwrap();

        let rt = db.prepare(&["floor", "cube"]).unwrap();
        let ctx = ArtContext::new(&rt, RenderOptions::default()).unwrap();
        let mut scene = Scene::new();
        let mut translator = RegionTranslator::new(&ctx, &mut scene);
        rt.walk_regions(&mut translator).unwrap();

        let reports = translator.reports();
        assert_eq!(reports.len(), 2);
        assert!(matches!(
            reports[0].anomaly,
            Some(BoundsError::Suspicious { .. })
        ));
        assert!(reports[0].bounds.max.x.is_infinite());
        assert!(reports[1].anomaly.is_none());
        assert_eq!(scene.assemblies().len(), 2);
    }
}
