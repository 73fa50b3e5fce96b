// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raytrace context: a database prepared for traversal and bounds queries

use super::model::{BoolOp, Database, DbError, Object};
use crate::geometry::BoundingBox;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Maximum number of per-processor resource slots
pub const MAX_PSW: usize = 1024;

/// Identity of one raytrace context; compared by address
#[derive(Debug, Default)]
struct ContextTag;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Suspicious bounds for {name}: min {:?} max {:?}", .bounds.min, .bounds.max)]
    Suspicious { name: String, bounds: BoundingBox },
    #[error("Resource {resource} does not belong to this raytrace context")]
    ForeignResource { resource: usize },
}

/// Per-processor scratch slot bound to one raytrace context
#[derive(Debug, Clone)]
pub struct Resource {
    index: usize,
    owner: Arc<ContextTag>,
}

impl Resource {
    fn belongs_to(&self, tag: &Arc<ContextTag>) -> bool {
        Arc::ptr_eq(&self.owner, tag)
    }
}

/// Fixed-size pool of resources, allocated once per context
#[derive(Debug)]
pub struct ResourcePool {
    slots: Vec<Resource>,
}

impl ResourcePool {
    fn new(owner: &Arc<ContextTag>) -> Self {
        let slots = (0..MAX_PSW)
            .map(|index| Resource {
                index,
                owner: Arc::clone(owner),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The single slot used by sequential callers
    pub fn primary(&self) -> &Resource {
        &self.slots[0]
    }
}

/// Counts gathered while preparing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepStats {
    /// Primitive leaves instanced under the top-level objects
    pub nsolids: usize,
    /// Regions reachable from the top-level objects
    pub nregions: usize,
}

/// A database prepared for one render
#[derive(Debug)]
pub struct RaytraceContext<'db> {
    tag: Arc<ContextTag>,
    db: &'db Database,
    tops: Vec<String>,
    stats: PrepStats,
    model_bounds: BoundingBox,
    resources: ResourcePool,
}

impl Database {
    /// Resolve the top-level objects and prepare them for traversal.
    ///
    /// Every reference under the tops must resolve and no reference may lead
    /// back to one of its ancestors.
    pub fn prepare<S: AsRef<str>>(&self, tops: &[S]) -> Result<RaytraceContext<'_>, DbError> {
        if tops.is_empty() {
            return Err(DbError::NoObjects);
        }

        let mut stats = PrepStats::default();
        let mut model_bounds = BoundingBox::empty();
        let mut top_names = Vec::with_capacity(tops.len());

        for top in tops {
            let top = top.as_ref();
            if !self.contains(top) {
                return Err(DbError::NotFound(top.to_string()));
            }
            let mut stack = Vec::new();
            self.count(top, false, &mut stack, &mut stats)?;
            model_bounds = model_bounds.union(&self.tree_bounds(top));
            top_names.push(top.to_string());
        }

        let tag = Arc::new(ContextTag);
        info!(
            solids = stats.nsolids,
            regions = stats.nregions,
            "prepared {} top-level object(s)",
            top_names.len()
        );
        debug!(min = ?model_bounds.min, max = ?model_bounds.max, "raw model bounds");

        Ok(RaytraceContext {
            resources: ResourcePool::new(&tag),
            tag,
            db: self,
            tops: top_names,
            stats,
            model_bounds,
        })
    }

    fn count<'a>(
        &'a self,
        name: &'a str,
        in_region: bool,
        stack: &mut Vec<&'a str>,
        stats: &mut PrepStats,
    ) -> Result<(), DbError> {
        if stack.contains(&name) {
            let mut path = stack.join("/");
            path.push('/');
            path.push_str(name);
            return Err(DbError::Cycle(path));
        }

        match self.lookup(name) {
            None => Err(DbError::NotFound(name.to_string())),
            Some(Object::Solid(_)) => {
                stats.nsolids += 1;
                Ok(())
            }
            Some(Object::Combination(comb)) => {
                let starts_region = comb.region && !in_region;
                if starts_region {
                    stats.nregions += 1;
                }
                stack.push(name);
                for member in &comb.members {
                    if !self.contains(&member.name) {
                        return Err(DbError::DanglingReference {
                            parent: comb.name.clone(),
                            member: member.name.clone(),
                        });
                    }
                    self.count(&member.name, in_region || starts_region, stack, stats)?;
                }
                stack.pop();
                Ok(())
            }
        }
    }

    /// Bounds of a resolved tree. Callers guarantee the tree is acyclic.
    fn tree_bounds(&self, name: &str) -> BoundingBox {
        match self.lookup(name) {
            None => BoundingBox::empty(),
            Some(Object::Solid(solid)) => solid.shape.bounds(),
            Some(Object::Combination(comb)) => {
                let mut acc: Option<BoundingBox> = None;
                for member in &comb.members {
                    let b = self.tree_bounds(&member.name).transformed(&member.placement());
                    acc = Some(match (acc, member.op) {
                        (None, _) => b,
                        (Some(a), BoolOp::Union) => a.union(&b),
                        (Some(a), BoolOp::Intersect) => a.intersection(&b),
                        (Some(a), BoolOp::Subtract) => a,
                    });
                }
                acc.unwrap_or_else(BoundingBox::empty)
            }
        }
    }
}

impl<'db> RaytraceContext<'db> {
    pub fn database(&self) -> &'db Database {
        self.db
    }

    pub fn tops(&self) -> &[String] {
        &self.tops
    }

    pub fn stats(&self) -> PrepStats {
        self.stats
    }

    /// Raw model bounds; may be unbounded or empty
    pub fn model_bounds(&self) -> BoundingBox {
        self.model_bounds
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    /// Synchronous bounds query for one object.
    ///
    /// Boxes that come out non-finite or inverted are reported as
    /// [`BoundsError::Suspicious`] together with the computed values.
    pub fn object_bounds(&self, name: &str, resource: &Resource) -> Result<BoundingBox, BoundsError> {
        if !resource.belongs_to(&self.tag) {
            return Err(BoundsError::ForeignResource {
                resource: resource.index,
            });
        }
        if !self.db.contains(name) {
            return Err(BoundsError::NotFound(name.to_string()));
        }

        let bounds = self.db.tree_bounds(name);
        if !bounds.is_finite() || bounds.is_inverted() {
            return Err(BoundsError::Suspicious {
                name: name.to_string(),
                bounds,
            });
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Combination, Member, Solid};
    use crate::geometry::Primitive;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn sample() -> Database {
        let mut db = Database::new("prep");
        db.add_solid(Solid {
            name: "box.s".into(),
            shape: Primitive::rpp([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]),
        })
        .unwrap();
        db.add_solid(Solid {
            name: "ball.s".into(),
            shape: Primitive::sphere([4.0, 4.0, 4.0], 1.0),
        })
        .unwrap();
        db.add_combination(
            Combination::region("r1", [10, 20, 30])
                .with_member(Member::new(BoolOp::Union, "box.s"))
                .with_member(Member::new(BoolOp::Subtract, "ball.s")),
        )
        .unwrap();
        db.add_combination(
            Combination::region("r2", [0, 0, 255]).with_member(
                Member::new(BoolOp::Union, "ball.s")
                    .with_matrix(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0))),
            ),
        )
        .unwrap();
        db.add_combination(
            Combination::new("all")
                .with_member(Member::new(BoolOp::Union, "r1"))
                .with_member(Member::new(BoolOp::Union, "r2")),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_prepare_counts() {
        let db = sample();
        let rt = db.prepare(&["all"]).unwrap();
        assert_eq!(rt.stats(), PrepStats { nsolids: 3, nregions: 2 });
        assert_eq!(rt.resources().len(), MAX_PSW);
    }

    #[test]
    fn test_subtraction_does_not_grow_bounds() {
        let db = sample();
        let rt = db.prepare(&["all"]).unwrap();
        let b = rt.object_bounds("r1", rt.resources().primary()).unwrap();
        assert_eq!(b.max, Point3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn test_member_matrix_moves_bounds() {
        let db = sample();
        let rt = db.prepare(&["all"]).unwrap();
        let b = rt.object_bounds("r2", rt.resources().primary()).unwrap();
        assert!(b.approx_eq(
            &BoundingBox::new(Point3::new(13.0, 3.0, 3.0), Point3::new(15.0, 5.0, 5.0)),
            1e-12
        ));
        assert_eq!(rt.model_bounds().max.x, 15.0);
    }

    #[test]
    fn test_missing_top_is_fatal() {
        let db = sample();
        assert!(matches!(db.prepare(&["nope"]), Err(DbError::NotFound(_))));
        let none: [&str; 0] = [];
        assert!(matches!(db.prepare(&none), Err(DbError::NoObjects)));
    }

    #[test]
    fn test_cycle_detected() {
        let mut db = Database::new("cycle");
        db.add_combination(Combination::new("a").with_member(Member::new(BoolOp::Union, "b")))
            .unwrap();
        db.add_combination(Combination::new("b").with_member(Member::new(BoolOp::Union, "a")))
            .unwrap();
        assert!(matches!(db.prepare(&["a"]), Err(DbError::Cycle(ref p)) if p == "a/b/a"));
    }

    #[test]
    fn test_dangling_member() {
        let mut db = Database::new("dangling");
        db.add_combination(Combination::new("a").with_member(Member::new(BoolOp::Union, "ghost")))
            .unwrap();
        assert!(matches!(
            db.prepare(&["a"]),
            Err(DbError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_bounds_query_error_channel() {
        let db = sample();
        let rt = db.prepare(&["all"]).unwrap();
        let res = rt.resources().primary();
        assert_eq!(
            rt.object_bounds("ghost", res),
            Err(BoundsError::NotFound("ghost".into()))
        );

        let other = db.prepare(&["r1"]).unwrap();
        assert!(matches!(
            rt.object_bounds("r1", other.resources().primary()),
            Err(BoundsError::ForeignResource { resource: 0 })
        ));
    }

    #[test]
    fn test_resources_follow_a_moved_context() {
        let db = sample();
        let contexts = vec![db.prepare(&["r1"]).unwrap(), db.prepare(&["r2"]).unwrap()];
        let first = contexts[0].resources().primary().clone();
        assert!(contexts[0].object_bounds("r1", &first).is_ok());
        assert!(matches!(
            contexts[1].object_bounds("r2", &first),
            Err(BoundsError::ForeignResource { .. })
        ));
    }

    #[test]
    fn test_half_space_bounds_are_suspicious() {
        let mut db = Database::new("half");
        db.add_solid(Solid {
            name: "floor.s".into(),
            shape: Primitive::HalfSpace {
                normal: [0.0, 0.0, 1.0],
                distance: 0.0,
            },
        })
        .unwrap();
        db.add_combination(
            Combination::region("floor", [128, 128, 128])
                .with_member(Member::new(BoolOp::Union, "floor.s")),
        )
        .unwrap();
        let rt = db.prepare(&["floor"]).unwrap();
        assert!(!rt.model_bounds().is_finite());
        assert!(matches!(
            rt.object_bounds("floor", rt.resources().primary()),
            Err(BoundsError::Suspicious { .. })
        ));
    }
}
