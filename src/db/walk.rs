// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Depth-first region walk over a prepared database

use super::model::{Combination, Object};
use super::prep::RaytraceContext;
use nalgebra::Matrix4;
use std::fmt;
use tracing::{debug, trace};

/// State accumulated while descending the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeState {
    /// Number of combinations above the current object
    pub depth: usize,
    /// Product of member placement matrices from the top down
    pub matrix: Matrix4<f64>,
    /// Region identifier of the region being visited
    pub region_id: Option<i32>,
}

impl Default for TreeState {
    fn default() -> Self {
        Self {
            depth: 0,
            matrix: Matrix4::identity(),
            region_id: None,
        }
    }
}

/// Chain of object names from a top-level object to the current one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullPath {
    names: Vec<String>,
}

impl FullPath {
    /// Name of the last object on the path
    pub fn current(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    fn pop(&mut self) {
        self.names.pop();
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.names {
            write!(f, "/{}", name)?;
        }
        Ok(())
    }
}

/// Receives every region reached by [`RaytraceContext::walk_regions`]
pub trait RegionVisitor {
    type Error;

    fn visit_region(
        &mut self,
        state: &TreeState,
        path: &FullPath,
        comb: &Combination,
    ) -> Result<(), Self::Error>;
}

impl<'db> RaytraceContext<'db> {
    /// Walk every top-level object depth-first, left to right in declared
    /// member order, calling the visitor once for each region reached.
    ///
    /// Regions nested inside another region are part of the outer region and
    /// are not reported. The first visitor error stops the walk.
    pub fn walk_regions<V: RegionVisitor>(&self, visitor: &mut V) -> Result<usize, V::Error> {
        let mut visited = 0;
        for top in self.tops() {
            let mut path = FullPath::default();
            let state = TreeState::default();
            self.descend(top, &state, &mut path, visitor, &mut visited)?;
        }
        debug!(regions = visited, "tree walk complete");
        Ok(visited)
    }

    fn descend<V: RegionVisitor>(
        &self,
        name: &str,
        state: &TreeState,
        path: &mut FullPath,
        visitor: &mut V,
        visited: &mut usize,
    ) -> Result<(), V::Error> {
        let comb = match self.database().lookup(name) {
            Some(Object::Combination(comb)) => comb,
            // Solids outside any region carry no material of their own.
            Some(Object::Solid(_)) | None => return Ok(()),
        };

        path.push(name);

        if comb.region {
            let region_state = TreeState {
                region_id: comb.region_id,
                ..state.clone()
            };
            trace!(path = %path, "region start");
            *visited += 1;
            let result = visitor.visit_region(&region_state, path, comb);
            path.pop();
            return result;
        }

        for member in &comb.members {
            let child = TreeState {
                depth: state.depth + 1,
                matrix: state.matrix * member.placement(),
                region_id: state.region_id,
            };
            if let Err(e) = self.descend(&member.name, &child, path, visitor, visited) {
                path.pop();
                return Err(e);
            }
        }

        path.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BoolOp, Database, Member, Solid};
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    struct Collect {
        seen: Vec<(String, String, usize)>,
        fail_on: Option<&'static str>,
    }

    impl RegionVisitor for Collect {
        type Error = String;

        fn visit_region(
            &mut self,
            state: &TreeState,
            path: &FullPath,
            comb: &Combination,
        ) -> Result<(), String> {
            if self.fail_on == Some(comb.name.as_str()) {
                return Err(format!("refused {}", comb.name));
            }
            self.seen
                .push((comb.name.clone(), path.to_string(), state.depth));
            Ok(())
        }
    }

    fn tree() -> Database {
        let mut db = Database::new("walk");
        db.add_solid(Solid {
            name: "s".into(),
            shape: Primitive::sphere([0.0; 3], 1.0),
        })
        .unwrap();
        for name in ["r_a", "r_b", "r_c"] {
            db.add_combination(
                Combination::region(name, [1, 2, 3]).with_member(Member::new(BoolOp::Union, "s")),
            )
            .unwrap();
        }
        // region nested inside r_outer is not reported separately
        db.add_combination(
            Combination::region("r_outer", [9, 9, 9])
                .with_member(Member::new(BoolOp::Union, "r_c")),
        )
        .unwrap();
        db.add_combination(
            Combination::new("group")
                .with_member(Member::new(BoolOp::Union, "r_b"))
                .with_member(Member::new(BoolOp::Union, "r_a").with_matrix(
                    Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)),
                )),
        )
        .unwrap();
        db.add_combination(
            Combination::new("all")
                .with_member(Member::new(BoolOp::Union, "group"))
                .with_member(Member::new(BoolOp::Union, "r_outer"))
                .with_member(Member::new(BoolOp::Union, "s")),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_depth_first_declared_order() {
        let db = tree();
        let rt = db.prepare(&["all"]).unwrap();
        let mut v = Collect {
            seen: Vec::new(),
            fail_on: None,
        };
        let count = rt.walk_regions(&mut v).unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            v.seen,
            vec![
                ("r_b".to_string(), "/all/group/r_b".to_string(), 2),
                ("r_a".to_string(), "/all/group/r_a".to_string(), 2),
                ("r_outer".to_string(), "/all/r_outer".to_string(), 1),
            ]
        );
        assert_eq!(rt.stats().nregions, 3);
    }

    #[test]
    fn test_tops_walked_in_given_order() {
        let db = tree();
        let rt = db.prepare(&["r_c", "r_a"]).unwrap();
        let mut v = Collect {
            seen: Vec::new(),
            fail_on: None,
        };
        rt.walk_regions(&mut v).unwrap();
        let names: Vec<_> = v.seen.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(names, vec!["r_c", "r_a"]);
    }

    #[test]
    fn test_visitor_error_stops_walk() {
        let db = tree();
        let rt = db.prepare(&["all"]).unwrap();
        let mut v = Collect {
            seen: Vec::new(),
            fail_on: Some("r_a"),
        };
        let err = rt.walk_regions(&mut v).unwrap_err();
        assert_eq!(err, "refused r_a");
        assert_eq!(v.seen.len(), 1);
    }

    #[test]
    fn test_full_path_display() {
        let mut p = FullPath::default();
        p.push("a");
        p.push("b");
        assert_eq!(p.to_string(), "/a/b");
        assert_eq!(p.current(), "b");
    }
}
