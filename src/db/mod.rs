// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry database - loading, preparation and region traversal

mod model;
mod prep;
mod walk;

pub use model::{BoolOp, Combination, Database, DbError, Member, Object, Solid};
pub use prep::{BoundsError, PrepStats, RaytraceContext, Resource, ResourcePool, MAX_PSW};
pub use walk::{FullPath, RegionVisitor, TreeState};
