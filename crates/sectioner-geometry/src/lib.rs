// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Sectioner Geometry
//!
//! Geometry extraction and containment predicates for assigning elements to
//! section volumes. This crate works on the plain data types of
//! `sectioner-model` and never touches a host document.
//!
//! ## Overview
//!
//! - **Extraction**: bounding volume and first non-degenerate solid of an element
//! - **Predicates**: `Overlap`, `FullyInside` and `SolidIntersect` behind one
//!   [`ContainmentPredicate::matches`] call
//! - **CSG**: exact solid intersection volume (csgrs) for the solid predicate
//! - **Grid index**: bounding-volume pre-filter for large element sets
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sectioner_geometry::{ContainmentPredicate, PredicateKind};
//! use sectioner_model::GeometryOptions;
//!
//! let predicate = ContainmentPredicate::build(PredicateKind::FullyInside, &form, &GeometryOptions::default());
//! let inside: Vec<_> = elements.iter().filter(|e| predicate.matches(e)).collect();
//! ```

pub mod csg;
pub mod error;
pub mod extraction;
pub mod index;
pub mod predicate;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

// Re-export main types
pub use csg::{intersection_volume, mesh_volume, solid_mesh, solid_volume, SolidMesh};
pub use error::{Error, Result};
pub use extraction::{bounding_volume, representative_solid, SOLID_VOLUME_EPSILON};
pub use index::GridIndex;
pub use predicate::{ContainmentPredicate, PredicateKind};
