// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric data attached to elements
//!
//! Bounding volumes, boundary-represented solids and the element geometry tree. These
//! are plain data; the math lives in `sectioner-geometry`.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding volume
///
/// `min` is component-wise less than or equal to `max`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner [x, y, z]
    pub min: [f64; 3],
    /// Maximum corner [x, y, z]
    pub max: [f64; 3],
}

impl Aabb {
    /// Create a bounding volume from two opposite corners (in any order)
    pub fn new(a: [f64; 3], b: [f64; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Smallest volume containing all points, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.include(*p);
        }
        Some(bounds)
    }

    /// Grow to include a point
    pub fn include(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Smallest volume containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.include(other.min);
        out.include(other.max);
        out
    }

    /// Interval overlap on all three axes (touching faces count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Check if `other` lies entirely within this volume on all three axes
    ///
    /// Shared boundary planes count as inside.
    pub fn contains(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    /// Check if a point lies inside or on the boundary
    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }

    /// Edge lengths along x, y, z
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Center point
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Enclosed volume
    pub fn volume(&self) -> f64 {
        let [x, y, z] = self.extent();
        x * y * z
    }
}

/// Closed polygonal boundary of one solid lump
///
/// Each face is a planar simple polygon (convex or not) with vertices ordered
/// counter-clockwise when viewed from outside the shell.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Shell {
    /// Boundary faces
    pub faces: Vec<Vec<[f64; 3]>>,
}

impl Shell {
    /// Create a shell from outward-oriented faces
    pub fn new(faces: Vec<Vec<[f64; 3]>>) -> Self {
        Self { faces }
    }

    /// Axis-aligned box as a shell
    pub fn cuboid(bounds: &Aabb) -> Self {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        Self {
            faces: vec![
                // -Z
                vec![[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]],
                // +Z
                vec![[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]],
                // -Y
                vec![[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
                // +Y
                vec![[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]],
                // -X
                vec![[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
                // +X
                vec![[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]],
            ],
        }
    }

    /// Check if the shell has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Bounding volume of all vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.faces.iter().flatten())
    }
}

/// A solid body bounded by one or more non-overlapping shells
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Solid {
    /// Boundary shells
    pub shells: Vec<Shell>,
}

impl Solid {
    /// Create a solid from shells
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }

    /// Single-piece box solid
    pub fn cuboid(bounds: &Aabb) -> Self {
        Self {
            shells: vec![Shell::cuboid(bounds)],
        }
    }

    /// Check if the solid has no faces
    pub fn is_empty(&self) -> bool {
        self.shells.iter().all(Shell::is_empty)
    }

    /// Bounding volume of all shells
    pub fn bounds(&self) -> Option<Aabb> {
        self.shells
            .iter()
            .filter_map(Shell::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

/// Level of detail a geometry node is generated for
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Coarse,
    Medium,
    #[default]
    Fine,
}

/// Options controlling how an element's geometry tree is walked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeometryOptions {
    /// Detail level to request; nodes generated only for finer levels are skipped
    #[serde(default)]
    pub detail_level: DetailLevel,
    /// Include sub-geometry that is hidden in views
    #[serde(default)]
    pub include_non_visible: bool,
}

impl GeometryOptions {
    /// Create options for a detail level
    pub fn new(detail_level: DetailLevel) -> Self {
        Self {
            detail_level,
            include_non_visible: false,
        }
    }

    /// Set whether hidden sub-geometry is included
    pub fn with_non_visible(mut self, include: bool) -> Self {
        self.include_non_visible = include;
        self
    }
}

/// Kind of geometry held by a node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryKind {
    /// A solid body
    Solid(Solid),
    /// Curve or other non-volumetric geometry
    Curve,
    /// Nested instance geometry (e.g. a family symbol placed in the model)
    Instance { children: Vec<GeometryNode> },
}

/// Node in an element's geometry tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryNode {
    /// Geometry payload
    #[serde(flatten)]
    pub kind: GeometryKind,
    /// Whether the node is visible in views
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Coarsest detail level at which the node is generated
    #[serde(default = "default_min_detail")]
    pub min_detail: DetailLevel,
}

fn default_visible() -> bool {
    true
}

fn default_min_detail() -> DetailLevel {
    DetailLevel::Coarse
}

impl GeometryNode {
    /// Visible solid node generated at every detail level
    pub fn solid(solid: Solid) -> Self {
        Self {
            kind: GeometryKind::Solid(solid),
            visible: true,
            min_detail: DetailLevel::Coarse,
        }
    }

    /// Visible curve node
    pub fn curve() -> Self {
        Self {
            kind: GeometryKind::Curve,
            visible: true,
            min_detail: DetailLevel::Coarse,
        }
    }

    /// Visible instance node wrapping children
    pub fn instance(children: Vec<GeometryNode>) -> Self {
        Self {
            kind: GeometryKind::Instance { children },
            visible: true,
            min_detail: DetailLevel::Coarse,
        }
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set coarsest detail level
    pub fn with_min_detail(mut self, level: DetailLevel) -> Self {
        self.min_detail = level;
        self
    }
}
