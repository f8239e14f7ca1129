// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry extraction from elements
//!
//! Read-only helpers that pull a bounding volume or one representative solid
//! body out of an element.

use crate::csg::solid_volume;
use sectioner_model::{Aabb, Element, GeometryKind, GeometryNode, GeometryOptions, Solid};

/// Minimum volume magnitude for a solid to count as non-degenerate
pub const SOLID_VOLUME_EPSILON: f64 = 1e-4;

/// Precomputed axis-aligned extent of an element
///
/// Returns `None` when the element has no geometric representation or the
/// stored extent is not finite.
pub fn bounding_volume(element: &Element) -> Option<Aabb> {
    element.bounding_box.filter(|b| {
        b.min.iter().chain(b.max.iter()).all(|c| c.is_finite())
            && (0..3).all(|axis| b.min[axis] <= b.max[axis])
    })
}

/// First solid in the element's geometry tree whose volume exceeds
/// [`SOLID_VOLUME_EPSILON`]
///
/// The tree is walked depth-first in stored order, so repeated calls pick the
/// same body. Nodes hidden in views are skipped unless
/// `options.include_non_visible` is set; nodes generated only for a finer
/// detail level than requested are skipped.
pub fn representative_solid<'a>(
    element: &'a Element,
    options: &GeometryOptions,
) -> Option<&'a Solid> {
    find_solid(&element.geometry, options)
}

fn find_solid<'a>(nodes: &'a [GeometryNode], options: &GeometryOptions) -> Option<&'a Solid> {
    for node in nodes {
        if !node.visible && !options.include_non_visible {
            continue;
        }
        if node.min_detail > options.detail_level {
            continue;
        }
        match &node.kind {
            GeometryKind::Solid(solid) => {
                if solid_volume(solid).abs() > SOLID_VOLUME_EPSILON {
                    return Some(solid);
                }
            }
            GeometryKind::Instance { children } => {
                if let Some(solid) = find_solid(children, options) {
                    return Some(solid);
                }
            }
            GeometryKind::Curve => {}
        }
    }
    None
}
