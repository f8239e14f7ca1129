// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Containment predicates
//!
//! A predicate is built once from a reference volume (a section form) and then
//! tested against many candidate elements. Every variant answers the same
//! question, "does this candidate belong to the reference volume?", and every
//! variant answers `false` when the geometry it needs is missing.

use crate::extraction::{bounding_volume, representative_solid, SOLID_VOLUME_EPSILON};
use crate::csg::{intersection_volume, solid_mesh, SolidMesh};
use sectioner_model::{Aabb, Element, GeometryOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Containment test variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredicateKind {
    /// Candidate bounding volume intersects the reference bounding volume
    #[default]
    Overlap,
    /// Candidate bounding volume lies entirely within the reference bounding volume
    FullyInside,
    /// Exact intersection of representative solids has volume
    SolidIntersect,
}

impl PredicateKind {
    /// All variants
    pub const ALL: [PredicateKind; 3] = [
        PredicateKind::Overlap,
        PredicateKind::FullyInside,
        PredicateKind::SolidIntersect,
    ];

    /// Config/display name
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Overlap => "overlap",
            PredicateKind::FullyInside => "fully-inside",
            PredicateKind::SolidIntersect => "solid-intersect",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reusable containment test built from one reference volume
#[derive(Clone, Debug)]
pub enum ContainmentPredicate {
    /// Bounding volumes intersect (touching faces count)
    Overlap { reference: Aabb },
    /// Candidate bounding volume inside the reference bounding volume
    FullyInside { reference: Aabb },
    /// Exact solid intersection with an AABB pre-filter
    SolidIntersect {
        reference: Aabb,
        mesh: SolidMesh,
        options: GeometryOptions,
    },
    /// Reference geometry could not be extracted; matches nothing
    Never { kind: PredicateKind },
}

impl ContainmentPredicate {
    /// Build a predicate of the given kind from a reference element
    pub fn build(kind: PredicateKind, reference: &Element, options: &GeometryOptions) -> Self {
        let bounds = bounding_volume(reference);
        match kind {
            PredicateKind::Overlap => match bounds {
                Some(reference) => ContainmentPredicate::Overlap { reference },
                None => ContainmentPredicate::Never { kind },
            },
            PredicateKind::FullyInside => match bounds {
                Some(reference) => ContainmentPredicate::FullyInside { reference },
                None => ContainmentPredicate::Never { kind },
            },
            PredicateKind::SolidIntersect => {
                let Some(solid) = representative_solid(reference, options) else {
                    log::debug!("reference {} has no solid body", reference.id);
                    return ContainmentPredicate::Never { kind };
                };
                let mesh = match solid_mesh(solid) {
                    Ok(mesh) => mesh,
                    Err(err) => {
                        log::debug!("reference {} solid is invalid: {}", reference.id, err);
                        return ContainmentPredicate::Never { kind };
                    }
                };
                match bounds.or_else(|| solid.bounds()) {
                    Some(reference) => ContainmentPredicate::SolidIntersect {
                        reference,
                        mesh,
                        options: *options,
                    },
                    None => ContainmentPredicate::Never { kind },
                }
            }
        }
    }

    /// Variant this predicate implements
    pub fn kind(&self) -> PredicateKind {
        match self {
            ContainmentPredicate::Overlap { .. } => PredicateKind::Overlap,
            ContainmentPredicate::FullyInside { .. } => PredicateKind::FullyInside,
            ContainmentPredicate::SolidIntersect { .. } => PredicateKind::SolidIntersect,
            ContainmentPredicate::Never { kind } => *kind,
        }
    }

    /// Region for the cheap spatial pre-filter
    ///
    /// Every element the predicate can match has a bounding volume intersecting
    /// this region. `None` means the predicate matches nothing.
    pub fn region(&self) -> Option<&Aabb> {
        match self {
            ContainmentPredicate::Overlap { reference }
            | ContainmentPredicate::FullyInside { reference }
            | ContainmentPredicate::SolidIntersect { reference, .. } => Some(reference),
            ContainmentPredicate::Never { .. } => None,
        }
    }

    /// Test a candidate element
    pub fn matches(&self, candidate: &Element) -> bool {
        match self {
            ContainmentPredicate::Overlap { reference } => {
                bounding_volume(candidate).is_some_and(|b| reference.intersects(&b))
            }
            ContainmentPredicate::FullyInside { reference } => {
                bounding_volume(candidate).is_some_and(|b| reference.contains(&b))
            }
            ContainmentPredicate::SolidIntersect {
                reference,
                mesh,
                options,
            } => {
                if !bounding_volume(candidate).is_some_and(|b| reference.intersects(&b)) {
                    return false;
                }
                let Some(solid) = representative_solid(candidate, options) else {
                    return false;
                };
                match solid_mesh(solid) {
                    Ok(candidate_mesh) => {
                        intersection_volume(&candidate_mesh, mesh) > SOLID_VOLUME_EPSILON
                    }
                    Err(err) => {
                        log::trace!("candidate {} solid is invalid: {}", candidate.id, err);
                        false
                    }
                }
            }
            ContainmentPredicate::Never { .. } => false,
        }
    }
}
