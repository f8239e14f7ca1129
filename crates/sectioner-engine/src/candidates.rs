// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate set building
//!
//! Narrows a scope down to the elements a section may write to: instances
//! near the section (spatial pre-filter), matching its containment test, and
//! passing the eligibility filter.

use crate::config::ClassificationConfig;
use rustc_hash::FxHashSet;
use sectioner_geometry::ContainmentPredicate;
use sectioner_model::{Aabb, Category, Document, Element, ElementId};

/// A containment test usable by [`build_candidates`]
pub trait CandidateTest {
    /// Pre-filter region; `None` means nothing can match
    fn region(&self) -> Option<Aabb>;

    /// Exact test for one candidate
    fn matches(&self, candidate: &Element) -> bool;
}

impl CandidateTest for ContainmentPredicate {
    fn region(&self) -> Option<Aabb> {
        ContainmentPredicate::region(self).copied()
    }

    fn matches(&self, candidate: &Element) -> bool {
        ContainmentPredicate::matches(self, candidate)
    }
}

/// Category and role filter applied to every candidate
#[derive(Clone, Debug)]
pub struct Eligibility {
    form_category: Category,
    allowed: Vec<Category>,
    denied: Vec<Category>,
    require_type: bool,
}

impl Eligibility {
    /// Filter excluding section forms of `form_category`
    ///
    /// Candidates must be placed from a type definition unless
    /// [`Eligibility::with_require_type`] turns that off.
    pub fn new(form_category: Category) -> Self {
        Self {
            form_category,
            allowed: Vec::new(),
            denied: Vec::new(),
            require_type: true,
        }
    }

    /// Filter described by a run configuration
    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self::new(config.form_category.clone())
            .with_allowed(config.eligibility.allowed_categories.clone())
            .with_denied(config.eligibility.denied_categories.clone())
            .with_require_type(config.eligibility.require_type)
    }

    /// Restrict the location-less allow-list (empty means all model categories)
    pub fn with_allowed(mut self, allowed: Vec<Category>) -> Self {
        self.allowed = allowed;
        self
    }

    /// Deny additional categories
    pub fn with_denied(mut self, denied: Vec<Category>) -> Self {
        self.denied = denied;
        self
    }

    /// Set whether candidates need a type definition
    pub fn with_require_type(mut self, require: bool) -> Self {
        self.require_type = require;
        self
    }

    /// Check if an element may receive a section identifier
    pub fn accepts(&self, element: &Element) -> bool {
        let Some(category) = &element.category else {
            return false;
        };
        if !element.valid
            || (self.require_type && element.type_id.is_none())
            || *category == self.form_category
            || category.is_infrastructure()
            || self.denied.contains(category)
        {
            return false;
        }
        element.location.is_recognized() || self.is_allowed(category)
    }

    fn is_allowed(&self, category: &Category) -> bool {
        if self.allowed.is_empty() {
            category.is_model_category()
        } else {
            self.allowed.contains(category)
        }
    }
}

/// Ids of the eligible instances in `doc` matched by `test`, each once
pub fn build_candidates<T>(doc: &dyn Document, test: &T, eligibility: &Eligibility) -> Vec<ElementId>
where
    T: CandidateTest + ?Sized,
{
    let Some(region) = test.region() else {
        return Vec::new();
    };

    let mut seen = FxHashSet::default();
    doc.elements_in_region(&region)
        .into_iter()
        .filter(|id| seen.insert(*id))
        .filter_map(|id| doc.element(id))
        .filter(|e| !e.is_type)
        .filter(|e| test.matches(e))
        .filter(|e| {
            let ok = eligibility.accepts(e);
            if !ok {
                log::trace!("{}: {} not eligible", doc.name(), e.id);
            }
            ok
        })
        .map(|e| e.id)
        .collect()
}
