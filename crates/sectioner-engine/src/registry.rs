// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section registry
//!
//! Scans the primary document for section forms and builds one entry per
//! labelled form. Entries are kept in form enumeration order; forms sharing a
//! label stay separate entries.

use crate::candidates::CandidateTest;
use crate::config::{ClassificationConfig, LabelSource, PredicateConfig};
use sectioner_geometry::{ContainmentPredicate, PredicateKind};
use sectioner_model::{Aabb, Document, Element, ElementId};

/// One registered section form
#[derive(Clone, Debug)]
pub struct SectionEntry {
    /// Section identifier written to matched elements
    pub label: String,
    /// Form element the predicates were built from
    pub form_id: ElementId,
    predicates: Vec<ContainmentPredicate>,
}

impl SectionEntry {
    /// Build an entry with one predicate per requested kind
    pub fn new(
        label: impl Into<String>,
        form: &Element,
        kinds: &[PredicateKind],
        config: &ClassificationConfig,
    ) -> Self {
        Self {
            label: label.into(),
            form_id: form.id,
            predicates: kinds
                .iter()
                .map(|kind| ContainmentPredicate::build(*kind, form, &config.geometry))
                .collect(),
        }
    }

    /// Predicate of the given kind, if one was built
    pub fn predicate(&self, kind: PredicateKind) -> Option<&ContainmentPredicate> {
        self.predicates.iter().find(|p| p.kind() == kind)
    }

    /// Bind the entry to a scope, selecting a predicate per candidate
    pub fn scoped<'a>(
        &'a self,
        selection: &'a PredicateConfig,
        scope_name: &'a str,
    ) -> ScopedPredicate<'a> {
        ScopedPredicate {
            entry: self,
            selection,
            scope_name,
        }
    }
}

/// A section entry bound to one scope
///
/// The variant used for a candidate depends on the scope name and the
/// candidate's category.
pub struct ScopedPredicate<'a> {
    entry: &'a SectionEntry,
    selection: &'a PredicateConfig,
    scope_name: &'a str,
}

impl CandidateTest for ScopedPredicate<'_> {
    fn region(&self) -> Option<Aabb> {
        self.entry
            .predicates
            .iter()
            .filter_map(|p| p.region())
            .copied()
            .reduce(|a, b| a.union(&b))
    }

    fn matches(&self, candidate: &Element) -> bool {
        let kind = self
            .selection
            .select(self.scope_name, candidate.category.as_ref());
        self.entry
            .predicate(kind)
            .is_some_and(|p| p.matches(candidate))
    }
}

/// Ordered list of section entries
#[derive(Clone, Debug, Default)]
pub struct SectionRegistry {
    entries: Vec<SectionEntry>,
}

impl SectionRegistry {
    /// Scan `doc` for section forms
    ///
    /// Forms whose label is missing or blank are skipped. Each registered form
    /// gets an independent predicate for every variant the configuration can
    /// select.
    pub fn build(doc: &dyn Document, config: &ClassificationConfig) -> Self {
        let kinds = config.predicate.kinds();
        let forms: Vec<&Element> = doc
            .elements_of_category(&config.form_category)
            .into_iter()
            .filter_map(|id| doc.element(id))
            .filter(|e| !e.is_type && e.valid)
            .collect();

        let entries: Vec<SectionEntry> = forms
            .iter()
            .filter_map(|form| match form_label(doc, form, config) {
                Some(label) => Some(SectionEntry::new(label, form, &kinds, config)),
                None => {
                    log::trace!("{}: form {} has no label", doc.name(), form.id);
                    None
                }
            })
            .collect();

        log::info!(
            "{}: {} section(s) registered from {} form(s)",
            doc.name(),
            entries.len(),
            forms.len()
        );
        Self { entries }
    }

    /// Registry from prepared entries
    pub fn from_entries(entries: Vec<SectionEntry>) -> Self {
        Self { entries }
    }

    /// Entries in registration order
    pub fn entries(&self) -> &[SectionEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no section was registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct labels in first-seen order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !labels.contains(&entry.label.as_str()) {
                labels.push(&entry.label);
            }
        }
        labels
    }
}

fn form_label(doc: &dyn Document, form: &Element, config: &ClassificationConfig) -> Option<String> {
    let name = config.label_attribute.as_str();
    let instance = || non_blank(form.attribute_str(name));
    let from_type = || {
        form.type_id
            .and_then(|t| doc.element(t))
            .and_then(|t| non_blank(t.attribute_str(name)))
    };

    let label = match config.label_source {
        LabelSource::Instance => instance(),
        LabelSource::Type => from_type(),
        LabelSource::InstanceThenType => instance().or_else(from_type),
    };
    label.map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredicateOverride;
    use sectioner_model::{Attribute, AttributeValue, Category};
    use sectioner_store::MemoryDocument;

    const LABEL: &str = "Группа модели";

    fn form(id: u64, label: Option<&str>) -> Element {
        let e = Element::new(id)
            .with_category(Category::Mass)
            .with_bounds(Aabb::new([0.0; 3], [10.0; 3]));
        match label {
            Some(l) => e.with_attribute(Attribute::new(LABEL, l)),
            None => e,
        }
    }

    #[test]
    fn test_blank_and_missing_labels_are_skipped() {
        let doc = MemoryDocument::new("Primary")
            .with_element(form(1, Some("A")))
            .with_element(form(2, Some("")))
            .with_element(form(3, Some("   ")))
            .with_element(form(4, None))
            .with_element(form(5, Some("B")))
            .with_element(
                form(6, None).with_attribute(Attribute {
                    name: LABEL.into(),
                    value: AttributeValue::Null,
                    read_only: false,
                }),
            );

        let registry = SectionRegistry::build(&doc, &ClassificationConfig::default());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.labels(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_labels_stay_separate() {
        let doc = MemoryDocument::new("Primary")
            .with_element(form(1, Some("B")))
            .with_element(form(2, Some("B")));
        let registry = SectionRegistry::build(&doc, &ClassificationConfig::default());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.labels(), vec!["B"]);
        assert_ne!(registry.entries()[0].form_id, registry.entries()[1].form_id);
    }

    #[test]
    fn test_label_sources() {
        let form_type = Element::new(50u64)
            .with_category(Category::Mass)
            .as_type()
            .with_attribute(Attribute::new(LABEL, "FromType"));
        let doc = MemoryDocument::new("Primary")
            .with_element(form_type)
            .with_element(form(1, None).with_type(50u64))
            .with_element(form(2, Some("Own")).with_type(50u64));

        let labels = |source: LabelSource| {
            let config = ClassificationConfig {
                label_source: source,
                ..Default::default()
            };
            SectionRegistry::build(&doc, &config)
                .entries()
                .iter()
                .map(|e| e.label.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(labels(LabelSource::Instance), vec!["Own"]);
        assert_eq!(labels(LabelSource::Type), vec!["FromType", "FromType"]);
        assert_eq!(labels(LabelSource::InstanceThenType), vec!["FromType", "Own"]);
    }

    #[test]
    fn test_entry_builds_every_selectable_kind() {
        let mut config = ClassificationConfig::default();
        config.predicate.overrides.push(PredicateOverride {
            scope_name_contains: Some("АР".into()),
            categories: vec![],
            kind: PredicateKind::FullyInside,
        });

        let doc = MemoryDocument::new("Primary").with_element(form(1, Some("A")));
        let registry = SectionRegistry::build(&doc, &config);
        let entry = &registry.entries()[0];
        assert!(entry.predicate(PredicateKind::Overlap).is_some());
        assert!(entry.predicate(PredicateKind::FullyInside).is_some());
        assert!(entry.predicate(PredicateKind::SolidIntersect).is_none());

        let straddling = Element::new(9u64)
            .with_category(Category::Walls)
            .with_bounds(Aabb::new([9.0; 3], [11.0; 3]));
        assert!(entry.scoped(&config.predicate, "Корпус_КР").matches(&straddling));
        assert!(!entry.scoped(&config.predicate, "Корпус_АР").matches(&straddling));
    }
}
