// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! target_attribute = "BS_Блок"
//! match_policy = "first-match-wins"
//!
//! [predicate]
//! default = "overlap"
//!
//! [[predicate.overrides]]
//! scope_name_contains = "АР"
//! categories = ["Walls"]
//! kind = "solid-intersect"
//!
//! [federation]
//! link_name_contains = "АР"
//! ```

use crate::error::{EngineError, Result};
use sectioner_geometry::PredicateKind;
use sectioner_model::{Category, GeometryOptions, OpenOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a section form's label is read from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelSource {
    /// The form instance only
    Instance,
    /// The form's type definition only
    Type,
    /// The instance, falling back to the type definition
    #[default]
    InstanceThenType,
}

/// Which section wins when several match one element in a scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Every matching section writes; the last in registry order remains
    #[default]
    LastMatchWins,
    /// The first matching section in registry order claims the element
    FirstMatchWins,
}

/// Unit of atomicity for attribute writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchGranularity {
    /// One batch per section and scope
    #[default]
    PerSection,
    /// One batch for all sections of a scope
    PerScope,
}

/// Predicate override rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredicateOverride {
    /// Scope name must contain this substring (any scope if unset)
    #[serde(default)]
    pub scope_name_contains: Option<String>,
    /// Candidate category must be one of these (any category if empty)
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Predicate variant to use
    pub kind: PredicateKind,
}

impl PredicateOverride {
    fn applies(&self, scope_name: &str, category: Option<&Category>) -> bool {
        let scope_ok = self
            .scope_name_contains
            .as_deref()
            .map_or(true, |needle| scope_name.contains(needle));
        let category_ok =
            self.categories.is_empty() || category.is_some_and(|c| self.categories.contains(c));
        scope_ok && category_ok
    }
}

/// Predicate selection
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredicateConfig {
    /// Variant used when no override applies
    pub default: PredicateKind,
    /// Overrides, first applicable wins
    pub overrides: Vec<PredicateOverride>,
}

impl PredicateConfig {
    /// Variant to test a candidate of `category` with, inside `scope_name`
    pub fn select(&self, scope_name: &str, category: Option<&Category>) -> PredicateKind {
        self.overrides
            .iter()
            .find(|o| o.applies(scope_name, category))
            .map_or(self.default, |o| o.kind)
    }

    /// Every variant this configuration can select, without duplicates
    pub fn kinds(&self) -> Vec<PredicateKind> {
        let mut kinds = vec![self.default];
        for o in &self.overrides {
            if !kinds.contains(&o.kind) {
                kinds.push(o.kind);
            }
        }
        kinds
    }
}

/// Candidate eligibility rules
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Categories accepted without a point or curve location
    ///
    /// Empty means every model category is accepted.
    pub allowed_categories: Vec<Category>,
    /// Categories rejected in addition to the infrastructure categories
    pub denied_categories: Vec<Category>,
    /// Reject instances that were not placed from a type definition
    pub require_type: bool,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            allowed_categories: Vec::new(),
            denied_categories: Vec::new(),
            require_type: true,
        }
    }
}

/// Linked document handling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Classify the primary document too
    pub process_primary: bool,
    /// Only process links whose name contains this substring
    pub link_name_contains: Option<String>,
    /// Synchronize each link with its central copy after writing
    pub synchronize: bool,
    /// Reload unloaded links when the run ends
    pub reload_links: bool,
    /// Options used to open linked documents
    pub open: OpenOptions,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            process_primary: true,
            link_name_contains: None,
            synchronize: true,
            reload_links: true,
            open: OpenOptions::default(),
        }
    }
}

/// Configuration for one classification run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Attribute receiving the section identifier
    pub target_attribute: String,
    /// Attribute holding a section form's label
    pub label_attribute: String,
    /// Where the label is read from
    pub label_source: LabelSource,
    /// Category of section forms
    pub form_category: Category,
    /// Predicate selection
    pub predicate: PredicateConfig,
    /// Winner among several matching sections
    pub match_policy: MatchPolicy,
    /// Unit of atomicity for writes
    pub batch_granularity: BatchGranularity,
    /// Geometry walk options for solid extraction
    pub geometry: GeometryOptions,
    /// Candidate eligibility lists
    pub eligibility: EligibilityConfig,
    /// Linked document handling
    pub federation: FederationConfig,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            target_attribute: "BS_Блок".to_string(),
            label_attribute: "Группа модели".to_string(),
            label_source: LabelSource::default(),
            form_category: Category::Mass,
            predicate: PredicateConfig::default(),
            match_policy: MatchPolicy::default(),
            batch_granularity: BatchGranularity::default(),
            geometry: GeometryOptions::default(),
            eligibility: EligibilityConfig::default(),
            federation: FederationConfig::default(),
        }
    }
}

impl ClassificationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::config(e.to_string()))
    }

    /// Check field consistency
    pub fn validate(&self) -> Result<()> {
        if self.target_attribute.trim().is_empty() {
            return Err(EngineError::config("target_attribute must not be empty"));
        }
        if self.label_attribute.trim().is_empty() {
            return Err(EngineError::config("label_attribute must not be empty"));
        }
        if self.form_category.is_model_category() {
            log::warn!(
                "form_category '{}' is a model category; its elements are never classified",
                self.form_category
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioner_model::DetailLevel;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ClassificationConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClassificationConfig::default());
        assert_eq!(config.target_attribute, "BS_Блок");
        assert_eq!(config.form_category, Category::Mass);
        assert!(config.federation.process_primary);
        assert!(config.federation.reload_links);
        assert!(config.eligibility.require_type);
    }

    #[test]
    fn test_full_document() {
        let config = ClassificationConfig::from_toml_str(
            r#"
            target_attribute = "Zone"
            label_source = "type"
            match_policy = "first-match-wins"
            batch_granularity = "per-scope"

            [predicate]
            default = "fully-inside"

            [[predicate.overrides]]
            scope_name_contains = "АР"
            categories = ["Walls", "OST_Floors"]
            kind = "solid-intersect"

            [geometry]
            detail_level = "medium"
            include_non_visible = true

            [eligibility]
            denied_categories = ["Furniture"]
            require_type = false

            [federation]
            link_name_contains = "АР"
            synchronize = false
            "#,
        )
        .unwrap();

        assert_eq!(config.target_attribute, "Zone");
        assert_eq!(config.label_source, LabelSource::Type);
        assert_eq!(config.match_policy, MatchPolicy::FirstMatchWins);
        assert_eq!(config.batch_granularity, BatchGranularity::PerScope);
        assert_eq!(config.predicate.default, PredicateKind::FullyInside);
        assert_eq!(
            config.predicate.overrides[0].categories,
            vec![Category::Walls, Category::Floors]
        );
        assert_eq!(config.geometry.detail_level, DetailLevel::Medium);
        assert!(config.geometry.include_non_visible);
        assert_eq!(config.eligibility.denied_categories, vec![Category::Furniture]);
        assert!(!config.eligibility.require_type);
        assert_eq!(config.federation.link_name_contains.as_deref(), Some("АР"));
        assert!(!config.federation.synchronize);
        assert!(config.federation.process_primary);
    }

    #[test]
    fn test_unknown_variant_is_config_error() {
        let err = ClassificationConfig::from_toml_str("match_policy = \"random\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_validation() {
        let err = ClassificationConfig::from_toml_str("target_attribute = \"  \"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        let err = ClassificationConfig::from_toml_str("label_attribute = \"\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_model_category_forms_are_accepted() {
        let config = ClassificationConfig::from_toml_str("form_category = \"GenericModel\"").unwrap();
        assert_eq!(config.form_category, Category::GenericModel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_predicate_selection() {
        let predicate = PredicateConfig {
            default: PredicateKind::Overlap,
            overrides: vec![
                PredicateOverride {
                    scope_name_contains: Some("АР".into()),
                    categories: vec![Category::Walls],
                    kind: PredicateKind::SolidIntersect,
                },
                PredicateOverride {
                    scope_name_contains: Some("АР".into()),
                    categories: vec![],
                    kind: PredicateKind::FullyInside,
                },
            ],
        };

        let walls = Some(&Category::Walls);
        let doors = Some(&Category::Doors);
        assert_eq!(predicate.select("Корпус_АР", walls), PredicateKind::SolidIntersect);
        assert_eq!(predicate.select("Корпус_АР", doors), PredicateKind::FullyInside);
        assert_eq!(predicate.select("Корпус_КР", walls), PredicateKind::Overlap);
        assert_eq!(
            predicate.kinds(),
            vec![
                PredicateKind::Overlap,
                PredicateKind::SolidIntersect,
                PredicateKind::FullyInside
            ]
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ClassificationConfig::default();
        config.federation.link_name_contains = Some("КР".into());
        let text = config.to_toml_string().unwrap();
        assert_eq!(ClassificationConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sectioner.toml");
        std::fs::write(&path, "label_attribute = \"Label\"\n").unwrap();
        let config = ClassificationConfig::load(&path).unwrap();
        assert_eq!(config.label_attribute, "Label");

        let missing = ClassificationConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(EngineError::Io(_))));
    }
}
