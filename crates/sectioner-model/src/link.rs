// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linked documents participating in federation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a link reference in the primary document
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Reference from the primary document to an external document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkReference {
    /// Link ID
    pub id: LinkId,
    /// Display name (usually the linked file name)
    pub name: String,
    /// External file reference; `None` when the host cannot resolve it
    #[serde(default)]
    pub path: Option<String>,
    /// Whether the link is nested inside another link
    #[serde(default)]
    pub nested: bool,
    /// Whether the link is currently loaded in the primary document
    #[serde(default = "default_loaded")]
    pub loaded: bool,
}

fn default_loaded() -> bool {
    true
}

impl LinkReference {
    /// Create a loaded top-level link
    pub fn new(id: u64, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: LinkId(id),
            name: name.into(),
            path: Some(path.into()),
            nested: false,
            loaded: true,
        }
    }

    /// Create a link whose external file could not be resolved
    pub fn unresolved(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: LinkId(id),
            name: name.into(),
            path: None,
            nested: false,
            loaded: false,
        }
    }

    /// Mark as nested
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Set loaded state
    pub fn with_loaded(mut self, loaded: bool) -> Self {
        self.loaded = loaded;
        self
    }

    /// Check if the external file reference is resolved
    pub fn is_resolved(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Check if this link should be unloaded before its document is opened
    pub fn needs_unload(&self) -> bool {
        !self.nested && self.loaded
    }
}

/// Options for opening a linked document as an independent scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// Open every workset (partition) of the document
    pub all_worksets: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { all_worksets: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_resolution() {
        assert!(LinkReference::new(1, "AR.json", "links/AR.json").is_resolved());
        assert!(!LinkReference::unresolved(2, "Missing").is_resolved());

        let mut empty = LinkReference::new(3, "Empty", "");
        assert!(!empty.is_resolved());
        empty.path = None;
        assert!(!empty.is_resolved());
    }

    #[test]
    fn test_only_loaded_top_level_links_are_unloaded() {
        assert!(LinkReference::new(1, "A", "a").needs_unload());
        assert!(!LinkReference::new(2, "B", "b").nested().needs_unload());
        assert!(!LinkReference::new(3, "C", "c").with_loaded(false).needs_unload());
    }
}
