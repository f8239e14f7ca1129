// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON document format
//!
//! ```json
//! {
//!   "name": "Корпус 1",
//!   "elements": [
//!     { "id": 1, "category": "Mass", "bounding_box": { "min": [0, 0, 0], "max": [10, 10, 10] },
//!       "attributes": [{ "name": "Группа модели", "value": "Секция 01" }] }
//!   ],
//!   "links": [{ "id": 1, "name": "Корпус 1_АР", "path": "links/ar.json" }]
//! }
//! ```

use sectioner_model::{Document, Element, LinkReference, ModelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized form of one document
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentData {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Links declared by this document (primary documents only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkReference>,
    /// Owner holding the central copy; commits to a locked document fail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
}

impl DocumentData {
    /// Snapshot the elements of any document
    pub fn capture(doc: &dyn Document) -> Self {
        Self {
            name: doc.name().to_string(),
            elements: doc
                .element_ids()
                .into_iter()
                .filter_map(|id| doc.element(id).cloned())
                .collect(),
            links: Vec::new(),
            locked_by: None,
        }
    }

    /// Parse from JSON text
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    /// Read a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
