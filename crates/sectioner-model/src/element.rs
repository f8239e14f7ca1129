// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model element representation

use crate::{
    Aabb, Attribute, AttributeSlot, AttributeValue, Category, ElementId, GeometryNode,
    LocationKind,
};
use serde::{Deserialize, Serialize};

/// A building-model element
///
/// Owned by exactly one document. Attribute order is preserved so lookups and
/// serialization are deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element ID (stable within its document)
    pub id: ElementId,
    /// Category, if the host assigns one
    #[serde(default)]
    pub category: Option<Category>,
    /// Whether this element is a type definition rather than an instance
    #[serde(default)]
    pub is_type: bool,
    /// Type definition this instance was placed from
    #[serde(default)]
    pub type_id: Option<ElementId>,
    /// Whether the element is structurally valid (not deleted or stale)
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// Location kind
    #[serde(default)]
    pub location: LocationKind,
    /// Precomputed axis-aligned extent
    #[serde(default)]
    pub bounding_box: Option<Aabb>,
    /// Geometry tree
    #[serde(default)]
    pub geometry: Vec<GeometryNode>,
    /// Named attributes
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

fn default_valid() -> bool {
    true
}

impl Element {
    /// Create a valid instance element with no geometry or attributes
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            category: None,
            is_type: false,
            type_id: None,
            valid: true,
            location: LocationKind::None,
            bounding_box: None,
            geometry: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Set category
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Mark as a type definition
    pub fn as_type(mut self) -> Self {
        self.is_type = true;
        self
    }

    /// Set type definition reference
    pub fn with_type(mut self, type_id: impl Into<ElementId>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    /// Set location kind
    pub fn with_location(mut self, location: LocationKind) -> Self {
        self.location = location;
        self
    }

    /// Set bounding volume
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounding_box = Some(bounds);
        self
    }

    /// Add a geometry node
    pub fn with_geometry(mut self, node: GeometryNode) -> Self {
        self.geometry.push(node);
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Mark as stale
    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> AttributeSlot<'_> {
        match self.attributes.iter().find(|a| a.name == name) {
            None => AttributeSlot::Absent,
            Some(a) if a.read_only => AttributeSlot::ReadOnly(a),
            Some(a) => AttributeSlot::Writable(a),
        }
    }

    /// Get an attribute's string value
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .attribute()
            .and_then(|a| a.value.as_string())
    }

    /// Mutable access to an attribute by name
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Replace an attribute value, returning the previous one
    ///
    /// Returns `None` when the attribute does not exist. Read-only checks are
    /// the caller's responsibility.
    pub fn replace_value(&mut self, name: &str, value: AttributeValue) -> Option<AttributeValue> {
        self.attribute_mut(name)
            .map(|a| std::mem::replace(&mut a.value, value))
    }
}
