// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for building-model elements
//!
//! This module defines identifiers, categories, location kinds and attribute
//! values shared by the host backends and the classification engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe element identifier
///
/// Stable within one document; elements in different documents may share ids.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for u64 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

/// Element category
///
/// Covers the categories the classifier treats specially plus the common
/// model categories. Anything else is captured verbatim with its original name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    // ========================================================================
    // Infrastructure (never classified)
    // ========================================================================
    /// Conceptual mass - the category section forms are modelled in
    Mass,
    ProjectBasePoint,
    SurveyPoint,
    ProjectLocation,
    View,
    Room,
    Levels,
    Grids,

    // ========================================================================
    // Architectural
    // ========================================================================
    Walls,
    Floors,
    Roofs,
    Ceilings,
    Doors,
    Windows,
    Stairs,
    Railings,
    Ramps,
    Columns,
    CurtainPanels,
    CurtainWallMullions,
    GenericModel,
    Furniture,
    Casework,

    // ========================================================================
    // Structural
    // ========================================================================
    StructuralColumns,
    StructuralFraming,
    StructuralFoundation,

    // ========================================================================
    // MEP
    // ========================================================================
    Ducts,
    DuctFittings,
    Pipes,
    PipeFittings,
    CableTrays,
    Conduits,
    MechanicalEquipment,
    PlumbingFixtures,
    ElectricalEquipment,
    LightingFixtures,

    /// Unknown category (stores the original name)
    Other(String),
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Category {
    /// Every category except [`Category::Other`]
    pub const BUILT_IN: [Category; 36] = [
        Category::Mass,
        Category::ProjectBasePoint,
        Category::SurveyPoint,
        Category::ProjectLocation,
        Category::View,
        Category::Room,
        Category::Levels,
        Category::Grids,
        Category::Walls,
        Category::Floors,
        Category::Roofs,
        Category::Ceilings,
        Category::Doors,
        Category::Windows,
        Category::Stairs,
        Category::Railings,
        Category::Ramps,
        Category::Columns,
        Category::CurtainPanels,
        Category::CurtainWallMullions,
        Category::GenericModel,
        Category::Furniture,
        Category::Casework,
        Category::StructuralColumns,
        Category::StructuralFraming,
        Category::StructuralFoundation,
        Category::Ducts,
        Category::DuctFittings,
        Category::Pipes,
        Category::PipeFittings,
        Category::CableTrays,
        Category::Conduits,
        Category::MechanicalEquipment,
        Category::PlumbingFixtures,
        Category::ElectricalEquipment,
        Category::LightingFixtures,
    ];

    /// Parse a category name
    ///
    /// Accepts the canonical name (exact match) or the host's built-in name
    /// with its `OST_` prefix. Anything else is kept verbatim as
    /// [`Category::Other`], so `parse(c.name())` gives back `c` for every
    /// parsed category.
    pub fn parse(s: &str) -> Self {
        if let Some(category) = Self::BUILT_IN.iter().find(|c| c.name() == s) {
            return category.clone();
        }
        s.strip_prefix("OST_")
            .and_then(Self::from_built_in_name)
            .unwrap_or_else(|| Category::Other(s.to_string()))
    }

    /// Category for a host built-in name (without the `OST_` prefix)
    fn from_built_in_name(name: &str) -> Option<Self> {
        let category = match name {
            "Mass" => Category::Mass,
            "ProjectBasePoint" => Category::ProjectBasePoint,
            "SharedBasePoint" => Category::SurveyPoint,
            "Views" => Category::View,
            "Rooms" => Category::Room,
            "Levels" => Category::Levels,
            "Grids" => Category::Grids,
            "Walls" => Category::Walls,
            "Floors" => Category::Floors,
            "Roofs" => Category::Roofs,
            "Ceilings" => Category::Ceilings,
            "Doors" => Category::Doors,
            "Windows" => Category::Windows,
            "Stairs" => Category::Stairs,
            "StairsRailing" => Category::Railings,
            "Ramps" => Category::Ramps,
            "Columns" => Category::Columns,
            "CurtainWallPanels" => Category::CurtainPanels,
            "CurtainWallMullions" => Category::CurtainWallMullions,
            "GenericModel" => Category::GenericModel,
            "Furniture" => Category::Furniture,
            "Casework" => Category::Casework,
            "StructuralColumns" => Category::StructuralColumns,
            "StructuralFraming" => Category::StructuralFraming,
            "StructuralFoundation" => Category::StructuralFoundation,
            "DuctCurves" => Category::Ducts,
            "DuctFitting" => Category::DuctFittings,
            "PipeCurves" => Category::Pipes,
            "PipeFitting" => Category::PipeFittings,
            "CableTray" => Category::CableTrays,
            "Conduit" => Category::Conduits,
            "MechanicalEquipment" => Category::MechanicalEquipment,
            "PlumbingFixtures" => Category::PlumbingFixtures,
            "ElectricalEquipment" => Category::ElectricalEquipment,
            "LightingFixtures" => Category::LightingFixtures,
            _ => return None,
        };
        Some(category)
    }

    /// Get the canonical category name
    pub fn name(&self) -> &str {
        match self {
            Category::Mass => "Mass",
            Category::ProjectBasePoint => "ProjectBasePoint",
            Category::SurveyPoint => "SurveyPoint",
            Category::ProjectLocation => "ProjectLocation",
            Category::View => "View",
            Category::Room => "Room",
            Category::Levels => "Levels",
            Category::Grids => "Grids",
            Category::Walls => "Walls",
            Category::Floors => "Floors",
            Category::Roofs => "Roofs",
            Category::Ceilings => "Ceilings",
            Category::Doors => "Doors",
            Category::Windows => "Windows",
            Category::Stairs => "Stairs",
            Category::Railings => "Railings",
            Category::Ramps => "Ramps",
            Category::Columns => "Columns",
            Category::CurtainPanels => "CurtainPanels",
            Category::CurtainWallMullions => "CurtainWallMullions",
            Category::GenericModel => "GenericModel",
            Category::Furniture => "Furniture",
            Category::Casework => "Casework",
            Category::StructuralColumns => "StructuralColumns",
            Category::StructuralFraming => "StructuralFraming",
            Category::StructuralFoundation => "StructuralFoundation",
            Category::Ducts => "Ducts",
            Category::DuctFittings => "DuctFittings",
            Category::Pipes => "Pipes",
            Category::PipeFittings => "PipeFittings",
            Category::CableTrays => "CableTrays",
            Category::Conduits => "Conduits",
            Category::MechanicalEquipment => "MechanicalEquipment",
            Category::PlumbingFixtures => "PlumbingFixtures",
            Category::ElectricalEquipment => "ElectricalEquipment",
            Category::LightingFixtures => "LightingFixtures",
            Category::Other(s) => s,
        }
    }

    /// Check if this category is part of the fixed infrastructure deny-list
    ///
    /// Section forms themselves, base points, views, rooms and project-location
    /// pseudo-elements never receive a section identifier.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Category::Mass
                | Category::ProjectBasePoint
                | Category::SurveyPoint
                | Category::ProjectLocation
                | Category::View
                | Category::Room
        )
    }

    /// Check if this is a schedulable model category
    ///
    /// Used as the default allow-list for elements that carry no recognized
    /// location (hosted or sketch-based elements such as floors and roofs).
    pub fn is_model_category(&self) -> bool {
        !self.is_infrastructure()
            && !matches!(self, Category::Levels | Category::Grids | Category::Other(_))
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other(String::new())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.name().to_string()
    }
}

/// How an element is placed in the model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// No location (sketch-based, hosted, or non-geometric)
    #[default]
    None,
    /// Placed at a point (families, equipment)
    Point,
    /// Driven by a curve (walls, beams, pipes)
    Curve,
    /// Defined by a boundary area
    Area,
}

impl LocationKind {
    /// Check if the element is placed by a point or a curve
    ///
    /// Area-defined and location-less elements are only eligible through
    /// the category allow-list.
    pub fn is_recognized(&self) -> bool {
        matches!(self, LocationKind::Point | LocationKind::Curve)
    }
}

/// Attribute value
///
/// Represents any value a named element attribute can hold.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value assigned
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl AttributeValue {
    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

/// A named element attribute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name (e.g., "BS_Блок")
    pub name: String,
    /// Current value
    #[serde(default)]
    pub value: AttributeValue,
    /// Whether the host forbids writing this attribute
    #[serde(default)]
    pub read_only: bool,
}

impl Attribute {
    /// Create a new writable attribute
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            read_only: false,
        }
    }

    /// Create an empty writable attribute
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Null,
            read_only: false,
        }
    }

    /// Mark the attribute read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Result of looking up an attribute by name
///
/// Distinguishes a missing attribute from one that exists but is locked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeSlot<'a> {
    /// No attribute with that name
    Absent,
    /// Attribute exists but is read-only
    ReadOnly(&'a Attribute),
    /// Attribute exists and can be written
    Writable(&'a Attribute),
}

impl<'a> AttributeSlot<'a> {
    /// Get the attribute if present (regardless of writability)
    pub fn attribute(&self) -> Option<&'a Attribute> {
        match self {
            AttributeSlot::Absent => None,
            AttributeSlot::ReadOnly(a) | AttributeSlot::Writable(a) => Some(a),
        }
    }

    /// Check if the attribute can be written
    pub fn is_writable(&self) -> bool {
        matches!(self, AttributeSlot::Writable(_))
    }
}
