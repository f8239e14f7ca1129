// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sectioner Model - Shared types and host traits for section classification
//!
//! This crate provides the vocabulary used by every other sectioner crate:
//! element identifiers, categories, attributes, bounding volumes, solid bodies,
//! and the traits a host document repository implements so the classification
//! engine can read elements and write attributes without knowing the backend.
//!
//! # Architecture
//!
//! - [`Document`] - One scope of elements (the primary model or an opened link)
//!   with a batch (transaction) boundary for attribute writes
//! - [`ModelHost`] - The primary document plus its federation of linked documents
//! - [`Element`] - A model element with category, location, geometry and attributes
//! - [`Aabb`], [`Solid`] - Bounding volumes and boundary-represented solid bodies
//!
//! # Example
//!
//! ```ignore
//! use sectioner_model::{Document, AttributeSlot};
//!
//! for id in doc.instance_ids() {
//!     if let Some(element) = doc.element(id) {
//!         if let AttributeSlot::Writable(attr) = element.attribute("BS_Блок") {
//!             println!("{} -> {:?}", id, attr.value);
//!         }
//!     }
//! }
//! ```

pub mod element;
pub mod error;
pub mod geometry;
pub mod link;
pub mod traits;
pub mod types;

// Re-export all public types
pub use element::*;
pub use error::*;
pub use geometry::*;
pub use link::*;
pub use traits::*;
pub use types::*;
