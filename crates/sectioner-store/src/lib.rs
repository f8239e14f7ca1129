// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Sectioner Store
//!
//! Reference host for the section classifier: documents held in memory,
//! linked documents opened from a central store (in memory or JSON files on
//! disk), batches backed by an undo journal, and committed link state kept
//! in a local store independent of central synchronization.

pub mod central;
pub mod data;
pub mod document;
pub mod host;

pub use central::{CentralStore, FsCentral, InMemoryCentral, SharedStore};
pub use data::DocumentData;
pub use document::MemoryDocument;
pub use host::{HostEvent, MemoryHost};
