// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host traits
//!
//! These traits are the whole contract between the classification engine and
//! the host document repository. Every call is blocking.

use crate::{
    Aabb, AttributeValue, Category, Element, ElementId, LinkId, LinkReference, OpenOptions,
    Result,
};

/// One document scope: the primary model or an opened linked model
///
/// Attribute writes are only accepted between [`Document::begin_batch`] and
/// [`Document::commit_batch`] / [`Document::rollback_batch`]. A committed batch
/// is durable as one unit; a rolled back batch leaves no trace.
pub trait Document {
    /// Scope name used in logs and reports
    fn name(&self) -> &str;

    /// All element ids (instances and type definitions) in a stable order
    fn element_ids(&self) -> Vec<ElementId>;

    /// Look up an element
    fn element(&self, id: ElementId) -> Option<&Element>;

    /// Ids of instance elements (type definitions excluded)
    fn instance_ids(&self) -> Vec<ElementId> {
        self.element_ids()
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(|e| !e.is_type))
            .collect()
    }

    /// Ids of elements whose category matches
    fn elements_of_category(&self, category: &Category) -> Vec<ElementId> {
        self.element_ids()
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .is_some_and(|e| e.category.as_ref() == Some(category))
            })
            .collect()
    }

    /// Ids of elements whose bounding volume intersects `region`
    ///
    /// Hosts with a spatial index should override this; the default scans
    /// every element. Each id appears at most once.
    fn elements_in_region(&self, region: &Aabb) -> Vec<ElementId> {
        self.element_ids()
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .and_then(|e| e.bounding_box.as_ref())
                    .is_some_and(|b| b.intersects(region))
            })
            .collect()
    }

    /// Open a batch of attribute writes
    fn begin_batch(&mut self, label: &str) -> Result<()>;

    /// Write an attribute inside the open batch
    fn set_attribute(&mut self, id: ElementId, name: &str, value: AttributeValue) -> Result<()>;

    /// Make every write in the open batch durable
    ///
    /// On error the batch is discarded and none of its writes remain.
    fn commit_batch(&mut self) -> Result<()>;

    /// Discard every write in the open batch (no-op without an open batch)
    fn rollback_batch(&mut self);

    /// Check if a batch is open
    fn has_open_batch(&self) -> bool;
}

/// Host owning the primary document and its federation of links
pub trait ModelHost {
    /// The primary document (never closed)
    fn primary(&self) -> &dyn Document;

    /// Mutable access to the primary document
    fn primary_mut(&mut self) -> &mut dyn Document;

    /// Link references declared in the primary document, in enumeration order
    fn links(&self) -> Vec<LinkReference>;

    /// Unload a link from the primary document
    fn unload_link(&mut self, id: LinkId) -> Result<()>;

    /// Reload a previously unloaded link
    fn reload_link(&mut self, id: LinkId) -> Result<()>;

    /// Open a linked document as an independent scope
    fn open_link(
        &mut self,
        link: &LinkReference,
        options: &OpenOptions,
    ) -> Result<Box<dyn Document>>;

    /// Close an opened linked document
    fn close_document(&mut self, doc: Box<dyn Document>, save_local_copy: bool) -> Result<()>;

    /// Push committed changes of an opened document to its shared central copy
    fn synchronize(&mut self, doc: &mut dyn Document) -> Result<()>;
}
