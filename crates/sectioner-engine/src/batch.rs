// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scoped batch handle

use sectioner_model::{AttributeValue, Document, ElementId, Result};

/// An open batch on one document
///
/// [`BatchGuard::commit`] makes the writes durable. Dropping the guard
/// without committing rolls them back, including on early return.
pub struct BatchGuard<'a> {
    doc: &'a mut dyn Document,
    open: bool,
}

impl<'a> BatchGuard<'a> {
    /// Open a batch on `doc`
    pub fn begin(doc: &'a mut dyn Document, label: &str) -> Result<Self> {
        doc.begin_batch(label)?;
        Ok(Self { doc, open: true })
    }

    /// Write one attribute inside the batch
    pub fn set(&mut self, id: ElementId, name: &str, value: AttributeValue) -> Result<()> {
        self.doc.set_attribute(id, name, value)
    }

    /// Commit every write
    ///
    /// On error the host has discarded the batch; nothing is durable.
    pub fn commit(mut self) -> Result<()> {
        self.open = false;
        self.doc.commit_batch()
    }

    /// Discard every write
    pub fn rollback(mut self) {
        self.open = false;
        self.doc.rollback_batch();
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.open {
            log::debug!("{}: rolling back uncommitted batch", self.doc.name());
            self.doc.rollback_batch();
        }
    }
}
