// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory document
//!
//! Batches keep an undo journal of previous attribute values; rollback (and
//! a rejected commit) replays it in reverse. A document backed by a local
//! copy writes its whole state through to that copy on every commit.

use crate::central::SharedStore;
use crate::data::DocumentData;
use rustc_hash::FxHashMap;
use sectioner_geometry::{bounding_volume, GridIndex};
use sectioner_model::{
    Aabb, AttributeSlot, AttributeValue, Document, Element, ElementId, ModelError, Result,
};
use std::cell::OnceCell;

#[derive(Clone, Debug)]
struct OpenBatch {
    label: String,
    journal: Vec<(usize, String, AttributeValue)>,
}

#[derive(Clone, Debug)]
struct LocalCopy {
    store: SharedStore,
    path: String,
}

/// Document held entirely in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    name: String,
    elements: Vec<Element>,
    positions: FxHashMap<ElementId, usize>,
    index: OnceCell<GridIndex>,
    batch: Option<OpenBatch>,
    locked_by: Option<String>,
    local: Option<LocalCopy>,
    commits: usize,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build from serialized data (declared links are ignored)
    pub fn from_data(data: DocumentData) -> Self {
        let mut doc = Self::new(data.name);
        doc.locked_by = data.locked_by;
        for element in data.elements {
            doc.insert(element);
        }
        doc
    }

    /// Serialize elements and lock owner
    pub fn to_data(&self) -> DocumentData {
        DocumentData {
            name: self.name.clone(),
            elements: self.elements.clone(),
            links: Vec::new(),
            locked_by: self.locked_by.clone(),
        }
    }

    /// Add an element (builder form of [`MemoryDocument::insert`])
    pub fn with_element(mut self, element: Element) -> Self {
        self.insert(element);
        self
    }

    /// Add an element, replacing any element with the same id
    pub fn insert(&mut self, element: Element) {
        match self.positions.get(&element.id) {
            Some(&pos) => self.elements[pos] = element,
            None => {
                self.positions.insert(element.id, self.elements.len());
                self.elements.push(element);
            }
        }
        self.index = OnceCell::new();
    }

    /// Lock the document for another owner (`None` unlocks)
    ///
    /// Commits to a locked document are rejected.
    pub fn set_locked_by(&mut self, owner: Option<String>) {
        self.locked_by = owner;
    }

    /// Builder form of [`MemoryDocument::set_locked_by`]
    pub fn with_locked_by(mut self, owner: impl Into<String>) -> Self {
        self.locked_by = Some(owner.into());
        self
    }

    /// Write committed state through to `path` in `store`
    ///
    /// A commit whose state cannot be saved is rejected and undone.
    pub fn backed_by(mut self, store: SharedStore, path: impl Into<String>) -> Self {
        self.local = Some(LocalCopy {
            store,
            path: path.into(),
        });
        self
    }

    /// Reference of the local copy this document writes through to
    pub fn local_path(&self) -> Option<&str> {
        self.local.as_ref().map(|l| l.path.as_str())
    }

    /// Current lock owner
    pub fn locked_by(&self) -> Option<&str> {
        self.locked_by.as_deref()
    }

    /// Number of committed batches
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Elements in insertion order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn spatial_index(&self) -> &GridIndex {
        self.index.get_or_init(|| {
            GridIndex::build(
                self.elements
                    .iter()
                    .filter_map(|e| bounding_volume(e).map(|b| (e.id, b))),
            )
        })
    }

    fn save_local_copy(&self) -> Result<()> {
        let Some(local) = &self.local else {
            return Ok(());
        };
        local
            .store
            .borrow_mut()
            .store(&local.path, &self.to_data())
            .map_err(|e| {
                ModelError::commit_rejected(
                    &self.name,
                    format!("local copy '{}' not saved: {e}", local.path),
                )
            })
    }

    fn undo(&mut self, batch: OpenBatch) {
        for (pos, name, previous) in batch.journal.into_iter().rev() {
            self.elements[pos].replace_value(&name, previous);
        }
    }
}

impl PartialEq for MemoryDocument {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.elements == other.elements
            && self.locked_by == other.locked_by
    }
}

impl Document for MemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|e| e.id).collect()
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.positions.get(&id).map(|&pos| &self.elements[pos])
    }

    fn elements_in_region(&self, region: &Aabb) -> Vec<ElementId> {
        self.spatial_index().query(region)
    }

    fn begin_batch(&mut self, label: &str) -> Result<()> {
        if let Some(open) = &self.batch {
            return Err(ModelError::BatchAlreadyOpen {
                scope: self.name.clone(),
                open: open.label.clone(),
            });
        }
        log::trace!("{}: begin '{}'", self.name, label);
        self.batch = Some(OpenBatch {
            label: label.to_string(),
            journal: Vec::new(),
        });
        Ok(())
    }

    fn set_attribute(&mut self, id: ElementId, name: &str, value: AttributeValue) -> Result<()> {
        let Some(batch) = self.batch.as_mut() else {
            return Err(ModelError::NoOpenBatch(self.name.clone()));
        };
        let Some(&pos) = self.positions.get(&id) else {
            return Err(ModelError::element_not_found(&self.name, id));
        };
        let element = &mut self.elements[pos];
        match element.attribute(name) {
            AttributeSlot::Absent => {
                return Err(ModelError::AttributeNotFound {
                    id,
                    name: name.to_string(),
                })
            }
            AttributeSlot::ReadOnly(_) => {
                return Err(ModelError::ReadOnlyAttribute {
                    id,
                    name: name.to_string(),
                })
            }
            AttributeSlot::Writable(_) => {}
        }
        if let Some(previous) = element.replace_value(name, value) {
            batch.journal.push((pos, name.to_string(), previous));
        }
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<()> {
        let Some(batch) = self.batch.take() else {
            return Err(ModelError::NoOpenBatch(self.name.clone()));
        };
        if let Some(owner) = self.locked_by.clone() {
            self.undo(batch);
            return Err(ModelError::commit_rejected(
                &self.name,
                format!("document is locked by {owner}"),
            ));
        }
        if let Err(err) = self.save_local_copy() {
            self.undo(batch);
            return Err(err);
        }
        log::trace!(
            "{}: commit '{}' ({} write(s))",
            self.name,
            batch.label,
            batch.journal.len()
        );
        self.commits += 1;
        Ok(())
    }

    fn rollback_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            log::trace!("{}: rollback '{}'", self.name, batch.label);
            self.undo(batch);
        }
    }

    fn has_open_batch(&self) -> bool {
        self.batch.is_some()
    }
}
