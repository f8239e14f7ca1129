// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document storage
//!
//! Linked documents are opened from, and synchronized back to, a central
//! store addressed by the link's file reference. The same trait backs the
//! host's local copies, which committed batches are written through to.

use crate::data::DocumentData;
use rustc_hash::{FxHashMap, FxHashSet};
use sectioner_model::{ModelError, Result};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Store shared between a host and the documents it opened
pub type SharedStore = Rc<RefCell<dyn CentralStore>>;

/// Storage of document copies addressed by file reference
pub trait CentralStore: fmt::Debug {
    /// Check if a document exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Read the copy at `path`
    fn load(&self, path: &str) -> Result<DocumentData>;

    /// Replace the copy at `path`
    fn store(&mut self, path: &str, data: &DocumentData) -> Result<()>;
}

/// Central store kept in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryCentral {
    documents: FxHashMap<String, DocumentData>,
    read_only: FxHashSet<String>,
}

impl InMemoryCentral {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document at `path`
    pub fn with_document(mut self, path: impl Into<String>, data: DocumentData) -> Self {
        self.documents.insert(path.into(), data);
        self
    }

    /// Make stores to `path` fail
    pub fn set_read_only(&mut self, path: impl Into<String>) {
        self.read_only.insert(path.into());
    }

    /// Current copy at `path`
    pub fn document(&self, path: &str) -> Option<&DocumentData> {
        self.documents.get(path)
    }
}

impl CentralStore for InMemoryCentral {
    fn exists(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    fn load(&self, path: &str) -> Result<DocumentData> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| ModelError::other(format!("no document at '{path}'")))
    }

    fn store(&mut self, path: &str, data: &DocumentData) -> Result<()> {
        if self.read_only.contains(path) {
            return Err(ModelError::other(format!("copy '{path}' is read-only")));
        }
        self.documents.insert(path.to_string(), data.clone());
        Ok(())
    }
}

/// Central store of JSON files under a base directory
///
/// Relative references resolve against the base; absolute ones are used as is.
#[derive(Clone, Debug)]
pub struct FsCentral {
    base: PathBuf,
}

impl FsCentral {
    /// Create a store rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Base directory
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File path for a reference
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base.join(path)
    }
}

impl CentralStore for FsCentral {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn load(&self, path: &str) -> Result<DocumentData> {
        DocumentData::load(&self.resolve(path))
    }

    fn store(&mut self, path: &str, data: &DocumentData) -> Result<()> {
        let file = self.resolve(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        data.save(&file)
    }
}
