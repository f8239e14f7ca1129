// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for host document operations

use crate::{ElementId, LinkId};
use thiserror::Error;

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while reading or mutating a host document
#[derive(Error, Debug)]
pub enum ModelError {
    /// Element not present in the document
    #[error("Element {id} not found in {scope}")]
    ElementNotFound { scope: String, id: ElementId },

    /// Attribute missing on the element
    #[error("Attribute '{name}' not found on element {id}")]
    AttributeNotFound { id: ElementId, name: String },

    /// Attribute exists but cannot be written
    #[error("Attribute '{name}' on element {id} is read-only")]
    ReadOnlyAttribute { id: ElementId, name: String },

    /// Write attempted outside a batch
    #[error("No open batch in {0}")]
    NoOpenBatch(String),

    /// A batch is already open on the document
    #[error("Batch '{open}' already open in {scope}")]
    BatchAlreadyOpen { scope: String, open: String },

    /// The host refused to commit the batch
    #[error("Commit rejected in {scope}: {reason}")]
    CommitRejected { scope: String, reason: String },

    /// Link does not exist in the primary document
    #[error("Link {0} not found")]
    LinkNotFound(LinkId),

    /// Linked document could not be opened
    #[error("Failed to open link '{link}': {reason}")]
    OpenFailed { link: String, reason: String },

    /// Synchronize with the central copy failed
    #[error("Synchronize failed for {scope}: {reason}")]
    SyncFailed { scope: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Create an element-not-found error
    pub fn element_not_found(scope: impl Into<String>, id: ElementId) -> Self {
        ModelError::ElementNotFound {
            scope: scope.into(),
            id,
        }
    }

    /// Create a commit-rejected error
    pub fn commit_rejected(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::CommitRejected {
            scope: scope.into(),
            reason: reason.into(),
        }
    }

    /// Create an open-failed error
    pub fn open_failed(link: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::OpenFailed {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Create a synchronize error
    pub fn sync_failed(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::SyncFailed {
            scope: scope.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ModelError::Other(msg.into())
    }
}
