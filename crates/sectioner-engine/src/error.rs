// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for classification runs

use sectioner_model::ModelError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the classification engine
///
/// Data omissions (missing labels, attributes or geometry) are never errors;
/// they are silently excluded.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A linked scope could not be opened
    #[error("Failed to open scope '{scope}': {source}")]
    ScopeOpen {
        scope: String,
        #[source]
        source: ModelError,
    },

    /// A batch could not be started
    #[error("Failed to begin batch in '{scope}': {source}")]
    Begin {
        scope: String,
        #[source]
        source: ModelError,
    },

    /// A batch could not be committed; none of its writes are durable
    #[error("Commit failed in '{scope}': {source}")]
    Commit {
        scope: String,
        #[source]
        source: ModelError,
    },

    /// A write failed for a reason other than a missing or locked attribute
    #[error("Write failed in '{scope}': {source}")]
    Write {
        scope: String,
        #[source]
        source: ModelError,
    },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while loading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }
}
