// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry processing

use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry processing errors
#[derive(Error, Debug)]
pub enum Error {
    /// Solid boundary cannot enclose a volume
    #[error("Degenerate solid: {0}")]
    Degenerate(String),

    /// Face polygon cannot define a plane
    #[error("Invalid face at index {index}: {message}")]
    InvalidFace { index: usize, message: String },

    /// Non-finite coordinate encountered
    #[error("Non-finite coordinate in {0}")]
    NonFinite(String),
}

impl Error {
    /// Create a degenerate-solid error
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Error::Degenerate(msg.into())
    }

    /// Create an invalid face error
    pub fn invalid_face(index: usize, msg: impl Into<String>) -> Self {
        Error::InvalidFace {
            index,
            message: msg.into(),
        }
    }
}
