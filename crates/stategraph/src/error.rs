//! Error types for Stategraph operations.
//!
//! This module provides the main error type [`StategraphError`]. Building,
//! laying out and highlighting a graph never fail; errors only come from the
//! edges of the pipeline: reading input, parsing it, loading configuration
//! and exporting a drawing.

use std::io;

use thiserror::Error;

/// The main error type for Stategraph operations.
///
/// # Diagnostic Variants
///
/// The `Input` variant keeps the JSON source next to the parser error, so a
/// caller can point at the offending line and column.
#[derive(Debug, Error)]
pub enum StategraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid graph input: {err}")]
    Input { err: serde_json::Error, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for StategraphError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl StategraphError {
    /// Create a new `Input` error with the associated source text.
    pub fn new_input_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Input {
            err,
            src: src.into(),
        }
    }
}
