//! Error types for rule document loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the loader's error type
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while reading rule documents
#[derive(Error, Debug)]
pub enum LoadError {
    /// The rule file could not be read
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text was not well-formed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document section had the wrong shape
    #[error("Section '{section}' must be {expected}")]
    Shape {
        section: String,
        expected: &'static str,
    },

    /// A section parsed but could not become a rule table
    #[error("Table error: {0}")]
    Table(#[from] lookfile_core::Error),
}

impl LoadError {
    pub(crate) fn shape(section: impl Into<String>, expected: &'static str) -> Self {
        Self::Shape {
            section: section.into(),
            expected,
        }
    }
}
