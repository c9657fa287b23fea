//! Error types for Lookfile core

use thiserror::Error;

/// Result type alias using Lookfile's core Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building rule tables
///
/// Matching, resolution and application never fail; these only surface
/// while turning raw JSON into typed tables.
#[derive(Error, Debug)]
pub enum Error {
    /// A selector string was empty
    #[error("Empty selector")]
    EmptySelector,

    /// A JSON value could not be represented as a scalar attribute value
    #[error("Unsupported value for attribute '{attribute}': {found}")]
    UnsupportedValue { attribute: String, found: String },

    /// A JSON section did not have the expected shape
    #[error("Invalid rule table: {0}")]
    InvalidTable(String),
}
