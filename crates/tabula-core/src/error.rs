//! Error types for tabula-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can escape a sheet edit
///
/// All three kinds leave the sheet observably unchanged when they escape
/// `set_cell` or `clear_cell`. Arithmetic failures are not errors in this
/// sense: they are values, carried as [`crate::CellError`] inside
/// [`crate::CellValue`].
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range cell position
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// The formula parser rejected an expression
    #[error("Formula parse error: {0}")]
    FormulaParse(String),

    /// Committing the edit would create a cycle in the cell graph
    #[error("Circular reference detected involving cell {0}")]
    CircularReference(String),
}
