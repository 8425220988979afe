//! # tabula-core
//!
//! Core data structures for the tabula spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout tabula:
//! - [`Position`] - A grid coordinate with A1-style parsing and formatting
//! - [`Size`] - The printable bounding box of a sheet
//! - [`CellValue`] and [`CellError`] - Observable cell values
//! - [`Error`] and [`Result`] - Error types shared across the engine
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::Position;
//!
//! let pos = Position::parse("B2").unwrap();
//! assert_eq!(pos, Position::new(1, 1));
//! assert_eq!(pos.to_string(), "B2");
//! ```

pub mod error;
pub mod position;
pub mod value;

// Re-exports for convenience
pub use error::{Error, Result};
pub use position::{column_to_letters, letters_to_column, Position, Size};
pub use value::{CellError, CellValue};

/// Maximum number of rows in a sheet
pub const MAX_ROWS: u32 = 16_384;

/// Maximum number of columns in a sheet
pub const MAX_COLS: u32 = 16_384;
