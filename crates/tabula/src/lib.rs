//! # tabula
//!
//! A sparse spreadsheet engine.
//!
//! Cells hold literal text, numbers, or formulas that reference other cells
//! by position (`=A1+B2/2`). The sheet tracks dependencies between cells,
//! rejects edits that would create a cycle, and memoizes every value so
//! reads are cheap: a write invalidates exactly the cells whose value could
//! have changed.
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut sheet = Sheet::new();
//!
//! let a1 = Position::parse("A1").unwrap();
//! let a2 = Position::parse("A2").unwrap();
//!
//! sheet.set_cell(a1, "2").unwrap();
//! sheet.set_cell(a2, "=A1+3").unwrap();
//! assert_eq!(sheet.value(a2).unwrap(), CellValue::Number(5.0));
//!
//! // Editing A1 invalidates A2; the next read recomputes it.
//! sheet.set_cell(a1, "10").unwrap();
//! assert_eq!(sheet.value(a2).unwrap(), CellValue::Number(13.0));
//! ```

pub mod cell;
pub mod prelude;
pub mod sheet;

pub use cell::Cell;
pub use sheet::Sheet;

// Re-export core types
pub use tabula_core::{
    column_to_letters, letters_to_column, CellError, CellValue, Error, Position, Result, Size,
    MAX_COLS, MAX_ROWS,
};

// Re-export the formula surface
pub use tabula_formula::{
    evaluate, parse_formula, BinaryOperator, CellProvider, FormulaExpr, UnaryOperator,
};
