//! # tabula-formula
//!
//! Formula parser and evaluator for tabula.
//!
//! This crate provides:
//! - Formula parsing (text → AST) with a canonical reprint
//! - Formula evaluation (AST → number) against a sheet view
//! - Referenced-cell extraction for dependency tracking
//!
//! ## Example
//!
//! ```rust
//! use tabula_formula::parse_formula;
//!
//! let ast = parse_formula("1+2*3").unwrap();
//! assert_eq!(ast.to_string(), "1+2*3");
//!
//! let ast = parse_formula("(A1 + B2) / 2").unwrap();
//! assert_eq!(ast.to_string(), "(A1+B2)/2");
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use eval::{evaluate, CellProvider};
pub use parser::parse_formula;
