//! Formula evaluator
//!
//! Evaluates formula ASTs to numbers against a sheet view.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use tabula_core::{CellError, CellValue, Position};

/// Read access to cell values during evaluation
///
/// `None` means the cell is absent *or empty*; both dereference to `0`.
pub trait CellProvider {
    fn cell_value(&self, pos: Position) -> Option<CellValue>;
}

/// Evaluate a formula against a sheet view
///
/// Referenced cells dereference as:
/// - absent or empty cell → `0`
/// - numeric value → that number
/// - text → the number it parses to in full, else [`CellError::Value`]
/// - an error value propagates unchanged
///
/// Division by zero and non-finite intermediate results produce
/// [`CellError::Arithmetic`].
pub fn evaluate<P: CellProvider>(expr: &FormulaExpr, cells: &P) -> Result<f64, CellError> {
    match expr {
        FormulaExpr::Number(n) => Ok(*n),
        FormulaExpr::CellRef(pos) => dereference(cells.cell_value(*pos)),
        FormulaExpr::UnaryOp { op, operand } => {
            let value = evaluate(operand, cells)?;
            Ok(match op {
                UnaryOperator::Plus => value,
                UnaryOperator::Negate => -value,
            })
        }
        FormulaExpr::BinaryOp { op, left, right } => {
            let lhs = evaluate(left, cells)?;
            let rhs = evaluate(right, cells)?;

            let result = match op {
                BinaryOperator::Add => lhs + rhs,
                BinaryOperator::Subtract => lhs - rhs,
                BinaryOperator::Multiply => lhs * rhs,
                BinaryOperator::Divide => {
                    if rhs == 0.0 {
                        return Err(CellError::Arithmetic);
                    }
                    lhs / rhs
                }
            };

            if result.is_finite() {
                Ok(result)
            } else {
                Err(CellError::Arithmetic)
            }
        }
    }
}

fn dereference(value: Option<CellValue>) -> Result<f64, CellError> {
    match value {
        None => Ok(0.0),
        Some(CellValue::Number(n)) => Ok(n),
        Some(CellValue::Text(s)) => s.parse::<f64>().map_err(|_| CellError::Value),
        Some(CellValue::Error(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    impl CellProvider for HashMap<Position, CellValue> {
        fn cell_value(&self, pos: Position) -> Option<CellValue> {
            self.get(&pos).cloned()
        }
    }

    fn eval(src: &str, cells: &HashMap<Position, CellValue>) -> Result<f64, CellError> {
        evaluate(&parse_formula(src).unwrap(), cells)
    }

    #[test]
    fn test_evaluate_arithmetic() {
        let cells = HashMap::new();
        assert_eq!(eval("1+2*3", &cells), Ok(7.0));
        assert_eq!(eval("(1+2)*3", &cells), Ok(9.0));
        assert_eq!(eval("7/2", &cells), Ok(3.5));
        assert_eq!(eval("-3+1", &cells), Ok(-2.0));
        assert_eq!(eval("+3", &cells), Ok(3.0));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        let cells = HashMap::new();
        assert_eq!(eval("1/0", &cells), Err(CellError::Arithmetic));
        assert_eq!(eval("1/(2-2)", &cells), Err(CellError::Arithmetic));
    }

    #[test]
    fn test_evaluate_overflow() {
        let cells = HashMap::new();
        assert_eq!(eval("1e308*10", &cells), Err(CellError::Arithmetic));
    }

    #[test]
    fn test_evaluate_references() {
        let mut cells = HashMap::new();
        cells.insert(Position::new(0, 0), CellValue::Number(2.0));
        cells.insert(Position::new(1, 0), CellValue::text("40"));

        // A1 numeric, A2 numeric text, B1 absent (reads as 0)
        assert_eq!(eval("A1+A2+B1", &cells), Ok(42.0));
    }

    #[test]
    fn test_evaluate_non_numeric_text() {
        let mut cells = HashMap::new();
        cells.insert(Position::new(0, 0), CellValue::text("hello"));
        assert_eq!(eval("A1+1", &cells), Err(CellError::Value));

        // Partial numeric prefixes do not count
        cells.insert(Position::new(0, 0), CellValue::text("2abc"));
        assert_eq!(eval("A1+1", &cells), Err(CellError::Value));
    }

    #[test]
    fn test_evaluate_error_propagation() {
        let mut cells = HashMap::new();
        cells.insert(Position::new(0, 0), CellValue::Error(CellError::Arithmetic));
        assert_eq!(eval("A1*2", &cells), Err(CellError::Arithmetic));
    }
}
