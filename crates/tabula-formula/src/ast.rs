//! Formula Abstract Syntax Tree types

use std::fmt;
use tabula_core::Position;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),
    /// Single cell reference
    CellRef(Position),
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl UnaryOperator {
    fn symbol(&self) -> char {
        match self {
            UnaryOperator::Plus => '+',
            UnaryOperator::Negate => '-',
        }
    }
}

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

impl FormulaExpr {
    /// Positions referenced by this expression, in first-appearance order,
    /// deduplicated
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, refs: &mut Vec<Position>) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::CellRef(pos) => {
                if !refs.contains(pos) {
                    refs.push(*pos);
                }
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_refs(refs),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_refs(refs);
                right.collect_refs(refs);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::Number(_) | FormulaExpr::CellRef(_) => ATOM_PRECEDENCE,
            FormulaExpr::UnaryOp { .. } => UNARY_PRECEDENCE,
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
        }
    }

    fn write_child(child: &FormulaExpr, parens: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if parens {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

/// Canonical reprint: whitespace-free, with only the parentheses that
/// precedence and left-associativity require. Reparsing the output yields a
/// structurally identical AST.
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{}", n),
            FormulaExpr::CellRef(pos) => write!(f, "{}", pos),
            FormulaExpr::UnaryOp { op, operand } => {
                write!(f, "{}", op.symbol())?;
                Self::write_child(operand, operand.precedence() < UNARY_PRECEDENCE, f)
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                Self::write_child(left, left.precedence() < prec, f)?;
                write!(f, "{}", op.symbol())?;
                // The right operand of - and / keeps its parens at equal
                // precedence: 1-(2-3) is not 1-2-3.
                let right_parens = right.precedence() < prec
                    || (right.precedence() == prec
                        && matches!(
                            op,
                            BinaryOperator::Subtract | BinaryOperator::Divide
                        ));
                Self::write_child(right, right_parens, f)
            }
        }
    }
}
