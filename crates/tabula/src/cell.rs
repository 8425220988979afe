//! Cell bodies and the cell graph node

use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;

use ahash::RandomState;
use tabula_core::{CellValue, Error, Position, Result};
use tabula_formula::{evaluate, parse_formula, FormulaExpr};

use crate::sheet::Sheet;

/// The content of a cell: empty, literal text, or a compiled formula
#[derive(Debug)]
pub(crate) enum CellBody {
    Empty,
    Text { text: String, escaped: bool },
    Formula { ast: FormulaExpr },
}

impl CellBody {
    /// Classify and compile the wire form of a cell edit
    ///
    /// - empty string → `Empty`
    /// - `=` followed by anything → formula (the remainder is parsed)
    /// - leading `'` → escaped literal text
    /// - anything else (including a lone `=`) → literal text
    pub(crate) fn compile(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(CellBody::Empty);
        }

        if let Some(expression) = text.strip_prefix('=') {
            if !expression.is_empty() {
                let ast = parse_formula(expression).map_err(|e| {
                    let tabula_formula::FormulaError::Parse(msg) = e;
                    Error::FormulaParse(msg)
                })?;
                return Ok(CellBody::Formula { ast });
            }
        }

        if let Some(rest) = text.strip_prefix('\'') {
            return Ok(CellBody::Text {
                text: rest.to_string(),
                escaped: true,
            });
        }

        Ok(CellBody::Text {
            text: text.to_string(),
            escaped: false,
        })
    }

    fn text(&self) -> String {
        match self {
            CellBody::Empty => String::new(),
            CellBody::Text { text, escaped } => {
                if *escaped {
                    format!("'{}", text)
                } else {
                    text.clone()
                }
            }
            CellBody::Formula { ast } => format!("={}", ast),
        }
    }

    pub(crate) fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellBody::Formula { ast } => ast.referenced_cells(),
            _ => Vec::new(),
        }
    }
}

/// A node of the cell graph
///
/// A cell owns its body, the ordered list of positions its formula references
/// (children), the set of positions whose formulas reference it (parents),
/// and a memoized value. Edges are position handles into the sheet's map; the
/// sheet keeps both directions symmetric across edits.
#[derive(Debug)]
pub struct Cell {
    body: CellBody,
    children: Vec<Position>,
    parents: HashSet<Position, RandomState>,
    // Reads are `&self`; the engine is single-threaded.
    cache: RefCell<Option<CellValue>>,
}

impl Cell {
    pub(crate) fn new() -> Self {
        Self {
            body: CellBody::Empty,
            children: Vec::new(),
            parents: HashSet::default(),
            cache: RefCell::new(None),
        }
    }

    /// The value this cell presents, memoized until the next invalidation
    ///
    /// Text that parses entirely as a number reads as that number (unless
    /// escaped); formulas evaluate against the sheet; an empty cell reads as
    /// empty text.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        if let Some(value) = self.cache.borrow().as_ref() {
            return value.clone();
        }

        let value = self.compute_value(sheet);
        *self.cache.borrow_mut() = Some(value.clone());
        value
    }

    fn compute_value(&self, sheet: &Sheet) -> CellValue {
        match &self.body {
            CellBody::Empty => CellValue::default(),
            CellBody::Text { text, escaped } => {
                if *escaped {
                    return CellValue::Text(text.clone());
                }
                match text.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::Text(text.clone()),
                }
            }
            CellBody::Formula { ast } => match evaluate(ast, sheet) {
                Ok(n) => CellValue::Number(n),
                Err(e) => CellValue::Error(e),
            },
        }
    }

    /// The text this cell would round-trip through an edit
    pub fn text(&self) -> String {
        self.body.text()
    }

    /// Positions referenced by this cell's formula, in first-appearance
    /// order, deduplicated
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.body.referenced_cells()
    }

    /// Whether any other cell's formula references this one
    pub fn is_referenced(&self) -> bool {
        !self.parents.is_empty()
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self.body, CellBody::Empty)
    }

    pub(crate) fn children(&self) -> &[Position] {
        &self.children
    }

    pub(crate) fn parents(&self) -> impl Iterator<Item = Position> + '_ {
        self.parents.iter().copied()
    }

    pub(crate) fn add_parent(&mut self, parent: Position) {
        self.parents.insert(parent);
    }

    pub(crate) fn remove_parent(&mut self, parent: Position) {
        self.parents.remove(&parent);
    }

    /// Swap in a new body and outgoing edges, returning the old edges
    ///
    /// The caller rewrites the children's parent links and cascades the
    /// cache invalidation.
    pub(crate) fn replace_content(
        &mut self,
        body: CellBody,
        children: Vec<Position>,
    ) -> Vec<Position> {
        self.body = body;
        mem::replace(&mut self.children, children)
    }

    /// Reset the body to empty, returning the dropped outgoing edges
    ///
    /// Parent links are untouched: cells referencing this one keep a valid
    /// target that now reads as empty.
    pub(crate) fn clear_body(&mut self) -> Vec<Position> {
        self.body = CellBody::Empty;
        *self.cache.borrow_mut() = None;
        mem::take(&mut self.children)
    }

    pub(crate) fn invalidate_cache(&self) {
        self.cache.borrow_mut().take();
    }

    #[cfg(test)]
    pub(crate) fn cached_value(&self) -> Option<CellValue> {
        self.cache.borrow().clone()
    }
}
