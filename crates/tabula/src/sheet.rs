//! The sheet: cell storage and the edit transaction

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use ahash::RandomState;
use tabula_core::{CellValue, Error, Position, Result, Size};
use tabula_formula::CellProvider;

use crate::cell::{Cell, CellBody};

/// A sparse grid of cells with dependency tracking
///
/// The sheet is the sole owner of every cell; the graph edges between cells
/// are position handles into its map. Edits go through a transaction that
/// either commits atomically or leaves the sheet observably unchanged.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell, RandomState>,
    size: Size,
}

/// A detached cell built from an edit before it is committed
///
/// `created` collects the placeholder positions materialized while resolving
/// the body's references, so failed edits can remove them again.
struct Candidate {
    body: CellBody,
    children: Vec<Position>,
    created: Vec<Position>,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of a cell from its wire form
    ///
    /// The edit validates the position, compiles the text, materializes
    /// placeholder cells for referenced positions, refuses cycles, and
    /// finally swaps the new content in while keeping the dependency edges
    /// and value caches of every affected cell consistent. On error the
    /// sheet is left as it was.
    ///
    /// Setting the exact text a cell already contains is a no-op.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        Self::validate(pos)?;

        let old_size = self.size;
        let is_new = match self.cells.get(&pos) {
            Some(cell) => {
                if cell.text() == text {
                    return Ok(());
                }
                false
            }
            None => {
                self.insert_empty(pos);
                true
            }
        };

        let candidate = match self.build_candidate(text) {
            Ok(candidate) => candidate,
            Err(e) => {
                if is_new {
                    self.cells.remove(&pos);
                }
                self.size = old_size;
                return Err(e);
            }
        };

        if self.reaches(&candidate.children, pos) {
            for created in &candidate.created {
                self.cells.remove(created);
            }
            if is_new {
                self.cells.remove(&pos);
            }
            self.size = old_size;
            return Err(Error::CircularReference(pos.to_string()));
        }

        self.commit(pos, candidate);
        Ok(())
    }

    /// Get the cell at `pos`, if present
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>> {
        Self::validate(pos)?;
        Ok(self.cells.get(&pos))
    }

    /// The value at `pos`; an absent cell reads as empty text
    pub fn value(&self, pos: Position) -> Result<CellValue> {
        Self::validate(pos)?;
        Ok(self
            .cells
            .get(&pos)
            .map(|cell| cell.value(self))
            .unwrap_or_default())
    }

    /// Clear the cell at `pos`
    ///
    /// A referenced cell keeps its slot with an empty body so its parents
    /// still have a valid target; an unreferenced cell is removed. Empty
    /// placeholder children that the cleared cell was the last to reference
    /// are removed as well. Clearing an absent cell is a no-op.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        Self::validate(pos)?;
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        // Parents now read this cell as 0; their caches are stale.
        self.invalidate(pos);

        let old_children = match self.cells.get_mut(&pos) {
            Some(cell) => cell.clear_body(),
            None => Vec::new(),
        };

        let mut removed = Vec::new();
        for child in old_children {
            let orphaned = match self.cells.get_mut(&child) {
                Some(cell) => {
                    cell.remove_parent(pos);
                    cell.is_empty() && !cell.is_referenced()
                }
                None => false,
            };
            if orphaned {
                self.cells.remove(&child);
                removed.push(child);
            }
        }

        let referenced = self
            .cells
            .get(&pos)
            .map(|cell| cell.is_referenced())
            .unwrap_or(false);
        if !referenced {
            self.cells.remove(&pos);
            removed.push(pos);
        }

        if removed.iter().any(|p| self.on_border(*p)) {
            self.refit_size();
        }

        Ok(())
    }

    /// The printable area: one past the maximum occupied row and column
    ///
    /// Placeholder cells materialized for formula references count as
    /// occupied.
    pub fn printable_size(&self) -> Size {
        self.size
    }

    /// Write the cell texts, tab-separated, row by row
    pub fn print_texts<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_with(output, |cell| cell.text())
    }

    /// Write the cell values, tab-separated, row by row
    pub fn print_values<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_with(output, |cell| cell.value(self).to_string())
    }

    fn print_with<W: Write>(
        &self,
        output: &mut W,
        render: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        for row in 0..self.size.rows {
            for col in 0..self.size.cols {
                if col > 0 {
                    write!(output, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    write!(output, "{}", render(cell))?;
                }
            }
            writeln!(output)?;
        }
        Ok(())
    }

    // === Edit transaction internals ===

    fn validate(pos: Position) -> Result<()> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidPosition(format!(
                "({}, {}) is out of range",
                pos.row, pos.col
            )))
        }
    }

    /// Compile `text` and resolve its references into a detached candidate
    ///
    /// Referenced positions that have no cell yet are materialized as empty
    /// placeholders and collected; if any reference is out of range, the
    /// placeholders materialized so far are removed again.
    fn build_candidate(&mut self, text: &str) -> Result<Candidate> {
        let body = CellBody::compile(text)?;
        let children = body.referenced_cells();

        let mut created = Vec::new();
        for &child in &children {
            if !child.is_valid() {
                for undo in &created {
                    self.cells.remove(undo);
                }
                return Err(Error::InvalidPosition(
                    "formula references a position out of range".to_string(),
                ));
            }
            if !self.cells.contains_key(&child) {
                self.insert_empty(child);
                created.push(child);
            }
        }

        Ok(Candidate {
            body,
            children,
            created,
        })
    }

    /// Whether `target` is reachable from `roots` along outgoing edges
    fn reaches(&self, roots: &[Position], target: Position) -> bool {
        let mut stack = roots.to_vec();
        let mut visited: HashSet<Position, RandomState> = HashSet::default();

        while let Some(pos) = stack.pop() {
            if pos == target {
                return true;
            }
            if !visited.insert(pos) {
                continue;
            }
            if let Some(cell) = self.cells.get(&pos) {
                stack.extend_from_slice(cell.children());
            }
        }

        false
    }

    /// Swap the candidate into the target cell and rewrite the edges
    ///
    /// Old children forget the target as a parent, new children learn it,
    /// and the invalidation cascade clears every cache whose value could
    /// have changed.
    fn commit(&mut self, pos: Position, candidate: Candidate) {
        let Some(cell) = self.cells.get_mut(&pos) else {
            return;
        };
        let old_children = cell.replace_content(candidate.body, candidate.children.clone());

        for child in old_children {
            if let Some(cell) = self.cells.get_mut(&child) {
                cell.remove_parent(pos);
            }
        }
        for child in candidate.children {
            if let Some(cell) = self.cells.get_mut(&child) {
                cell.add_parent(pos);
            }
        }

        self.invalidate(pos);
    }

    /// Clear the cache of `start` and, transitively, of every cell that
    /// depends on it
    ///
    /// The graph is acyclic after every commit, but the visited set keeps
    /// the walk finite even mid-swap.
    fn invalidate(&self, start: Position) {
        let mut stack = vec![start];
        let mut visited: HashSet<Position, RandomState> = HashSet::default();

        while let Some(pos) = stack.pop() {
            if !visited.insert(pos) {
                continue;
            }
            if let Some(cell) = self.cells.get(&pos) {
                cell.invalidate_cache();
                stack.extend(cell.parents());
            }
        }
    }

    fn insert_empty(&mut self, pos: Position) {
        self.size.rows = self.size.rows.max(pos.row + 1);
        self.size.cols = self.size.cols.max(pos.col + 1);
        self.cells.insert(pos, Cell::new());
    }

    fn on_border(&self, pos: Position) -> bool {
        pos.row + 1 == self.size.rows || pos.col + 1 == self.size.cols
    }

    /// Recompute the printable area from the remaining cells, each axis
    /// independently
    fn refit_size(&mut self) {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        self.size = size;
    }
}

impl CellProvider for Sheet {
    fn cell_value(&self, pos: Position) -> Option<CellValue> {
        let cell = self.cells.get(&pos)?;
        if cell.is_empty() {
            None
        } else {
            Some(cell.value(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::CellError;

    fn pos(s: &str) -> Position {
        Position::parse(s).unwrap()
    }

    #[test]
    fn test_set_and_read_back() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "hello").unwrap();
        sheet.set_cell(pos("B1"), "42").unwrap();

        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::text("hello"));
        assert_eq!(sheet.value(pos("B1")).unwrap(), CellValue::Number(42.0));
        assert_eq!(sheet.cell(pos("A1")).unwrap().unwrap().text(), "hello");
        assert_eq!(sheet.value(pos("C1")).unwrap(), CellValue::default());
        assert!(sheet.cell(pos("C1")).unwrap().is_none());
    }

    #[test]
    fn test_set_cell_rejects_invalid_position() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(Position::new(20_000, 0), "1");
        assert!(matches!(err, Err(Error::InvalidPosition(_))));
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_formula_parse_error_rolls_back_new_cell() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(pos("C3"), "=1+");
        assert!(matches!(err, Err(Error::FormulaParse(_))));
        assert!(sheet.cell(pos("C3")).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_invalid_reference_rolls_back_placeholders() {
        let mut sheet = Sheet::new();
        // B2 materializes, then A0 fails; nothing may survive.
        let err = sheet.set_cell(pos("A1"), "=B2+A0");
        assert!(matches!(err, Err(Error::InvalidPosition(_))));
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
        assert!(sheet.cell(pos("B2")).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(pos("A1"), "=A1");
        assert!(matches!(err, Err(Error::CircularReference(_))));
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_cycle_rejected_and_rolled_back() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        let err = sheet.set_cell(pos("B1"), "=C1+A1");
        assert!(matches!(err, Err(Error::CircularReference(_))));

        // B1 stays the empty placeholder A1 materialized; the C1
        // placeholder from the failed candidate is gone.
        assert_eq!(sheet.cell(pos("B1")).unwrap().unwrap().text(), "");
        assert!(sheet.cell(pos("C1")).unwrap().is_none());
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn test_no_op_set_keeps_parent_caches() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("A2"), "=A1+3").unwrap();
        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(5.0));

        sheet.set_cell(pos("A1"), "2").unwrap();
        let a2 = sheet.cell(pos("A2")).unwrap().unwrap();
        assert_eq!(a2.cached_value(), Some(CellValue::Number(5.0)));
    }

    #[test]
    fn test_edit_invalidates_dependents_transitively() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "5").unwrap();
        sheet.set_cell(pos("A2"), "=A1").unwrap();
        sheet.set_cell(pos("A3"), "=A2+A1").unwrap();
        assert_eq!(sheet.value(pos("A3")).unwrap(), CellValue::Number(10.0));

        sheet.set_cell(pos("A1"), "7").unwrap();
        for p in ["A1", "A2", "A3"] {
            assert_eq!(sheet.cell(pos(p)).unwrap().unwrap().cached_value(), None);
        }
        assert_eq!(sheet.value(pos("A3")).unwrap(), CellValue::Number(14.0));
        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(7.0));
    }

    #[test]
    fn test_replacing_formula_rewrites_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "2").unwrap();
        sheet.set_cell(pos("C1"), "=A1").unwrap();
        assert!(sheet.cell(pos("A1")).unwrap().unwrap().is_referenced());

        sheet.set_cell(pos("C1"), "=B1").unwrap();
        assert!(!sheet.cell(pos("A1")).unwrap().unwrap().is_referenced());
        assert!(sheet.cell(pos("B1")).unwrap().unwrap().is_referenced());

        // The old edge is gone: A1 edits no longer disturb C1's cache.
        sheet.value(pos("C1")).unwrap();
        sheet.set_cell(pos("A1"), "9").unwrap();
        assert_eq!(
            sheet.cell(pos("C1")).unwrap().unwrap().cached_value(),
            Some(CellValue::Number(2.0))
        );
    }

    #[test]
    fn test_clear_cell_referenced_keeps_slot() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "3").unwrap();
        sheet.set_cell(pos("A2"), "=A1").unwrap();
        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(3.0));

        sheet.clear_cell(pos("A1")).unwrap();
        let a1 = sheet.cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.text(), "");
        // An empty referenced cell reads as 0.
        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn test_clear_cell_unreferenced_removes_and_shrinks() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("E5"), "2").unwrap();
        assert_eq!(sheet.printable_size(), Size::new(5, 5));

        sheet.clear_cell(pos("E5")).unwrap();
        assert!(sheet.cell(pos("E5")).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::new(1, 1));

        sheet.clear_cell(pos("A1")).unwrap();
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_clear_cell_collects_orphaned_placeholders() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B2"), "=Z9").unwrap();
        assert_eq!(sheet.cell(pos("Z9")).unwrap().unwrap().text(), "");
        assert_eq!(sheet.printable_size(), Size::new(9, 26));

        sheet.clear_cell(pos("B2")).unwrap();
        assert!(sheet.cell(pos("Z9")).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_clear_cell_keeps_placeholder_referenced_elsewhere() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B2"), "=Z9").unwrap();
        sheet.set_cell(pos("C3"), "=Z9").unwrap();

        sheet.clear_cell(pos("B2")).unwrap();
        assert!(sheet.cell(pos("Z9")).unwrap().is_some());
        assert_eq!(sheet.printable_size(), Size::new(9, 26));
    }

    #[test]
    fn test_clear_cell_invalidates_parents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "3").unwrap();
        sheet.set_cell(pos("A2"), "=A1").unwrap();
        sheet.value(pos("A2")).unwrap();

        sheet.clear_cell(pos("A1")).unwrap();
        assert_eq!(sheet.cell(pos("A2")).unwrap().unwrap().cached_value(), None);
    }

    #[test]
    fn test_clear_absent_cell_is_noop() {
        let mut sheet = Sheet::new();
        sheet.clear_cell(pos("J10")).unwrap();
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_size_refit_uses_both_axes() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A5"), "1").unwrap();
        sheet.set_cell(pos("E1"), "2").unwrap();
        assert_eq!(sheet.printable_size(), Size::new(5, 5));

        // Removing the row border must keep the column bound from E1.
        sheet.clear_cell(pos("A5")).unwrap();
        assert_eq!(sheet.printable_size(), Size::new(1, 5));
    }

    #[test]
    fn test_print_texts_and_values() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        sheet.set_cell(pos("A2"), "'3").unwrap();

        let mut texts = Vec::new();
        sheet.print_texts(&mut texts).unwrap();
        assert_eq!(String::from_utf8(texts).unwrap(), "2\t=A1+1\n'3\t\n");

        let mut values = Vec::new();
        sheet.print_values(&mut values).unwrap();
        assert_eq!(String::from_utf8(values).unwrap(), "2\t3\n3\t\n");
    }

    #[test]
    fn test_formula_errors_render_as_values() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1/0").unwrap();
        assert_eq!(
            sheet.value(pos("A1")).unwrap(),
            CellValue::Error(CellError::Arithmetic)
        );
        assert_eq!(sheet.value(pos("A1")).unwrap().to_string(), "#ARITHM!");
    }
}
