use serde::{Deserialize, Serialize};

/// State of one table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Incomplete,
    Complete,
    Skipped,
}

impl CellState {
    pub fn as_code(self) -> u8 {
        match self {
            Self::Incomplete => 0,
            Self::Complete => 1,
            Self::Skipped => 2,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Complete,
            2 => Self::Skipped,
            _ => Self::Incomplete,
        }
    }

    /// Incomplete -> Complete -> Skipped -> Incomplete.
    pub fn cycled(self) -> Self {
        match self {
            Self::Incomplete => Self::Complete,
            Self::Complete => Self::Skipped,
            Self::Skipped => Self::Incomplete,
        }
    }
}

/// A checklist grid: named rows, named columns, one state per cell.
///
/// `completions` is indexed `[row][column]` and always matches the row and
/// column counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    completions: Vec<Vec<CellState>>,
}

impl Default for TableData {
    fn default() -> Self {
        Self::new(vec!["Row 1".into()], vec!["Column 1".into()])
    }
}

impl TableData {
    pub fn new(rows: Vec<String>, columns: Vec<String>) -> Self {
        let completions = vec![vec![CellState::Incomplete; columns.len()]; rows.len()];
        Self {
            rows,
            columns,
            completions,
        }
    }

    /// Rebuild from stored names and codes, padding or truncating the grid.
    pub fn from_parts(rows: Vec<String>, columns: Vec<String>, codes: &[Vec<u8>]) -> Self {
        let mut table = Self::new(rows, columns);
        for (r, row) in table.completions.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                if let Some(code) = codes.get(r).and_then(|line| line.get(c)) {
                    *cell = CellState::from_code(*code);
                }
            }
        }
        table
    }

    pub fn codes(&self) -> Vec<Vec<u8>> {
        self.completions
            .iter()
            .map(|row| row.iter().map(|c| c.as_code()).collect())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<CellState> {
        self.completions.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn set_cell(&mut self, row: usize, column: usize, state: CellState) -> bool {
        match self.completions.get_mut(row).and_then(|r| r.get_mut(column)) {
            Some(cell) => {
                *cell = state;
                true
            }
            None => false,
        }
    }

    pub fn cycle_cell(&mut self, row: usize, column: usize) -> bool {
        match self.cell(row, column) {
            Some(state) => self.set_cell(row, column, state.cycled()),
            None => false,
        }
    }

    pub fn add_row(&mut self, name: impl Into<String>) {
        self.rows.push(name.into());
        self.completions
            .push(vec![CellState::Incomplete; self.columns.len()]);
    }

    pub fn add_column(&mut self, name: impl Into<String>) {
        self.columns.push(name.into());
        for row in &mut self.completions {
            row.push(CellState::Incomplete);
        }
    }

    /// Remove the last row. A table always keeps at least one row.
    pub fn remove_row(&mut self) -> bool {
        if self.rows.len() <= 1 {
            return false;
        }
        self.rows.pop();
        self.completions.pop();
        true
    }

    /// Remove the last column. A table always keeps at least one column.
    pub fn remove_column(&mut self) -> bool {
        if self.columns.len() <= 1 {
            return false;
        }
        self.columns.pop();
        for row in &mut self.completions {
            row.pop();
        }
        true
    }

    /// Move a row, carrying its completions with it.
    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        if from >= self.rows.len() || to >= self.rows.len() {
            return false;
        }
        let name = self.rows.remove(from);
        self.rows.insert(to, name);
        let line = self.completions.remove(from);
        self.completions.insert(to, line);
        true
    }

    /// Move a column, carrying its completions with it. Mirror of
    /// [`TableData::move_row`] across the diagonal.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() || to >= self.columns.len() {
            return false;
        }
        let name = self.columns.remove(from);
        self.columns.insert(to, name);
        for row in &mut self.completions {
            let cell = row.remove(from);
            row.insert(to, cell);
        }
        true
    }

    pub fn total_cells(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    fn count(&self, state: CellState) -> usize {
        self.completions
            .iter()
            .flatten()
            .filter(|c| **c == state)
            .count()
    }

    pub fn completed_cells(&self) -> usize {
        self.count(CellState::Complete)
    }

    pub fn skipped_cells(&self) -> usize {
        self.count(CellState::Skipped)
    }

    /// Completed over countable (non-skipped) cells; zero when nothing counts.
    pub fn fraction(&self) -> f32 {
        let countable = self.total_cells() - self.skipped_cells();
        if countable == 0 {
            0.0
        } else {
            self.completed_cells() as f32 / countable as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        let countable = self.total_cells() - self.skipped_cells();
        countable > 0 && self.completed_cells() == countable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> TableData {
        let mut t = TableData::default();
        t.add_row("Row 2");
        t.add_column("Column 2");
        t
    }

    #[test]
    fn skipped_cells_do_not_count() {
        let mut t = two_by_two();
        t.set_cell(0, 0, CellState::Complete);
        t.set_cell(0, 1, CellState::Complete);
        t.set_cell(1, 0, CellState::Complete);
        assert!(!t.is_complete());
        t.set_cell(1, 1, CellState::Skipped);
        assert!(t.is_complete());
        assert_eq!(t.fraction(), 1.0);
    }

    #[test]
    fn fully_skipped_table_is_not_complete() {
        let mut t = TableData::default();
        t.set_cell(0, 0, CellState::Skipped);
        assert!(!t.is_complete());
        assert_eq!(t.fraction(), 0.0);
    }

    #[test]
    fn row_and_column_moves_mirror_each_other() {
        let mut t = two_by_two();
        t.set_cell(0, 1, CellState::Complete);

        t.move_row(0, 1);
        assert_eq!(t.cell(1, 1), Some(CellState::Complete));
        assert_eq!(t.rows, vec!["Row 2".to_string(), "Row 1".to_string()]);

        t.move_column(1, 0);
        assert_eq!(t.cell(1, 0), Some(CellState::Complete));
        assert_eq!(t.columns[0], "Column 2");

        t.move_column(0, 1);
        t.move_row(1, 0);
        assert_eq!(t.cell(0, 1), Some(CellState::Complete));
    }

    #[test]
    fn last_row_and_column_are_kept() {
        let mut t = TableData::default();
        assert!(!t.remove_row());
        assert!(!t.remove_column());
        t.add_row("x");
        assert!(t.remove_row());
        assert_eq!(t.row_count(), 1);
    }

    #[test]
    fn from_parts_pads_missing_cells() {
        let t = TableData::from_parts(
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into()],
            &[vec![1]],
        );
        assert_eq!(t.cell(0, 0), Some(CellState::Complete));
        assert_eq!(t.cell(1, 1), Some(CellState::Incomplete));
        assert_eq!(t.codes(), vec![vec![1, 0], vec![0, 0]]);
    }
}
