use crate::renderer::colors::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Cell {
    pub fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ch == ' ' && self.style == Style::default()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// Fixed-size matrix of styled cells with per-row dirty tracking.
#[derive(Debug, Clone)]
pub struct CellGrid {
    rows: u16,
    cols: u16,
    cells: Vec<Vec<Cell>>,
    dirty_rows: Vec<bool>,
}

impl CellGrid {
    pub fn new(rows: u16, cols: u16) -> Self {
        let mut cells = Vec::with_capacity(rows as usize);
        for _ in 0..rows {
            cells.push(vec![Cell::empty(); cols as usize]);
        }

        Self {
            rows,
            cols,
            cells,
            dirty_rows: vec![true; rows as usize],
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn resize(&mut self, new_rows: u16, new_cols: u16) {
        if new_rows == self.rows && new_cols == self.cols {
            return;
        }

        for row in &mut self.cells {
            row.resize(new_cols as usize, Cell::empty());
        }
        self.cells
            .resize_with(new_rows as usize, || vec![Cell::empty(); new_cols as usize]);

        self.rows = new_rows;
        self.cols = new_cols;
        self.dirty_rows = vec![true; new_rows as usize];
    }

    /// Write one cell. Coordinates outside the grid are ignored.
    pub fn set_cell(&mut self, row: u16, col: u16, cell: Cell) {
        if let Some(target) = self
            .cells
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        {
            if *target != cell {
                *target = cell;
                self.dirty_rows[row as usize] = true;
            }
        }
    }

    pub fn fill(&mut self, cell: Cell) {
        for row in &mut self.cells {
            row.fill(cell);
        }
        self.mark_all_dirty();
    }

    pub fn cell_at(&self, row: u16, col: u16) -> Option<&Cell> {
        self.cells.get(row as usize)?.get(col as usize)
    }

    pub fn row(&self, index: u16) -> Option<&[Cell]> {
        self.cells.get(index as usize).map(Vec::as_slice)
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty_rows.iter_mut().for_each(|d| *d = true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_rows.iter().any(|d| *d)
    }

    /// Indices of rows changed since the last call, clearing the marks.
    pub fn take_dirty_rows(&mut self) -> Vec<u16> {
        let dirty = self
            .dirty_rows
            .iter()
            .enumerate()
            .filter(|(_, d)| **d)
            .map(|(i, _)| i as u16)
            .collect();
        self.dirty_rows.iter_mut().for_each(|d| *d = false);
        dirty
    }
}
