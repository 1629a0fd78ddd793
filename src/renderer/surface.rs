use std::io;

use crate::renderer::colors::Style;
use crate::renderer::grid::{Cell, CellGrid};

/// A grid-addressable, styleable drawing target.
///
/// Writes are buffered until [`Surface::show`] presents them, so a frame
/// never becomes partially visible.
pub trait Surface: Send {
    /// Current size as `(columns, rows)`.
    fn size(&self) -> (u16, u16);

    fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char);

    fn fill(&mut self, ch: char, style: Style);

    fn show_cursor(&mut self, x: u16, y: u16);

    fn hide_cursor(&mut self);

    /// Present all pending writes.
    fn show(&mut self) -> io::Result<()>;

    /// Re-read the backing geometry after a resize and repaint everything.
    fn sync(&mut self) -> io::Result<()>;
}

/// Counters of the operations a [`MemorySurface`] has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub fills: usize,
    pub cursor_updates: usize,
    pub presents: usize,
    pub syncs: usize,
}

/// Headless surface backed by a [`CellGrid`].
#[derive(Debug, Clone)]
pub struct MemorySurface {
    grid: CellGrid,
    cursor: Option<(u16, u16)>,
    pending_size: Option<(u16, u16)>,
    stats: SurfaceStats,
}

impl MemorySurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            grid: CellGrid::new(rows, cols),
            cursor: None,
            pending_size: None,
            stats: SurfaceStats::default(),
        }
    }

    /// Simulate the backing terminal changing size; takes effect on `sync`.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.pending_size = Some((cols, rows));
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.grid.cell_at(y, x)
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn row_text(&self, y: u16) -> String {
        self.grid
            .row(y)
            .map(|cells| cells.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (u16, u16) {
        self.grid.size()
    }

    fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char) {
        self.grid.set_cell(y, x, Cell::new(ch, style));
    }

    fn fill(&mut self, ch: char, style: Style) {
        self.stats.fills += 1;
        self.grid.fill(Cell::new(ch, style));
    }

    fn show_cursor(&mut self, x: u16, y: u16) {
        self.stats.cursor_updates += 1;
        self.cursor = Some((x, y));
    }

    fn hide_cursor(&mut self) {
        self.stats.cursor_updates += 1;
        self.cursor = None;
    }

    fn show(&mut self) -> io::Result<()> {
        self.stats.presents += 1;
        self.grid.take_dirty_rows();
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.stats.syncs += 1;
        if let Some((cols, rows)) = self.pending_size.take() {
            self.grid.resize(rows, cols);
        }
        self.grid.mark_all_dirty();
        Ok(())
    }
}
