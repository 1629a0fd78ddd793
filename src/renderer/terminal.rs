use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::renderer::colors::Style;
use crate::renderer::grid::{Cell, CellGrid};
use crate::renderer::surface::Surface;

/// Puts the controlling terminal into raw mode for the lifetime of the guard.
pub struct TerminalGuard {
    alternate_screen: bool,
    mouse_capture: bool,
}

impl TerminalGuard {
    pub fn enter(config: &BridgeConfig) -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        if config.alternate_screen {
            execute!(out, EnterAlternateScreen)?;
        }
        if config.mouse_capture {
            execute!(out, EnableMouseCapture)?;
        }
        execute!(out, Hide, Clear(ClearType::All))?;
        out.flush()?;
        debug!("Terminal switched to raw mode");

        Ok(Self {
            alternate_screen: config.alternate_screen,
            mouse_capture: config.mouse_capture,
        })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = execute!(out, SetAttribute(Attribute::Reset), Show);
        if self.mouse_capture {
            let _ = execute!(out, DisableMouseCapture);
        }
        if self.alternate_screen {
            let _ = execute!(out, LeaveAlternateScreen);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Surface that paints onto a real terminal through crossterm.
///
/// Writes land in a back buffer; `show` emits only the cells that differ
/// from what the terminal already displays.
pub struct TerminalSurface<W: Write> {
    out: W,
    front: CellGrid,
    back: CellGrid,
    cursor: Option<(u16, u16)>,
    full_repaint: bool,
    true_color: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self::with_size(io::stdout(), cols, rows))
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn with_size(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            front: CellGrid::new(rows, cols),
            back: CellGrid::new(rows, cols),
            cursor: None,
            full_repaint: true,
            true_color: false,
        }
    }

    /// Paint with exact 24-bit palette colors.
    pub fn with_true_color(mut self, enabled: bool) -> Self {
        self.true_color = enabled;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        debug!("Terminal surface resized to {}x{}", cols, rows);
        self.front.resize(rows, cols);
        self.back.resize(rows, cols);
        self.full_repaint = true;
    }

    fn queue_style(&mut self, style: Style) -> io::Result<()> {
        let blink = if style.blink {
            Attribute::SlowBlink
        } else {
            Attribute::NoBlink
        };
        queue!(
            self.out,
            SetForegroundColor(style.fg.terminal_color(self.true_color)),
            SetBackgroundColor(style.bg.terminal_color(self.true_color)),
            SetAttribute(blink)
        )
    }

    fn flush_cells(&mut self) -> io::Result<()> {
        let full = std::mem::take(&mut self.full_repaint);
        let rows: Vec<u16> = if full {
            self.back.take_dirty_rows();
            (0..self.back.rows()).collect()
        } else {
            self.back.take_dirty_rows()
        };

        let mut pen: Option<Style> = None;
        let mut at: Option<(u16, u16)> = None;

        for row in rows {
            for col in 0..self.back.cols() {
                let cell = match self.back.cell_at(row, col) {
                    Some(cell) => *cell,
                    None => continue,
                };
                if !full && self.front.cell_at(row, col) == Some(&cell) {
                    continue;
                }

                if at != Some((col, row)) {
                    queue!(self.out, MoveTo(col, row))?;
                }
                if pen != Some(cell.style) {
                    self.queue_style(cell.style)?;
                    pen = Some(cell.style);
                }
                queue!(self.out, Print(cell.ch))?;

                self.front.set_cell(row, col, cell);
                at = Some((col + 1, row));
            }
        }
        Ok(())
    }

    fn present(&mut self) -> io::Result<()> {
        self.flush_cells()?;
        match self.cursor {
            Some((x, y)) => queue!(self.out, MoveTo(x, y), Show)?,
            None => queue!(self.out, Hide)?,
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Surface for TerminalSurface<W> {
    fn size(&self) -> (u16, u16) {
        self.back.size()
    }

    fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char) {
        self.back.set_cell(y, x, Cell::new(ch, style));
    }

    fn fill(&mut self, ch: char, style: Style) {
        self.back.fill(Cell::new(ch, style));
    }

    fn show_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Some((x, y));
    }

    fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    fn show(&mut self) -> io::Result<()> {
        let result = self.present();
        if result.is_err() {
            // screen contents unknown; dirty marks are already consumed
            self.full_repaint = true;
        }
        result
    }

    fn sync(&mut self) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        self.resize(cols, rows);
        queue!(self.out, SetAttribute(Attribute::Reset), Clear(ClearType::All))?;
        self.show()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::colors::CgaColor;

    fn printed(surface: &TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8_lossy(surface.get_ref()).into_owned()
    }

    /// Collects output but rejects the next write when `fail_next` is set.
    #[derive(Default)]
    struct FlakyWriter {
        buf: Vec<u8>,
        fail_next: bool,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.fail_next) {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "try again"));
            }
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_show_writes_changed_cells() {
        let mut surface = TerminalSurface::with_size(Vec::new(), 10, 2);
        surface.set_cell(0, 0, Style::default(), 'Q');
        surface.show().unwrap();

        assert_eq!(printed(&surface).matches('Q').count(), 1);
    }

    #[test]
    fn test_unchanged_cells_are_not_rewritten() {
        let mut surface = TerminalSurface::with_size(Vec::new(), 10, 2);
        surface.set_cell(3, 1, Style::default(), 'Q');
        surface.show().unwrap();
        surface.set_cell(3, 1, Style::default(), 'Q');
        surface.set_cell(4, 1, Style::default(), 'Z');
        surface.show().unwrap();

        let out = printed(&surface);
        assert_eq!(out.matches('Q').count(), 1);
        assert_eq!(out.matches('Z').count(), 1);
    }

    #[test]
    fn test_fill_repaints_every_cell() {
        let mut surface = TerminalSurface::with_size(Vec::new(), 4, 3);
        surface.show().unwrap();
        surface.fill('#', Style::with_background(CgaColor::Teal));
        surface.show().unwrap();

        assert_eq!(printed(&surface).matches('#').count(), 12);
    }

    #[test]
    fn test_failed_show_repaints_everything_next_time() {
        let mut surface = TerminalSurface::with_size(FlakyWriter::default(), 10, 2);
        surface.show().unwrap();

        surface.out.fail_next = true;
        surface.set_cell(0, 1, Style::default(), 'Q');
        assert!(surface.show().is_err());

        surface.set_cell(0, 1, Style::default(), 'Q');
        surface.show().unwrap();

        let out = String::from_utf8_lossy(&surface.out.buf).into_owned();
        assert_eq!(out.matches('Q').count(), 1);
    }

    #[test]
    fn test_true_color_output() {
        let mut surface = TerminalSurface::with_size(Vec::new(), 1, 1).with_true_color(true);
        surface.set_cell(0, 0, Style::with_background(CgaColor::Navy), 'x');
        surface.show().unwrap();

        assert!(printed(&surface).contains("48;2;0;0;128"));
    }

    #[test]
    fn test_cursor_visibility() {
        let mut surface = TerminalSurface::with_size(Vec::new(), 4, 3);
        surface.hide_cursor();
        surface.show().unwrap();
        let hidden = printed(&surface).len();

        surface.show_cursor(1, 1);
        surface.show().unwrap();
        assert!(printed(&surface).len() > hidden);
    }
}
