//! Text-mode frame rendering.
//!
//! A [`DrawRequest`] carries one frame of CGA video memory: character and
//! attribute byte pairs, row-major, with no explicit mode field. The column
//! count is recovered from the buffer length by [`text_columns`].

use thiserror::Error;
use tracing::debug;

use crate::renderer::codepage;
use crate::renderer::colors::{style_for, CgaColor, Style};
use crate::renderer::surface::Surface;

pub const TEXT_ROWS: usize = 25;

const BYTES_PER_CELL: usize = 2;
const WIDE_FRAME_LEN: usize = 80 * TEXT_ROWS * BYTES_PER_CELL;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Draw buffer too short: {columns}-column frame needs {needed} bytes, got {actual}")]
    BufferTooShort {
        columns: usize,
        needed: usize,
        actual: usize,
    },

    #[error("Surface error: {0}")]
    Surface(#[from] std::io::Error),
}

/// One frame of text-mode video memory plus the metadata to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRequest {
    pub buffer: Vec<u8>,
    pub blink: bool,
    /// Palette index of the border; only the low nibble is used.
    pub border: u8,
    /// Negative coordinates hide the cursor.
    pub cursor_x: i32,
    pub cursor_y: i32,
}

impl DrawRequest {
    pub fn columns(&self) -> usize {
        text_columns(self.buffer.len())
    }

    /// Check that the buffer covers the geometry its length implies.
    pub fn validate(&self) -> Result<usize, RenderError> {
        let columns = self.columns();
        let needed = columns * TEXT_ROWS * BYTES_PER_CELL;
        if self.buffer.len() < needed {
            return Err(RenderError::BufferTooShort {
                columns,
                needed,
                actual: self.buffer.len(),
            });
        }
        Ok(columns)
    }

    fn cursor(&self) -> CursorState {
        match (u16::try_from(self.cursor_x), u16::try_from(self.cursor_y)) {
            (Ok(x), Ok(y)) => CursorState::At(x, y),
            _ => CursorState::Hidden,
        }
    }
}

/// Active text mode width for a buffer of `len` bytes: 40 columns when the
/// buffer cannot hold an 80x25 frame, 80 otherwise.
pub fn text_columns(len: usize) -> usize {
    if len < WIDE_FRAME_LEN {
        40
    } else {
        80
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Hidden,
    At(u16, u16),
}

/// What the terminal currently shows; `None` means nothing applied yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub border: Option<u8>,
    pub cursor: Option<CursorState>,
}

impl DisplayState {
    /// Forget everything; the next frame repaints border and cursor.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub columns: usize,
    pub border_filled: bool,
    pub cursor_moved: bool,
}

/// Apply `request` to `surface`, presenting exactly once.
///
/// A malformed request is rejected before anything is drawn, leaving both
/// the surface and `display` untouched. `display` only records what a
/// successful present put on screen; a failed present invalidates it.
pub fn render_frame<S: Surface + ?Sized>(
    display: &mut DisplayState,
    surface: &mut S,
    request: &DrawRequest,
) -> Result<FrameStats, RenderError> {
    let columns = request.validate()?;

    let border = request.border & 0xF;
    let border_filled = display.border != Some(border);
    if border_filled {
        debug!("Border color changed to {}", border);
        surface.fill(' ', Style::with_background(CgaColor::from_index(border)));
    }

    let mem = &request.buffer;
    for y in 0..TEXT_ROWS {
        for x in 0..columns {
            let offset = y * columns * BYTES_PER_CELL + x * BYTES_PER_CELL;
            let style = style_for(mem[offset + 1], request.blink);
            surface.set_cell(x as u16, y as u16, style, codepage::glyph(mem[offset]));
        }
    }

    let cursor = request.cursor();
    let cursor_moved = display.cursor != Some(cursor);
    if cursor_moved {
        match cursor {
            CursorState::At(x, y) => surface.show_cursor(x, y),
            CursorState::Hidden => surface.hide_cursor(),
        }
    }

    if let Err(e) = surface.show() {
        display.invalidate();
        return Err(e.into());
    }
    display.border = Some(border);
    display.cursor = Some(cursor);

    Ok(FrameStats {
        columns,
        border_filled,
        cursor_moved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::surface::MemorySurface;
    use std::io;

    /// Memory surface whose next present fails.
    struct FlakySurface {
        inner: MemorySurface,
        fail_next: bool,
    }

    impl Surface for FlakySurface {
        fn size(&self) -> (u16, u16) {
            self.inner.size()
        }

        fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char) {
            self.inner.set_cell(x, y, style, ch);
        }

        fn fill(&mut self, ch: char, style: Style) {
            self.inner.fill(ch, style);
        }

        fn show_cursor(&mut self, x: u16, y: u16) {
            self.inner.show_cursor(x, y);
        }

        fn hide_cursor(&mut self) {
            self.inner.hide_cursor();
        }

        fn show(&mut self) -> io::Result<()> {
            if std::mem::take(&mut self.fail_next) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"));
            }
            self.inner.show()
        }

        fn sync(&mut self) -> io::Result<()> {
            self.inner.sync()
        }
    }

    fn frame(columns: usize, ch: u8, attr: u8) -> DrawRequest {
        DrawRequest {
            buffer: [ch, attr].repeat(columns * TEXT_ROWS),
            blink: false,
            border: 0,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    #[test]
    fn test_text_columns() {
        assert_eq!(text_columns(0), 40);
        assert_eq!(text_columns(40 * 25 * 2), 40);
        assert_eq!(text_columns(80 * 25 * 2 - 1), 40);
        assert_eq!(text_columns(80 * 25 * 2), 80);
        assert_eq!(text_columns(0x4000), 80);
    }

    #[test]
    fn test_white_on_navy_scenario() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let stats = render_frame(&mut display, &mut surface, &frame(80, 0x41, 0x1F)).unwrap();

        assert_eq!(stats.columns, 80);
        for y in 0..25 {
            for x in 0..80 {
                let cell = surface.cell(x, y).unwrap();
                assert_eq!(cell.ch, 'A');
                assert_eq!(cell.style.fg, CgaColor::White);
                assert_eq!(cell.style.bg, CgaColor::Navy);
                assert!(!cell.style.blink);
            }
        }
        assert_eq!(surface.stats().presents, 1);
    }

    #[test]
    fn test_forty_column_frame() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(40, b'x', 0x07);
        request.border = 4;
        let stats = render_frame(&mut display, &mut surface, &request).unwrap();

        assert_eq!(stats.columns, 40);
        assert_eq!(surface.cell(39, 24).unwrap().ch, 'x');
        // right half keeps the border fill
        let outside = surface.cell(40, 0).unwrap();
        assert_eq!(outside.ch, ' ');
        assert_eq!(outside.style.bg, CgaColor::Maroon);
    }

    #[test]
    fn test_border_fill_only_on_change() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(80, b' ', 0x07);
        request.border = 1;

        assert!(render_frame(&mut display, &mut surface, &request).unwrap().border_filled);
        assert!(!render_frame(&mut display, &mut surface, &request).unwrap().border_filled);
        assert_eq!(surface.stats().fills, 1);

        request.border = 0x12; // low nibble 2
        assert!(render_frame(&mut display, &mut surface, &request).unwrap().border_filled);
        assert_eq!(display.border, Some(2));
        assert_eq!(surface.stats().fills, 2);
    }

    #[test]
    fn test_cursor_moves_only_on_change() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(80, b' ', 0x07);
        request.cursor_x = 5;
        request.cursor_y = 3;

        render_frame(&mut display, &mut surface, &request).unwrap();
        render_frame(&mut display, &mut surface, &request).unwrap();
        assert_eq!(surface.stats().cursor_updates, 1);
        assert_eq!(surface.cursor(), Some((5, 3)));

        request.cursor_x = 6;
        let stats = render_frame(&mut display, &mut surface, &request).unwrap();
        assert!(stats.cursor_moved);
        assert_eq!(surface.stats().cursor_updates, 2);
        assert_eq!(surface.cursor(), Some((6, 3)));
    }

    #[test]
    fn test_negative_cursor_hides() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(80, b' ', 0x07);
        request.cursor_x = -1;
        request.cursor_y = -1;

        render_frame(&mut display, &mut surface, &request).unwrap();
        assert_eq!(surface.cursor(), None);
        assert_eq!(display.cursor, Some(CursorState::Hidden));
    }

    #[test]
    fn test_blink_phase_reaches_cells() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(80, b'*', 0x9E);

        render_frame(&mut display, &mut surface, &request).unwrap();
        assert_eq!(surface.cell(0, 0).unwrap().style.bg, CgaColor::Blue);

        request.blink = true;
        render_frame(&mut display, &mut surface, &request).unwrap();
        let cell = surface.cell(0, 0).unwrap();
        assert_eq!(cell.style.bg, CgaColor::Navy);
        assert!(cell.style.blink);
    }

    #[test]
    fn test_short_buffer_is_rejected_untouched() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        let mut request = frame(40, b'A', 0x1F);
        request.buffer.truncate(1999);

        let err = render_frame(&mut display, &mut surface, &request).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferTooShort {
                columns: 40,
                needed: 2000,
                actual: 1999
            }
        ));
        assert_eq!(display, DisplayState::default());
        assert_eq!(surface.stats().presents, 0);
        assert_eq!(surface.stats().fills, 0);
    }

    #[test]
    fn test_failed_present_is_not_recorded() {
        let mut display = DisplayState::default();
        let mut surface = FlakySurface {
            inner: MemorySurface::new(80, 25),
            fail_next: true,
        };
        let mut request = frame(80, b' ', 0x07);
        request.border = 1;
        request.cursor_x = 5;
        request.cursor_y = 3;

        let err = render_frame(&mut display, &mut surface, &request).unwrap_err();
        assert!(matches!(err, RenderError::Surface(_)));
        assert_eq!(display, DisplayState::default());

        // the same frame again reapplies border and cursor
        let stats = render_frame(&mut display, &mut surface, &request).unwrap();
        assert!(stats.border_filled);
        assert!(stats.cursor_moved);
        assert_eq!(display.border, Some(1));
        assert_eq!(display.cursor, Some(CursorState::At(5, 3)));
        assert_eq!(surface.inner.stats().fills, 2);
        assert_eq!(surface.inner.stats().presents, 1);
    }

    #[test]
    fn test_failed_present_forgets_applied_state() {
        let mut display = DisplayState::default();
        let mut surface = FlakySurface {
            inner: MemorySurface::new(80, 25),
            fail_next: false,
        };
        let mut request = frame(40, b' ', 0x07);
        request.border = 1;
        render_frame(&mut display, &mut surface, &request).unwrap();

        request.border = 2;
        surface.fail_next = true;
        assert!(render_frame(&mut display, &mut surface, &request).is_err());

        // switching back must repaint over the half-applied border 2
        request.border = 1;
        assert!(render_frame(&mut display, &mut surface, &request).unwrap().border_filled);
        assert_eq!(surface.inner.cell(79, 24).unwrap().style.bg, CgaColor::Navy);
    }

    #[test]
    fn test_codepage_translation() {
        let mut display = DisplayState::default();
        let mut surface = MemorySurface::new(80, 25);
        render_frame(&mut display, &mut surface, &frame(80, 0xDB, 0x0F)).unwrap();
        assert_eq!(surface.cell(10, 10).unwrap().ch, '█');
    }
}
