pub mod codepage;
pub mod colors;
pub mod frame;
pub mod grid;
pub mod surface;
pub mod terminal;

pub use colors::{style_for, CgaColor, Style, CGA_PALETTE};
pub use frame::{
    render_frame, text_columns, CursorState, DisplayState, DrawRequest, FrameStats, RenderError,
    TEXT_ROWS,
};
pub use grid::{Cell, CellGrid};
pub use surface::{MemorySurface, Surface, SurfaceStats};
pub use terminal::{TerminalGuard, TerminalSurface};
