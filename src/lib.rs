//! cga-bridge - text-mode display and input bridge for PC emulators
//!
//! Renders CGA character/attribute video memory onto a terminal cell grid
//! and turns terminal key and mouse input into XT scancodes and relative
//! mouse reports for an emulated keyboard/mouse controller.
//!
//! ## Components
//!
//! - **Renderer**: attribute decoding, CP437 glyphs, frame rendering onto a
//!   [`Surface`] (crossterm terminal or in-memory)
//! - **Input**: scancode translation with synthesized key release, mouse
//!   delta reporting
//! - **Bridge**: the event loop and the emulator-facing [`BridgeHandle`]

pub mod bridge;
pub mod config;
pub mod error;
pub mod input;
pub mod renderer;

// Re-export commonly used types
pub use bridge::{Bridge, BridgeEvent, BridgeHandle, EventLoop, LoopExit, ShutdownHooks};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use input::{Scancode, ScancodeEvent};
pub use renderer::{DrawRequest, MemorySurface, Surface, TerminalSurface};
