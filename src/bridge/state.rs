use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::input::keyboard::ScancodeEvent;
use crate::input::mouse::{MouseReport, MouseState};
use crate::renderer::DisplayState;

pub type KeyboardHandler = Arc<dyn Fn(ScancodeEvent) + Send + Sync>;

/// Receives `(buttons, dx, dy)`.
pub type MouseHandler = Arc<dyn Fn(u8, i8, i8) + Send + Sync>;

/// Everything the bridge shares between its event loop, release timers and
/// the emulator. Always accessed through [`SharedState`].
#[derive(Default)]
pub struct BridgeState {
    pub keyboard_handler: Option<KeyboardHandler>,
    pub mouse_handler: Option<MouseHandler>,
    pub mouse: MouseState,
    pub display: DisplayState,
}

pub type SharedState = Arc<Mutex<BridgeState>>;

impl BridgeState {
    pub fn shared() -> SharedState {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn emit_key(&self, event: ScancodeEvent) {
        if let Some(handler) = &self.keyboard_handler {
            handler(event);
        }
    }

    pub fn emit_mouse(&self, report: MouseReport) {
        if let Some(handler) = &self.mouse_handler {
            handler(report.buttons, report.dx, report.dy);
        }
    }
}

impl fmt::Debug for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeState")
            .field("keyboard_handler", &self.keyboard_handler.is_some())
            .field("mouse_handler", &self.mouse_handler.is_some())
            .field("mouse", &self.mouse)
            .field("display", &self.display)
            .finish()
    }
}
