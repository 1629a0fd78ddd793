use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use tracing::trace;

use crate::bridge::state::SharedState;

/// Device units per terminal column.
pub const MOUSE_X_SCALE: i32 = 4;
/// Device units per terminal row.
pub const MOUSE_Y_SCALE: i32 = 8;

pub const BUTTON_RIGHT: u8 = 0x01;
pub const BUTTON_LEFT: u8 = 0x02;

/// Relative movement report for the emulated serial mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: u8,
    pub dx: i8,
    pub dy: i8,
}

/// Last absolute pointer position and held buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: u16,
    pub y: u16,
    pub left: bool,
    pub right: bool,
}

impl MouseState {
    /// Fold `event` into the state and return the movement since the last one.
    pub fn update(&mut self, event: &MouseEvent) -> MouseReport {
        match event.kind {
            MouseEventKind::Down(button) | MouseEventKind::Drag(button) => {
                self.set_button(button, true)
            }
            MouseEventKind::Up(button) => self.set_button(button, false),
            _ => {}
        }

        let report = MouseReport {
            buttons: self.buttons(),
            dx: clamp_i8((i32::from(event.column) - i32::from(self.x)) * MOUSE_X_SCALE),
            dy: clamp_i8((i32::from(event.row) - i32::from(self.y)) * MOUSE_Y_SCALE),
        };

        self.x = event.column;
        self.y = event.row;
        report
    }

    pub fn buttons(&self) -> u8 {
        let mut buttons = 0;
        if self.right {
            buttons |= BUTTON_RIGHT;
        }
        if self.left {
            buttons |= BUTTON_LEFT;
        }
        buttons
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left = down,
            MouseButton::Right => self.right = down,
            MouseButton::Middle => {}
        }
    }
}

/// Saturate to the signed 8-bit range.
pub fn clamp_i8(value: i32) -> i8 {
    value.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

/// Update the pointer state and notify the mouse handler, if any.
///
/// The position is stored even without a handler so the first report after
/// one attaches is relative to where the pointer really was.
pub async fn dispatch_mouse(shared: &SharedState, event: &MouseEvent) -> MouseReport {
    let mut state = shared.lock().await;
    let report = state.mouse.update(event);
    trace!("Mouse report {:?}", report);
    state.emit_mouse(report);
    report
}
