//! Terminal key to PC/XT scancode translation.
//!
//! Terminals report characters, not physical keys, so shifted symbols map to
//! the key that produces them (`!` and `1` are both [`Scancode::Key1`]).
//!
//! Unsupported: the terminal never reports modifier or lock keys on their
//! own, so [`Scancode::Alt`], [`Scancode::LShift`], [`Scancode::RShift`],
//! [`Scancode::CapsLock`], [`Scancode::NumLock`] and [`Scancode::ScrollLock`]
//! are never produced by [`translate`]. Control is only available through the
//! `Ctrl+]` chord.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// XT scan code set 1 make codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scancode {
    Invalid = 0x00,
    Escape = 0x01,
    Key1 = 0x02,
    Key2 = 0x03,
    Key3 = 0x04,
    Key4 = 0x05,
    Key5 = 0x06,
    Key6 = 0x07,
    Key7 = 0x08,
    Key8 = 0x09,
    Key9 = 0x0A,
    Key0 = 0x0B,
    Minus = 0x0C,
    Equal = 0x0D,
    Backspace = 0x0E,
    Tab = 0x0F,
    Q = 0x10,
    W = 0x11,
    E = 0x12,
    R = 0x13,
    T = 0x14,
    Y = 0x15,
    U = 0x16,
    I = 0x17,
    O = 0x18,
    P = 0x19,
    LBracket = 0x1A,
    RBracket = 0x1B,
    Enter = 0x1C,
    Control = 0x1D,
    A = 0x1E,
    S = 0x1F,
    D = 0x20,
    F = 0x21,
    G = 0x22,
    H = 0x23,
    J = 0x24,
    K = 0x25,
    L = 0x26,
    Semicolon = 0x27,
    Quote = 0x28,
    Backquote = 0x29,
    LShift = 0x2A,
    Backslash = 0x2B,
    Z = 0x2C,
    X = 0x2D,
    C = 0x2E,
    V = 0x2F,
    B = 0x30,
    N = 0x31,
    M = 0x32,
    Comma = 0x33,
    Period = 0x34,
    Slash = 0x35,
    RShift = 0x36,
    Print = 0x37,
    Alt = 0x38,
    Space = 0x39,
    CapsLock = 0x3A,
    F1 = 0x3B,
    F2 = 0x3C,
    F3 = 0x3D,
    F4 = 0x3E,
    F5 = 0x3F,
    F6 = 0x40,
    F7 = 0x41,
    F8 = 0x42,
    F9 = 0x43,
    F10 = 0x44,
    NumLock = 0x45,
    ScrollLock = 0x46,
    KpHome = 0x47,
    KpUp = 0x48,
    KpPageUp = 0x49,
    KpLeft = 0x4B,
    KpRight = 0x4D,
    KpEnd = 0x4F,
    KpDown = 0x50,
    KpPageDown = 0x51,
    KpInsert = 0x52,
    KpDelete = 0x53,
}

/// Bit set on a make code to form the matching break code.
pub const KEY_UP_MASK: u8 = 0x80;

impl Scancode {
    pub fn is_valid(self) -> bool {
        self != Scancode::Invalid
    }

    pub fn make_code(self) -> u8 {
        self as u8
    }
}

use Scancode::*;

/// Indexed by `ascii - 0x20`; the final slot is DEL.
const ASCII_TO_SCANCODE: [Scancode; 96] = [
    Space, Key1, Quote, Key3, Key4, Key5, Key7, Quote, // 0x20
    Key9, Key0, Key8, Equal, Comma, Minus, Period, Slash, // 0x28
    Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, // 0x30
    Key8, Key9, Semicolon, Semicolon, Comma, Equal, Period, Slash, // 0x38
    Key2, A, B, C, D, E, F, G, // 0x40
    H, I, J, K, L, M, N, O, // 0x48
    P, Q, R, S, T, U, V, W, // 0x50
    X, Y, Z, LBracket, Backslash, RBracket, Key6, Minus, // 0x58
    Backquote, A, B, C, D, E, F, G, // 0x60
    H, I, J, K, L, M, N, O, // 0x68
    P, Q, R, S, T, U, V, W, // 0x70
    X, Y, Z, LBracket, Backslash, RBracket, Backquote, Invalid, // 0x78
];

/// Map a terminal key press to its scancode, or [`Scancode::Invalid`].
pub fn translate(event: &KeyEvent) -> Scancode {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

    match event.code {
        KeyCode::Esc => Escape,
        KeyCode::Enter => Enter,
        KeyCode::Backspace => Backspace,
        KeyCode::Tab => Tab,
        KeyCode::Char(']') if ctrl => Control,
        KeyCode::Char(_) if ctrl => Invalid,
        KeyCode::Up => KpUp,
        KeyCode::Down => KpDown,
        KeyCode::Left => KpLeft,
        KeyCode::Right => KpRight,
        KeyCode::PrintScreen => Print,
        KeyCode::Delete => KpDelete,
        KeyCode::Insert => KpInsert,
        KeyCode::End => KpEnd,
        KeyCode::PageUp => KpPageUp,
        KeyCode::PageDown => KpPageDown,
        KeyCode::Home => KpHome,
        KeyCode::F(n) => function_key(n),
        KeyCode::Char(c) => ascii_scancode(c),
        _ => Invalid,
    }
}

fn function_key(n: u8) -> Scancode {
    match n {
        1 => F1,
        2 => F2,
        3 => F3,
        4 => F4,
        5 => F5,
        6 => F6,
        7 => F7,
        8 => F8,
        9 => F9,
        10 => F10,
        _ => Invalid,
    }
}

fn ascii_scancode(c: char) -> Scancode {
    match u32::from(c) {
        code @ 0x20..=0x7E => ASCII_TO_SCANCODE[(code - 0x20) as usize],
        _ => Invalid,
    }
}
