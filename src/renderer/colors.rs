use crossterm::style::Color;

/// The sixteen CGA text-mode colors, in palette index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CgaColor {
    #[default]
    Black,
    Navy,
    Green,
    Teal,
    Maroon,
    Purple,
    Olive,
    Silver,
    Gray,
    Blue,
    Lime,
    Aqua,
    Red,
    Fuchsia,
    Yellow,
    White,
}

pub const CGA_PALETTE: [CgaColor; 16] = [
    CgaColor::Black,
    CgaColor::Navy,
    CgaColor::Green,
    CgaColor::Teal,
    CgaColor::Maroon,
    CgaColor::Purple,
    CgaColor::Olive,
    CgaColor::Silver,
    CgaColor::Gray,
    CgaColor::Blue,
    CgaColor::Lime,
    CgaColor::Aqua,
    CgaColor::Red,
    CgaColor::Fuchsia,
    CgaColor::Yellow,
    CgaColor::White,
];

impl CgaColor {
    /// Palette lookup. Only the low nibble of `index` is used.
    pub fn from_index(index: u8) -> Self {
        CGA_PALETTE[(index & 0xF) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Exact palette RGB values.
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            CgaColor::Black => [0x00, 0x00, 0x00],
            CgaColor::Navy => [0x00, 0x00, 0x80],
            CgaColor::Green => [0x00, 0x80, 0x00],
            CgaColor::Teal => [0x00, 0x80, 0x80],
            CgaColor::Maroon => [0x80, 0x00, 0x00],
            CgaColor::Purple => [0x80, 0x00, 0x80],
            CgaColor::Olive => [0x80, 0x80, 0x00],
            CgaColor::Silver => [0xC0, 0xC0, 0xC0],
            CgaColor::Gray => [0x80, 0x80, 0x80],
            CgaColor::Blue => [0x00, 0x00, 0xFF],
            CgaColor::Lime => [0x00, 0xFF, 0x00],
            CgaColor::Aqua => [0x00, 0xFF, 0xFF],
            CgaColor::Red => [0xFF, 0x00, 0x00],
            CgaColor::Fuchsia => [0xFF, 0x00, 0xFF],
            CgaColor::Yellow => [0xFF, 0xFF, 0x00],
            CgaColor::White => [0xFF, 0xFF, 0xFF],
        }
    }

    /// Nearest of the terminal's 16 named colors.
    pub fn to_terminal(self) -> Color {
        match self {
            CgaColor::Black => Color::Black,
            CgaColor::Navy => Color::DarkBlue,
            CgaColor::Green => Color::DarkGreen,
            CgaColor::Teal => Color::DarkCyan,
            CgaColor::Maroon => Color::DarkRed,
            CgaColor::Purple => Color::DarkMagenta,
            CgaColor::Olive => Color::DarkYellow,
            CgaColor::Silver => Color::Grey,
            CgaColor::Gray => Color::DarkGrey,
            CgaColor::Blue => Color::Blue,
            CgaColor::Lime => Color::Green,
            CgaColor::Aqua => Color::Cyan,
            CgaColor::Red => Color::Red,
            CgaColor::Fuchsia => Color::Magenta,
            CgaColor::Yellow => Color::Yellow,
            CgaColor::White => Color::White,
        }
    }

    /// Terminal color to paint with: the exact RGB value on 24-bit
    /// terminals, the nearest named color otherwise.
    pub fn terminal_color(self, true_color: bool) -> Color {
        if true_color {
            let [r, g, b] = self.to_rgb();
            Color::Rgb { r, g, b }
        } else {
            self.to_terminal()
        }
    }
}

/// Resolved appearance of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: CgaColor,
    pub bg: CgaColor,
    pub blink: bool,
}

impl Style {
    pub fn with_background(bg: CgaColor) -> Self {
        Self {
            bg,
            ..Self::default()
        }
    }
}

const ATTR_BLINK: u8 = 0x80;

/// Decode a text-mode attribute byte.
///
/// Bit 7 doubles as blink flag and high-intensity background bit: while the
/// blink phase is off a blinking cell shows the bright variant of its
/// background, while it is on the cell is rendered blinking on the dim one.
pub fn style_for(attr: u8, blink: bool) -> Style {
    let blink_attr = attr & ATTR_BLINK != 0;
    let mut bg_index = (attr >> 4) & 0x7;

    if blink_attr && !blink {
        bg_index += 8;
    }

    Style {
        fg: CgaColor::from_index(attr & 0xF),
        bg: CgaColor::from_index(bg_index),
        blink: blink && blink_attr,
    }
}
