//! Hex color parsing and the derived colors used by the page backdrop.

use std::fmt;

/// Amount added to each channel of the background color to produce the
/// second backdrop gradient stop.
pub const GRADIENT_LIGHTEN: u8 = 15;

/// Swatches offered by the color picker, in display order.
pub const PRESET_COLORS: [&str; 15] = [
    "#FF4656", "#F94555", "#0F1419", "#1E2328", "#FFFBF5", "#FF6B35",
    "#F7931E", "#FFD23F", "#06FFA5", "#4DABF7", "#9775FA", "#FF8CC8",
    "#495057", "#000000", "#FFFFFF",
];

const HEX_MARKER: char = '#';

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` or `RRGGBB` (case-insensitive).
    ///
    /// Shorthand (`#fff`), alpha (`#RRGGBBAA`) and anything else that is not
    /// exactly six hex digits after the optional marker yields `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix(HEX_MARKER).unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).ok()
        };

        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Encodes as `#RRGGBB` with upper-case digits.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Adds `amount` to every channel, saturating at 255.
    pub fn lighten(&self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_add(amount),
            g: self.g.saturating_add(amount),
            b: self.b.saturating_add(amount),
        }
    }

    /// `rgb(r, g, b)` functional notation, used for gradient stops.
    pub fn css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Space separated channel triple (`"30 35 40"`), the format CSS custom
/// properties carry so they can be wrapped in `rgb(var(--x))`.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

/// Prefixes the hex marker when it is missing. Digits are left untouched,
/// so `"FF4656"` and `"#FF4656"` normalize to the same string.
pub fn normalize_hex(value: &str) -> String {
    if value.starts_with(HEX_MARKER) {
        value.to_string()
    } else {
        format!("{HEX_MARKER}{value}")
    }
}
