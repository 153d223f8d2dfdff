// src/color.rs

//! Defines color-related enums (`NamedColor`, `Color`) and the parser for
//! MECCA color tokens.

use log::trace;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard ANSI named colors (indices 0-15).
/// These are the 8 normal and 8 bright colors. MECCA templates name the
/// bright half with a `light` prefix (`lightred`, `lightblue`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Returns true for the bright half of the table (indices 8-15).
    pub fn is_bright(self) -> bool {
        (self as u8) >= 8
    }

    /// Offset within the basic 8-color block regardless of brightness;
    /// brightness selects the 90/100 SGR block at emission time.
    pub fn base_offset(self) -> u8 {
        (self as u8) & 0x7
    }
}

/// Represents a color value used by the interpreter.
/// Can be a default placeholder, a standard named ANSI color,
/// an indexed color from the 256-color palette, or an RGB true color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Default foreground or background color, resolved by the terminal.
    Default,
    /// A standard named ANSI color (indices 0-15).
    Named(NamedColor),
    /// An indexed color from the 256-color palette.
    Indexed(u8),
    /// An RGB true color, each component 0-255.
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

/// MECCA surface names for the 16 basic colors: the 8 base names plus their
/// `light` variants. Lookup keys are lowercase.
static COLOR_NAMES: Lazy<HashMap<&'static str, NamedColor>> = Lazy::new(|| {
    HashMap::from([
        ("black", NamedColor::Black),
        ("red", NamedColor::Red),
        ("green", NamedColor::Green),
        ("yellow", NamedColor::Yellow),
        ("blue", NamedColor::Blue),
        ("magenta", NamedColor::Magenta),
        ("cyan", NamedColor::Cyan),
        ("white", NamedColor::White),
        ("lightblack", NamedColor::BrightBlack),
        ("lightred", NamedColor::BrightRed),
        ("lightgreen", NamedColor::BrightGreen),
        ("lightyellow", NamedColor::BrightYellow),
        ("lightblue", NamedColor::BrightBlue),
        ("lightmagenta", NamedColor::BrightMagenta),
        ("lightcyan", NamedColor::BrightCyan),
        ("lightwhite", NamedColor::BrightWhite),
    ])
});

/// Parses a MECCA color field into a `Color`.
///
/// Three spellings are recognized:
/// 1. A color name from the 16-name table, matched case-insensitively
///    (`red`, `lightblue`, ...).
/// 2. `#` followed by exactly six hex digits: an RGB true color
///    (`#FF0000`).
/// 3. `#` followed by 1-3 decimal digits: a 256-palette index (`#202`).
///
/// Returns `None` if the field is not a color token at all, so the
/// dispatcher can fall through to the other token kinds.
pub fn parse_color(field: &str) -> Option<Color> {
    let lower = field.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix('#') {
        if rest.len() == 6 && rest.chars().all(|c| c.is_ascii_hexdigit()) {
            let r = u8::from_str_radix(&rest[0..2], 16).ok()?;
            let g = u8::from_str_radix(&rest[2..4], 16).ok()?;
            let b = u8::from_str_radix(&rest[4..6], 16).ok()?;
            trace!("parsed true color token {:?} -> ({},{},{})", field, r, g, b);
            return Some(Color::Rgb(r, g, b));
        }
        if !rest.is_empty() && rest.len() <= 3 && rest.chars().all(|c| c.is_ascii_digit()) {
            let idx: u16 = rest.parse().ok()?;
            if idx <= 255 {
                return Some(Color::Indexed(idx as u8));
            }
        }
        return None;
    }
    COLOR_NAMES.get(lower.as_str()).map(|&n| Color::Named(n))
}

/// Returns true if the field would parse as a color token. Used by the
/// dispatcher to decide whether a bare field sets the foreground.
pub fn is_color_token(field: &str) -> bool {
    parse_color(field).is_some()
}
