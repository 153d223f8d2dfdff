// src/style.rs

//! Defines the `Style` value type (`AttrFlags`, foreground/background
//! colors) and its rendering to SGR escape sequences.
//!
//! A `Style` is the interpreter's running text state: the driver holds a
//! current `Style` and replaces it as style tokens are dispatched. Color
//! definitions (`Color`, `NamedColor`) are found in the `crate::color`
//! module.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Control Sequence Introducer prefix shared by all SGR output.
const CSI: &str = "\x1b[";
/// The SGR reset sequence appended after every styled span.
const SGR_RESET: &str = "\x1b[0m";

bitflags! {
    /// Text attribute flags corresponding to ANSI SGR (Select Graphic
    /// Rendition) parameters. Combined with `|`, e.g.
    /// `AttrFlags::BOLD | AttrFlags::UNDERLINE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0; // SGR 1
        const FAINT         = 1 << 1; // SGR 2
        const ITALIC        = 1 << 2; // SGR 3
        const UNDERLINE     = 1 << 3; // SGR 4
        const BLINK         = 1 << 4; // SGR 5
        const REVERSE       = 1 << 5; // SGR 7
        const STRIKETHROUGH = 1 << 6; // SGR 9
    }
}

/// The visual state applied to rendered template text: foreground color,
/// background color, and styling flags.
///
/// `Style` is a small copyable value; the driver holds the current one and
/// the dispatcher replaces it as style tokens apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Styling flags (bold, italic, underline, ...).
    pub flags: AttrFlags,
}

impl Style {
    /// Returns true when no attribute or color is set; the default style
    /// renders text verbatim with no escape sequences at all, so tokenless
    /// templates round-trip byte-for-byte.
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }

    /// Collects the SGR parameters for this style, in attribute order
    /// followed by foreground then background.
    fn sgr_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        if self.flags.contains(AttrFlags::BOLD) {
            params.push("1".to_string());
        }
        if self.flags.contains(AttrFlags::FAINT) {
            params.push("2".to_string());
        }
        if self.flags.contains(AttrFlags::ITALIC) {
            params.push("3".to_string());
        }
        if self.flags.contains(AttrFlags::UNDERLINE) {
            params.push("4".to_string());
        }
        if self.flags.contains(AttrFlags::BLINK) {
            params.push("5".to_string());
        }
        if self.flags.contains(AttrFlags::REVERSE) {
            params.push("7".to_string());
        }
        if self.flags.contains(AttrFlags::STRIKETHROUGH) {
            params.push("9".to_string());
        }
        push_color_params(&mut params, self.fg, false);
        push_color_params(&mut params, self.bg, true);
        params
    }

    /// Renders one line of text in this style.
    ///
    /// When `color_enabled` is false, or the style is the default, the text
    /// is returned unchanged. Otherwise the text is wrapped in an SGR
    /// prefix and a reset suffix. Callers render line-by-line so sequences
    /// never span a newline.
    pub fn render(&self, text: &str, color_enabled: bool) -> String {
        if !color_enabled || self.is_default() {
            return text.to_string();
        }
        let params = self.sgr_params();
        if params.is_empty() {
            return text.to_string();
        }
        format!("{}{}m{}{}", CSI, params.join(";"), text, SGR_RESET)
    }
}

/// Appends the SGR parameters selecting `color` as foreground or
/// background. Named colors use the basic 30-37 / 90-97 blocks (plus 10
/// for backgrounds); indexed and RGB colors use the 38/48 extended forms.
fn push_color_params(params: &mut Vec<String>, color: Color, background: bool) {
    let extended_intro = if background { "48" } else { "38" };
    match color {
        Color::Default => {}
        Color::Named(n) => {
            let block = match (n.is_bright(), background) {
                (false, false) => 30,
                (false, true) => 40,
                (true, false) => 90,
                (true, true) => 100,
            };
            params.push((block + n.base_offset() as u16).to_string());
        }
        Color::Indexed(idx) => {
            params.push(extended_intro.to_string());
            params.push("5".to_string());
            params.push(idx.to_string());
        }
        Color::Rgb(r, g, b) => {
            params.push(extended_intro.to_string());
            params.push("2".to_string());
            params.push(r.to_string());
            params.push(g.to_string());
            params.push(b.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    #[test]
    fn test_default_style_renders_verbatim() {
        let style = Style::default();
        assert_eq!(style.render("hello", true), "hello");
    }

    #[test]
    fn test_color_disabled_strips_styling() {
        let style = Style {
            fg: Color::Named(NamedColor::Red),
            flags: AttrFlags::BOLD,
            ..Style::default()
        };
        assert_eq!(style.render("hello", false), "hello");
    }

    #[test]
    fn test_named_foreground() {
        let style = Style {
            fg: Color::Named(NamedColor::Red),
            ..Style::default()
        };
        assert_eq!(style.render("X", true), "\x1b[31mX\x1b[0m");
    }

    #[test]
    fn test_bright_background_block() {
        let style = Style {
            bg: Color::Named(NamedColor::BrightBlue),
            ..Style::default()
        };
        assert_eq!(style.render("X", true), "\x1b[104mX\x1b[0m");
    }

    #[test]
    fn test_flags_and_colors_combine() {
        let style = Style {
            fg: Color::Named(NamedColor::Green),
            bg: Color::Indexed(202),
            flags: AttrFlags::BOLD | AttrFlags::UNDERLINE,
        };
        assert_eq!(style.render("X", true), "\x1b[1;4;32;48;5;202mX\x1b[0m");
    }

    #[test]
    fn test_true_color() {
        let style = Style {
            fg: Color::Rgb(255, 0, 127),
            ..Style::default()
        };
        assert_eq!(style.render("X", true), "\x1b[38;2;255;0;127mX\x1b[0m");
    }
}
