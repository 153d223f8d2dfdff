// src/charset.rs

//! Charset decoding for the `[ansiconvert]` token.
//!
//! The only charset shipped is CP437, the DOS code page most BBS-era ANSI
//! art was drawn in. Decoding goes through a 256-entry lookup table; the
//! low half is ASCII-identity (control bytes pass through so cursor
//! sequences embedded in art files survive), the high half is the standard
//! CP437 graphics/letter block.

use std::error::Error;
use std::fmt;

use log::debug;

/// Error returned by [`decode`] for a charset name it does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedCharset(pub String);

impl fmt::Display for UnsupportedCharset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported charset {}", self.0)
    }
}

impl Error for UnsupportedCharset {}

/// CP437 upper half (0x80..=0xFF) to Unicode.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Decodes a CP437 byte to its Unicode character.
fn cp437_char(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        CP437_HIGH[(byte - 0x80) as usize]
    }
}

/// Decodes `bytes` from the named charset into a UTF-8 string.
///
/// Charset names are matched case-insensitively; only `cp437` is
/// supported.
pub fn decode(bytes: &[u8], charset: &str) -> Result<String, UnsupportedCharset> {
    match charset.to_ascii_lowercase().as_str() {
        "cp437" => {
            debug!("decoding {} bytes from cp437", bytes.len());
            Ok(bytes.iter().map(|&b| cp437_char(b)).collect())
        }
        other => Err(UnsupportedCharset(other.to_string())),
    }
}
