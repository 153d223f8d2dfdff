// src/ansi.rs

//! Builders for the ANSI control sequences the token dispatcher emits:
//! cursor movement, cursor position, screen/line erasure, and cursor
//! save/restore.
//!
//! These are pure string constructors; the dispatcher appends their output
//! to the render buffer like any other text.

/// Control Sequence Introducer.
const CSI: &str = "\x1b[";

/// Saves the cursor position (DECSC).
pub const SAVE_CURSOR: &str = "\x1b7";
/// Restores the saved cursor position (DECRC).
pub const RESTORE_CURSOR: &str = "\x1b8";

/// CSI n A: cursor up `n` lines.
pub fn cursor_up(n: u16) -> String {
    format!("{}{}A", CSI, n)
}

/// CSI n B: cursor down `n` lines.
pub fn cursor_down(n: u16) -> String {
    format!("{}{}B", CSI, n)
}

/// CSI n C: cursor forward `n` columns.
pub fn cursor_forward(n: u16) -> String {
    format!("{}{}C", CSI, n)
}

/// CSI n D: cursor backward `n` columns.
pub fn cursor_backward(n: u16) -> String {
    format!("{}{}D", CSI, n)
}

/// CSI n E: cursor to start of line, `n` lines down.
pub fn cursor_next_line(n: u16) -> String {
    format!("{}{}E", CSI, n)
}

/// CSI row;col H: absolute cursor position, 1-indexed.
pub fn cursor_position(row: u16, col: u16) -> String {
    format!("{}{};{}H", CSI, row, col)
}

/// CSI n J: erase in display. 0 erases from the cursor to the end of the
/// screen, 2 erases the whole screen.
pub fn erase_display(mode: u16) -> String {
    format!("{}{}J", CSI, mode)
}

/// CSI n K: erase in line. 0 erases from the cursor to the end of line.
pub fn erase_line(mode: u16) -> String {
    format!("{}{}K", CSI, mode)
}

/// Clear screen and home the cursor; the `[cls]` expansion.
pub fn clear_screen() -> String {
    format!("{}{}", erase_display(2), cursor_position(1, 1))
}
