// src/interp/menu.rs

//! Menu option capture and selection state.
//!
//! `[option X]` begins capturing the plain text that follows (literal runs
//! and token substitutions alike) into a buffer; the capture is committed
//! to the option table by `[reset]` or by the start of the next
//! `[option]`. `[menuwait]` matches one input character against the table
//! case-insensitively and records the selection.

use log::trace;
use std::collections::HashMap;

/// State for the menu currently being assembled and the last selection.
#[derive(Debug, Default)]
pub struct MenuState {
    /// option id (one lowercase alphanumeric char) -> captured option text.
    pub options: HashMap<String, String>,
    /// The selected option id from the most recent `[menuwait]`; empty
    /// when nothing matched or no input arrived.
    pub selection: String,
    /// Whether option text is currently being captured.
    pub capturing: bool,
    /// The id whose text is being captured.
    pub capture_id: String,
    /// Accumulated plain text for the capture in progress.
    pub capture_buf: String,
}

impl MenuState {
    /// Clears the option table for a fresh `[menu]`.
    pub fn begin_menu(&mut self) {
        self.options.clear();
    }

    /// Starts capturing text for `id`, committing any capture already in
    /// progress first.
    pub fn begin_option(&mut self, id: String) {
        if self.capturing && !self.capture_id.is_empty() {
            let text = std::mem::take(&mut self.capture_buf);
            self.options
                .insert(std::mem::take(&mut self.capture_id), text.trim().to_string());
        }
        self.capturing = true;
        self.capture_id = id;
        self.capture_buf.clear();
    }

    /// Commits the capture in progress, if any. Called by `[reset]` and at
    /// the end of a file.
    pub fn finish_capture(&mut self) {
        if self.capturing && !self.capture_id.is_empty() {
            let text = std::mem::take(&mut self.capture_buf);
            trace!("captured option {:?} -> {:?}", self.capture_id, text.trim());
            self.options
                .insert(std::mem::take(&mut self.capture_id), text.trim().to_string());
        }
        self.capturing = false;
        self.capture_id.clear();
        self.capture_buf.clear();
    }

    /// Appends plain text to the capture in progress; no-op when not
    /// capturing.
    pub fn capture(&mut self, text: &str) {
        if self.capturing {
            self.capture_buf.push_str(text);
        }
    }

    /// Records the `[menuwait]` input: a case-insensitive match against
    /// the captured option ids, or an empty selection.
    pub fn select(&mut self, input: Option<u8>) {
        self.selection = match input {
            Some(byte) => {
                let key = (byte as char).to_ascii_lowercase().to_string();
                if self.options.contains_key(&key) {
                    key
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };
    }

    /// Resets everything for a new top-level interpretation.
    pub fn reset(&mut self) {
        self.options.clear();
        self.selection.clear();
        self.capturing = false;
        self.capture_id.clear();
        self.capture_buf.clear();
    }
}
