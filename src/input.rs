// src/input.rs

//! Defines the `InputSource` trait consumed by the interactive tokens
//! (`menuwait`, `readln`, `enter`, `more`).
//!
//! Reads are synchronous and blocking with no timeout; end-of-stream and
//! read errors are both reported as `None`, which the interpreter treats
//! as "no input provided". A disconnect mid-prompt degrades the render,
//! it never aborts it.

use log::debug;
use std::io::Read;

/// Blocking input for interactive tokens.
pub trait InputSource {
    /// Reads a single byte. `None` on end of stream or error.
    fn read_byte(&mut self) -> Option<u8>;

    /// Reads one line, without its terminator. `None` on end of stream or
    /// error before any byte arrives.
    fn read_line(&mut self) -> Option<String>;
}

/// Adapts any `Read` into an `InputSource`.
///
/// Lines are assembled byte-at-a-time so a single source can serve
/// interleaved `menuwait` (byte) and `readln` (line) reads without
/// buffering ahead. A one-byte pushback slot lets CRLF terminators be
/// consumed as one unit.
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        ReaderSource {
            inner,
            pushback: None,
        }
    }
}

impl<R: Read> InputSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.pushback.take() {
            return Some(byte);
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) => {
                debug!("input read failed, treating as end of stream: {}", e);
                None
            }
        }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = Vec::new();
        loop {
            match self.read_byte() {
                Some(b'\n') => break,
                Some(b'\r') => {
                    // CR terminates too; swallow the LF of a CRLF pair but
                    // hold anything else for the next read.
                    match self.read_byte() {
                        Some(b'\n') | None => {}
                        Some(other) => self.pushback = Some(other),
                    }
                    break;
                }
                Some(b) => line.push(b),
                None => {
                    if line.is_empty() {
                        return None;
                    }
                    break;
                }
            }
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_byte() {
        let mut source = ReaderSource::new(Cursor::new(b"ab".to_vec()));
        assert_eq!(source.read_byte(), Some(b'a'));
        assert_eq!(source.read_byte(), Some(b'b'));
        assert_eq!(source.read_byte(), None);
    }

    #[test]
    fn test_read_line_strips_terminator() {
        let mut source = ReaderSource::new(Cursor::new(b"hello\nworld\n".to_vec()));
        assert_eq!(source.read_line(), Some("hello".to_string()));
        assert_eq!(source.read_line(), Some("world".to_string()));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn test_read_line_consumes_crlf_as_one_terminator() {
        let mut source = ReaderSource::new(Cursor::new(b"hello\r\nx".to_vec()));
        assert_eq!(source.read_line(), Some("hello".to_string()));
        assert_eq!(source.read_byte(), Some(b'x'));
    }

    #[test]
    fn test_read_line_bare_cr_holds_next_byte() {
        let mut source = ReaderSource::new(Cursor::new(b"a\rb".to_vec()));
        assert_eq!(source.read_line(), Some("a".to_string()));
        assert_eq!(source.read_byte(), Some(b'b'));
    }

    #[test]
    fn test_read_line_at_eof_without_terminator() {
        let mut source = ReaderSource::new(Cursor::new(b"tail".to_vec()));
        assert_eq!(source.read_line(), Some("tail".to_string()));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn test_empty_source_is_no_input() {
        let mut source = ReaderSource::new(Cursor::new(Vec::new()));
        assert_eq!(source.read_byte(), None);
        assert_eq!(source.read_line(), None);
    }
}
