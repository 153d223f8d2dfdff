// src/scanner.rs

//! Template scanner.
//! Walks template text and splits it into literal runs and bracketed token
//! spans, handling the `[[` escape and unterminated-bracket degradation.
//!
//! The scanner is purely lexical: it preserves exact byte positions and
//! leaves newline handling to the driver, which renders literals
//! line-by-line. The driver owns the cursor through `pos`/`seek`, which is
//! how `[goto]` and `[top]` jumps are realized.

use log::trace;

/// One scanned span of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    /// A run of literal text (may contain newlines). Unterminated brackets
    /// degrade into a literal covering the remainder of the input.
    Literal(&'a str),
    /// A `[[` pair; renders as a single literal `[`.
    EscapedBracket,
    /// The content between `[` and the first following `]`. Token syntax
    /// does not nest.
    Token(&'a str),
}

/// Streaming scanner over one template string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Current byte offset into the template.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to an absolute byte offset; used for label jumps
    /// and `[top]`.
    pub fn seek(&mut self, pos: usize) {
        trace!("scanner seek {} -> {}", self.pos, pos);
        self.pos = pos.min(self.input.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Produces the next span, advancing the cursor past it. Returns
    /// `None` at end of input.
    pub fn next_span(&mut self) -> Option<Span<'a>> {
        if self.at_end() {
            return None;
        }
        let rest = &self.input[self.pos..];
        match rest.find('[') {
            None => {
                // No more tokens; the remainder is literal.
                self.pos = self.input.len();
                Some(Span::Literal(rest))
            }
            Some(0) => {
                if rest.as_bytes().get(1) == Some(&b'[') {
                    self.pos += 2;
                    return Some(Span::EscapedBracket);
                }
                match rest.find(']') {
                    None => {
                        // Unterminated token: render the remainder,
                        // including the `[`, as literal text.
                        self.pos = self.input.len();
                        Some(Span::Literal(rest))
                    }
                    Some(end) => {
                        let content = &rest[1..end];
                        self.pos += end + 1;
                        Some(Span::Token(content))
                    }
                }
            }
            Some(start) => {
                self.pos += start;
                Some(Span::Literal(&rest[..start]))
            }
        }
    }
}
