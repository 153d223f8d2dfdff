// src/args.rs

//! Token argument parsing.
//!
//! Splits a token's inner content into fields on runs of space/tab,
//! honoring double-quoted fields with backslash-escaped quotes, and
//! provides `ArgCursor`, an explicit cursor over the parsed fields. The
//! dispatcher consumes trailing arguments through `take`/`advance` so
//! multi-token brackets process left to right without manual index
//! arithmetic.

/// Splits token content into fields.
///
/// Runs of space/tab separate fields except inside double quotes, where
/// spaces are preserved; `\"` inside a quoted section yields a literal
/// quote; an unterminated quote consumes to the end of the content.
/// Iteration is by `char`, so multi-byte characters are never split.
///
/// `token "hello world" arg2` parses to `["token", "hello world", "arg2"]`.
pub fn split_fields(content: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes {
                    // Closing quote ends the field even mid-word.
                    if !current.is_empty() {
                        fields.push(std::mem::take(&mut current));
                    }
                    in_quotes = false;
                } else {
                    in_quotes = true;
                }
            }
            '\\' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

/// An explicit cursor over a token's parsed fields.
#[derive(Debug)]
pub struct ArgCursor {
    fields: Vec<String>,
    idx: usize,
}

impl ArgCursor {
    pub fn new(fields: Vec<String>) -> Self {
        ArgCursor { fields, idx: 0 }
    }

    /// Returns the next field and advances past it.
    pub fn next(&mut self) -> Option<&str> {
        let field = self.fields.get(self.idx)?;
        self.idx += 1;
        Some(field)
    }

    /// Looks at the next field without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.fields.get(self.idx).map(String::as_str)
    }

    /// Looks `n` fields ahead without consuming (`lookahead(0)` == `peek`).
    pub fn lookahead(&self, n: usize) -> Option<&str> {
        self.fields.get(self.idx + n).map(String::as_str)
    }

    /// Consumes the next field without returning it.
    pub fn advance(&mut self) {
        if self.idx < self.fields.len() {
            self.idx += 1;
        }
    }

    /// Consumes and returns the next `n` fields, or `None` (consuming
    /// nothing) when fewer than `n` remain. This is the arity contract for
    /// registered tokens: short invocations yield no arguments at all.
    pub fn take(&mut self, n: usize) -> Option<&[String]> {
        if self.fields.len() - self.idx < n {
            return None;
        }
        let slice = &self.fields[self.idx..self.idx + n];
        self.idx += n;
        Some(slice)
    }

    /// Consumes everything that remains; `[comment ...]` uses this.
    pub fn skip_rest(&mut self) {
        self.idx = self.fields.len();
    }

    /// Number of unconsumed fields.
    pub fn remaining(&self) -> usize {
        self.fields.len() - self.idx
    }
}
