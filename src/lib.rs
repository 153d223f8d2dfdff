// src/lib.rs

//! An interpreter for the MECCA template language.
//!
//! MECCA (originally designed for Maximus BBS software) is a simple
//! bracket-token markup for terminal-driven interactive text: templates
//! mix literal text with `[token]` directives for colors, text styling,
//! cursor movement, flow control, file chaining, and rudimentary
//! interactive prompts (menus, line reads, more-pagination). It is aimed
//! at non-programmers scripting colored, positioned screens.
//!
//! The interpreter walks a template, renders literal runs through a
//! running style state, and dispatches each bracketed token to its
//! handler. Output is accumulated in a buffer and flushed to the output
//! sink at interactive suspension points, so a remote terminal sees a
//! prompt before being asked to answer it.
//!
//! Basic usage:
//!
//! ```no_run
//! use mecca::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! let out = interpreter.interpret("[bold][red]Hello, World![reset]", &Default::default());
//! print!("{}", out);
//! ```
//!
//! With custom tokens and variables:
//!
//! ```no_run
//! use mecca::{Interpreter, Vars};
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.register_token("user", 0, |_| "John Doe".to_string()).unwrap();
//! let out = interpreter.interpret("Welcome, [user]!", &Vars::new());
//! ```

pub mod ansi;
pub mod args;
pub mod charset;
pub mod color;
pub mod input;
pub mod interp;
pub mod loader;
pub mod registry;
pub mod scanner;
pub mod style;
pub mod terminal;

pub use color::{Color, NamedColor};
pub use input::{InputSource, ReaderSource};
pub use interp::{Interpreter, Vars};
pub use loader::{DirLoader, MemoryLoader, ResourceLoader};
pub use registry::{DuplicateToken, RegisteredToken};
pub use style::{AttrFlags, Style};
pub use terminal::{FixedTerminal, Terminal};
