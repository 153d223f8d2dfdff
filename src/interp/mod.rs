// src/interp/mod.rs

//! The MECCA interpreter: public API, per-instance state, and the
//! driver/dispatcher split.
//!
//! One `Interpreter` owns everything a render needs (resource loader,
//! output sink, optional input source, terminal capabilities, custom token
//! registry) plus the state that outlives a single template: the
//! pagination toggle and the questionnaire log. All methods take
//! `&mut self`; callers needing concurrency use independent instances.

mod dispatch;
mod driver;
mod menu;

#[cfg(test)]
mod tests;

pub(crate) use dispatch::Signal;

use log::{debug, warn};
use std::collections::HashMap;
use std::io::Write;

use crate::input::{InputSource, ReaderSource};
use crate::loader::{DirLoader, ResourceLoader};
use crate::registry::{DuplicateToken, RegisteredToken, TokenRegistry};
use crate::style::Style;
use crate::terminal::{effective_height, FixedTerminal, Terminal};
use anyhow::Context;
use menu::MenuState;

/// Variables supplied per interpretation call. Keys are matched
/// case-sensitively and take precedence over registered custom tokens.
pub type Vars = HashMap<String, String>;

/// Maximum `[link]` nesting depth; the ninth nested link renders an inline
/// error instead.
pub(crate) const MAX_LINK_DEPTH: usize = 8;

/// A saved caller context for one `[link]` in flight.
#[derive(Debug, Clone)]
pub(crate) struct LinkFrame {
    /// Byte position just past the `[link ...]` token in the caller.
    pub position: usize,
    /// The caller's style at the link point.
    pub style: Style,
    /// The caller's style stack at the link point.
    pub style_stack: Vec<Style>,
}

/// Automatic `[more]` pagination state.
#[derive(Debug, Default)]
pub(crate) struct Pagination {
    /// Toggled by `[moreon]`/`[moreoff]`; persists across calls.
    pub enabled: bool,
    /// Lines emitted so far in this interpretation.
    pub current_line: usize,
    /// Terminal height in lines, resolved at the start of each call.
    pub height: usize,
    /// Line at which the last prompt was shown, to avoid re-prompting.
    pub last_prompted: usize,
}

impl Pagination {
    /// True when an automatic prompt is due.
    pub fn due(&self) -> bool {
        self.enabled
            && self.height > 0
            && self.current_line >= self.height.saturating_sub(2)
            && self.current_line > self.last_prompted
    }
}

/// A MECCA template interpreter.
///
/// ```no_run
/// use mecca::Interpreter;
///
/// let mut interpreter = Interpreter::new();
/// let out = interpreter.interpret("[bold][red]Hello[reset]", &Default::default());
/// print!("{}", out);
/// ```
pub struct Interpreter {
    pub(crate) loader: Box<dyn ResourceLoader>,
    pub(crate) output: Box<dyn Write>,
    pub(crate) input: Option<Box<dyn InputSource>>,
    pub(crate) terminal: Box<dyn Terminal>,
    pub(crate) registry: TokenRegistry,

    pub(crate) menu: MenuState,
    pub(crate) readln_response: String,
    pub(crate) questionnaire: Vec<String>,
    pub(crate) answers_optional: bool,

    pub(crate) exit_requested: bool,
    pub(crate) call_stack: Vec<LinkFrame>,
    pub(crate) pagination: Pagination,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with defaults: templates load relative to
    /// the current directory, output goes to stdout, no input source is
    /// configured, and the terminal is assumed to support color at 24
    /// lines.
    pub fn new() -> Self {
        Interpreter {
            loader: Box::new(DirLoader::default()),
            output: Box::new(std::io::stdout()),
            input: None,
            terminal: Box::new(FixedTerminal::default()),
            registry: TokenRegistry::new(),
            menu: MenuState::default(),
            readln_response: String::new(),
            questionnaire: Vec::new(),
            answers_optional: false,
            exit_requested: false,
            call_stack: Vec::new(),
            pagination: Pagination::default(),
        }
    }

    /// Resolves template files relative to `root`.
    pub fn with_root(mut self, root: impl Into<std::path::PathBuf>) -> Self {
        self.loader = Box::new(DirLoader::new(root));
        self
    }

    /// Replaces the resource loader wholesale.
    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Sends rendered output to `writer` instead of stdout.
    pub fn with_writer(mut self, writer: impl Write + 'static) -> Self {
        self.output = Box::new(writer);
        self
    }

    /// Supplies the blocking input source used by the interactive tokens.
    /// Without one, `[menuwait]`, `[readln]`, `[enter]` and `[more]`
    /// render an inline error instead of blocking.
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Convenience for [`Self::with_input`] wrapping any `Read`.
    pub fn with_reader(self, reader: impl std::io::Read + 'static) -> Self {
        self.with_input(ReaderSource::new(reader))
    }

    /// Describes the terminal being rendered for.
    pub fn with_terminal(mut self, terminal: impl Terminal + 'static) -> Self {
        self.terminal = Box::new(terminal);
        self
    }

    /// Registers a custom token. The name is matched case-insensitively in
    /// templates; variables passed at call time override it. Registering a
    /// name twice is an error.
    pub fn register_token(
        &mut self,
        name: &str,
        arity: usize,
        func: impl Fn(&[String]) -> String + 'static,
    ) -> Result<(), DuplicateToken> {
        self.registry.register(name, arity, func)
    }

    /// Looks up a registered token by name (case-insensitive).
    pub fn token(&self, name: &str) -> Option<&RegisteredToken> {
        self.registry.get(name)
    }

    /// The option id selected by the most recent `[menuwait]`, or empty.
    pub fn menu_selection(&self) -> &str {
        &self.menu.selection
    }

    /// The most recent `[readln]` response, or empty.
    pub fn readln_response(&self) -> &str {
        &self.readln_response
    }

    /// All questionnaire records collected so far, in order. The log
    /// persists across interpretation calls.
    pub fn questionnaire(&self) -> &[String] {
        &self.questionnaire
    }

    /// Clears the questionnaire log.
    pub fn clear_questionnaire(&mut self) {
        self.questionnaire.clear();
    }

    /// Interprets a template string, returning the rendered output.
    ///
    /// When interactive tokens flush mid-render, the flushed portion has
    /// already been written to the sink and the return value holds the
    /// unflushed remainder; non-interactive templates come back whole.
    pub fn interpret(&mut self, template: &str, vars: &Vars) -> String {
        self.reset_call_state();
        driver::run(self, template, vars, &[])
    }

    /// Interprets a template string and streams the result through the
    /// output sink. Required for interactive use, where prompts must reach
    /// the terminal before the render finishes.
    pub fn render(&mut self, template: &str, vars: &Vars) -> std::io::Result<()> {
        let out = self.interpret(template, vars);
        self.output.write_all(out.as_bytes())?;
        self.output.flush()
    }

    /// Loads a template through the resource loader and interprets it.
    /// Unlike content errors, a missing file here is reported to the
    /// caller: it asked for that file by name.
    pub fn exec_template(&mut self, name: &str, vars: &Vars) -> anyhow::Result<String> {
        let bytes = self
            .loader
            .read(name)
            .with_context(|| format!("failed to load template {name:?}"))?;
        let template = String::from_utf8_lossy(&bytes).into_owned();
        debug!("executing template {:?} ({} bytes)", name, template.len());
        self.reset_call_state();
        Ok(driver::run(self, &template, vars, &[name.to_string()]))
    }

    /// Loads a template and streams its render through the output sink.
    pub fn render_template(&mut self, name: &str, vars: &Vars) -> anyhow::Result<()> {
        let out = self.exec_template(name, vars)?;
        self.output
            .write_all(out.as_bytes())
            .and_then(|_| self.output.flush())
            .context("failed to write rendered template to sink")?;
        Ok(())
    }

    /// Resets the state scoped to one top-level interpretation call. The
    /// questionnaire log, pagination toggle, and answer-optional flag
    /// deliberately survive.
    fn reset_call_state(&mut self) {
        self.menu.reset();
        self.readln_response.clear();
        self.exit_requested = false;
        self.call_stack.clear();
        self.pagination.current_line = 0;
        self.pagination.last_prompted = 0;
        self.pagination.height = effective_height(self.terminal.height()) as usize;
    }

    pub(crate) fn color_enabled(&self) -> bool {
        self.terminal.has_color()
    }

    /// Writes the accumulated buffer to the sink as one write and clears
    /// it. Sink failures degrade the render, they never abort it.
    pub(crate) fn flush_buffer(&mut self, out: &mut String) {
        if out.is_empty() {
            return;
        }
        if let Err(e) = self
            .output
            .write_all(out.as_bytes())
            .and_then(|_| self.output.flush())
        {
            warn!("output sink write failed: {}", e);
        }
        out.clear();
    }

    /// Writes prompt text straight to the sink, bypassing the buffer, so
    /// it is visible before a blocking read.
    pub(crate) fn write_direct(&mut self, text: &str) {
        if let Err(e) = self
            .output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
        {
            warn!("output sink write failed: {}", e);
        }
    }

    /// Reads one byte from the input source; `None` when no source is
    /// configured or the source is exhausted.
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        self.input.as_mut().and_then(|i| i.read_byte())
    }

    /// Reads one line from the input source.
    pub(crate) fn read_line(&mut self) -> Option<String> {
        self.input.as_mut().and_then(|i| i.read_line())
    }
}
