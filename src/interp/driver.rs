// src/interp/driver.rs

//! The control-flow driver: walks scanner output position-by-position,
//! renders literal runs through the current style, dispatches token spans,
//! and reacts to the signals they raise (label jumps, top-of-file
//! restarts, link/display file switching, quit/exit propagation, and the
//! more-prompt pagination).
//!
//! One `run` invocation interprets one file. Nested files (`include`,
//! `link`, `display`, `on exit`) recurse through `render_chained`, each
//! with its own `RenderState` and label table; only `exit`, the link
//! stack, and the menu/questionnaire state cross file boundaries.

use log::{debug, trace};
use std::collections::HashMap;

use super::{Interpreter, LinkFrame, Signal, Vars, MAX_LINK_DEPTH};
use crate::args::split_fields;
use crate::scanner::{Scanner, Span};
use crate::style::Style;

/// Per-file rendering state, owned by one `run` invocation.
#[derive(Debug, Default)]
pub(crate) struct RenderState {
    /// The style applied to literal text and token substitutions.
    pub style: Style,
    /// `[save]`/`[load]` stack.
    pub style_stack: Vec<Style>,
    /// `[color]`/`[nocolor]` condition stack; any true entry suppresses
    /// output while position and line accounting continue.
    pub cond_stack: Vec<bool>,
    /// File registered by `[on exit]`, rendered when this file finishes.
    pub on_exit: Option<String>,
}

impl RenderState {
    pub fn suppressing(&self) -> bool {
        self.cond_stack.iter().any(|&skip| skip)
    }
}

/// Builds the label table: lowercase label name -> byte position just past
/// the defining token's closing bracket. Labels are collected over the
/// whole template regardless of any conditional state, so a label inside a
/// suppressed block is still a valid jump target.
pub(crate) fn scan_labels(template: &str) -> HashMap<String, usize> {
    let mut labels = HashMap::new();
    let mut scanner = Scanner::new(template);
    while let Some(span) = scanner.next_span() {
        if let Span::Token(content) = span {
            let fields = split_fields(content);
            if let Some(first) = fields.first() {
                let lower = first.to_ascii_lowercase();
                if let Some(name) = lower.strip_prefix('/') {
                    if !name.is_empty() {
                        labels.insert(name.to_string(), scanner.pos());
                    }
                } else if lower == "label" && fields.len() > 1 {
                    labels.insert(fields[1].to_ascii_lowercase(), scanner.pos());
                }
            }
        }
    }
    trace!("label table: {:?}", labels);
    labels
}

/// True when the bracket group contains a suspension point that requires
/// flushing accumulated output before the dispatcher blocks.
fn wants_preflush(interp: &Interpreter, fields: &[String]) -> bool {
    fields.iter().any(|f| {
        let lower = f.to_ascii_lowercase();
        match lower.as_str() {
            "pause" => true,
            "menuwait" | "readln" | "enter" | "more" => interp.input.is_some(),
            _ => false,
        }
    })
}

/// Interprets one template, appending nothing to the sink except at flush
/// points; returns the unflushed output.
pub(crate) fn run(
    interp: &mut Interpreter,
    template: &str,
    vars: &Vars,
    includes: &[String],
) -> String {
    let mut state = RenderState::default();
    let mut labels = scan_labels(template);
    let mut scanner = Scanner::new(template);
    let mut out = String::new();

    loop {
        if interp.exit_requested {
            break;
        }
        let span = match scanner.next_span() {
            Some(span) => span,
            None => break,
        };
        match span {
            Span::Literal(text) => {
                if emit_literal(interp, &state, text, &mut out) {
                    break;
                }
            }
            Span::EscapedBracket => {
                if !state.suppressing() {
                    out.push_str(&state.style.render("[", interp.color_enabled()));
                }
                interp.menu.capture("[");
            }
            Span::Token(content) => {
                let token_end = scanner.pos();
                let fields = split_fields(content);
                if wants_preflush(interp, &fields) {
                    interp.flush_buffer(&mut out);
                }
                let outcome = interp.dispatch_token(fields, &mut state, vars, includes);

                if outcome.skip_line {
                    // Conditional mismatch: drop this group's output and
                    // resume at the next line; no newline means the end of
                    // input.
                    match template[token_end..].find('\n') {
                        Some(rel) => {
                            scanner.seek(token_end + rel + 1);
                            continue;
                        }
                        None => break,
                    }
                }

                if !state.suppressing() {
                    interp.pagination.current_line += outcome.text.matches('\n').count();
                    out.push_str(&outcome.text);
                }

                if outcome.flush {
                    interp.flush_buffer(&mut out);
                } else if interp.pagination.due() && !out.is_empty() {
                    interp.flush_buffer(&mut out);
                    if interp.run_more_prompt() {
                        break;
                    }
                }
                if outcome.prompt_more && interp.run_more_prompt() {
                    break;
                }

                match outcome.signal {
                    None => {}
                    Some(Signal::Quit) => break,
                    Some(Signal::Exit) => {
                        interp.exit_requested = true;
                        interp.call_stack.clear();
                        break;
                    }
                    Some(Signal::Display(file)) => {
                        // Render the target, then stop this file for good;
                        // there is no snapshot and no return.
                        let rendered = interp.render_chained(&file, vars, includes);
                        out.push_str(&rendered);
                        break;
                    }
                    Some(Signal::Link(file)) => {
                        if interp.call_stack.len() >= MAX_LINK_DEPTH {
                            out.push_str(&format!(
                                "[ERROR: link nesting too deep (max {} levels)]",
                                MAX_LINK_DEPTH
                            ));
                        } else {
                            interp.call_stack.push(LinkFrame {
                                position: token_end,
                                style: state.style,
                                style_stack: state.style_stack.clone(),
                            });
                            let rendered = interp.render_chained(&file, vars, includes);
                            out.push_str(&rendered);
                            if let Some(frame) = interp.call_stack.pop() {
                                state.style = frame.style;
                                state.style_stack = frame.style_stack;
                                scanner.seek(frame.position);
                            }
                        }
                    }
                    Some(Signal::Top) => {
                        scanner.seek(0);
                        labels = scan_labels(template);
                    }
                    Some(Signal::Goto(label)) => match labels.get(&label) {
                        Some(&pos) => scanner.seek(pos),
                        None => debug!("goto unknown label {:?} ignored", label),
                    },
                }
            }
        }
    }

    // An option capture left open at end of file still commits.
    interp.menu.finish_capture();

    if let Some(file) = state.on_exit.take() {
        let rendered = interp.render_chained(&file, vars, includes);
        out.push_str(&rendered);
    }

    out
}

/// Renders a literal run line-by-line: styling, option capture, color
/// suppression, and the pagination checkpoints at each newline boundary.
/// Returns true when a more-prompt asked to stop the file.
fn emit_literal(
    interp: &mut Interpreter,
    state: &RenderState,
    text: &str,
    out: &mut String,
) -> bool {
    let suppressed = state.suppressing();
    let color = interp.color_enabled();
    let mut first = true;
    for line in text.split('\n') {
        if !first {
            // Line accounting advances even while suppressed so later
            // cursor math stays correct.
            interp.pagination.current_line += 1;
            if !suppressed {
                if interp.pagination.due() {
                    interp.flush_buffer(out);
                    if interp.run_more_prompt() {
                        return true;
                    }
                }
                out.push('\n');
            }
            interp.menu.capture("\n");
        }
        first = false;
        if !line.is_empty() {
            if !suppressed {
                out.push_str(&state.style.render(line, color));
            }
            interp.menu.capture(line);
        }
    }
    false
}

impl Interpreter {
    /// Loads and interprets a chained file (`include`, `link`, `display`,
    /// `on exit`), propagating the include chain for recursion rejection.
    /// All failures come back as inline error markers, not errors.
    pub(crate) fn render_chained(&mut self, name: &str, vars: &Vars, includes: &[String]) -> String {
        if includes.iter().any(|inc| inc == name) {
            return format!("[ERROR: {} included recursively]", name);
        }
        match self.loader.read(name) {
            Err(e) => format!("[ERROR: {}]", e),
            Ok(bytes) => {
                let template = String::from_utf8_lossy(&bytes).into_owned();
                let mut chain = includes.to_vec();
                chain.push(name.to_string());
                debug!("rendering chained file {:?} (depth {})", name, chain.len());
                run(self, &template, vars, &chain)
            }
        }
    }

    /// Shows `More [Y,n,=]? ` and reads one byte. `y` clears the screen
    /// and resets the pagination counters, `=` continues, `n` or anything
    /// else stops the file. Returns true when the file should stop.
    pub(crate) fn run_more_prompt(&mut self) -> bool {
        self.write_direct("More [Y,n,=]? ");
        match self.read_byte() {
            None => {
                // Disconnected mid-prompt: keep rendering.
                self.pagination.last_prompted = self.pagination.current_line;
                false
            }
            Some(byte) => match (byte as char).to_ascii_lowercase() {
                'y' => {
                    self.write_direct(&crate::ansi::clear_screen());
                    self.pagination.current_line = 0;
                    self.pagination.last_prompted = 0;
                    false
                }
                '=' => {
                    self.pagination.last_prompted = self.pagination.current_line;
                    false
                }
                _ => true,
            },
        }
    }
}
