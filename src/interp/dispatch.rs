// src/interp/dispatch.rs

//! The token dispatcher: one arm per recognized keyword.
//!
//! A bracket group may hold several space-separated tokens; the dispatcher
//! walks them left to right through an `ArgCursor`, so keywords that
//! consume trailing fields (`locate 5 10`, `repeat - 20`) advance the
//! cursor past their arguments. Style mutations all happen here, on the
//! `RenderState` the driver threads through; everything that affects the
//! driver's control flow is reported back as a `Signal` in the
//! `TokenOutcome` rather than acted on directly.

use log::trace;
use std::thread;
use std::time::Duration;

use super::driver::RenderState;
use super::{Interpreter, Vars};
use crate::ansi;
use crate::args::ArgCursor;
use crate::charset;
use crate::color::{is_color_token, parse_color};
use crate::style::{AttrFlags, Style};

/// Control-flow requests a token hands back to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Stop processing the current file only.
    Quit,
    /// Stop processing all nested files.
    Exit,
    /// Jump to a label (unknown labels are ignored).
    Goto(String),
    /// Restart at the top of the file, rebuilding the label table.
    Top,
    /// Render a file, then resume after this token.
    Link(String),
    /// Render a file, then stop the current file entirely.
    Display(String),
}

impl Signal {
    /// Precedence when one bracket group raises several signals: stronger
    /// terminations win over weaker ones; among jumps, the last wins.
    fn rank(&self) -> u8 {
        match self {
            Signal::Exit => 5,
            Signal::Quit => 4,
            Signal::Display(_) => 3,
            Signal::Link(_) => 2,
            Signal::Top | Signal::Goto(_) => 1,
        }
    }
}

/// Everything the driver needs to know after one bracket group.
#[derive(Debug, Default)]
pub(crate) struct TokenOutcome {
    /// Text produced by the group, already styled.
    pub text: String,
    /// Flush the accumulated buffer to the sink (interactive tokens).
    pub flush: bool,
    /// A `choice`/`ifentered` mismatch: skip to the end of this line.
    pub skip_line: bool,
    /// Run the `More [Y,n,=]?` prompt after flushing.
    pub prompt_more: bool,
    /// Control-flow request, if any.
    pub signal: Option<Signal>,
}

impl TokenOutcome {
    fn raise(&mut self, signal: Signal) {
        let replace = match &self.signal {
            None => true,
            Some(current) => signal.rank() >= current.rank(),
        };
        if replace {
            self.signal = Some(signal);
        }
    }
}

const NO_INPUT_ERROR: &str = "[ERROR: no input source configured]";

impl Interpreter {
    /// Processes one bracket group's parsed fields.
    pub(crate) fn dispatch_token(
        &mut self,
        fields: Vec<String>,
        state: &mut RenderState,
        vars: &Vars,
        includes: &[String],
    ) -> TokenOutcome {
        let color = self.color_enabled();
        let mut out = TokenOutcome::default();
        let mut cursor = ArgCursor::new(fields);

        while let Some(field) = cursor.next().map(str::to_string) {
            match field.to_ascii_lowercase().as_str() {
                // --- Cursor and screen control ---
                "cls" => out.text.push_str(&ansi::clear_screen()),
                "cleos" => out.text.push_str(&ansi::erase_display(0)),
                "cleol" => out.text.push_str(&ansi::erase_line(0)),
                "cr" => out.text.push('\r'),
                "lf" => out.text.push_str(&ansi::cursor_next_line(1)),
                "up" => out.text.push_str(&ansi::cursor_up(1)),
                "down" => out.text.push_str(&ansi::cursor_down(1)),
                "right" => out.text.push_str(&ansi::cursor_forward(1)),
                "left" => out.text.push_str(&ansi::cursor_backward(1)),
                "savecursor" => out.text.push_str(ansi::SAVE_CURSOR),
                "restorecursor" => out.text.push_str(ansi::RESTORE_CURSOR),
                "locate" => {
                    // 0-indexed arguments, 1-indexed escape sequence.
                    if let Some(args) = cursor.take(2) {
                        if let (Ok(row), Ok(col)) = (args[0].parse::<u16>(), args[1].parse::<u16>())
                        {
                            out.text.push_str(&ansi::cursor_position(row + 1, col + 1));
                        }
                    }
                }
                "line" => {
                    if let Some(args) = cursor.take(2) {
                        if let Ok(len) = args[0].parse::<usize>() {
                            if let Some(c) = args[1].chars().next() {
                                out.text.push_str(&c.to_string().repeat(len));
                            }
                        }
                    }
                }
                "box" => {
                    if let Some(args) = cursor.take(2) {
                        if let (Ok(w), Ok(h)) = (args[0].parse::<usize>(), args[1].parse::<usize>())
                        {
                            out.text.push_str(&draw_box(w, h));
                        }
                    }
                }

                // --- Style attributes ---
                "bold" | "bright" => state.style.flags.insert(AttrFlags::BOLD),
                "dim" => state.style.flags.insert(AttrFlags::FAINT),
                "italic" => state.style.flags.insert(AttrFlags::ITALIC),
                "underline" => state.style.flags.insert(AttrFlags::UNDERLINE),
                "blink" => state.style.flags.insert(AttrFlags::BLINK),
                "steady" => state.style.flags.remove(AttrFlags::BLINK),
                "reverse" => state.style.flags.insert(AttrFlags::REVERSE),
                "strike" => state.style.flags.insert(AttrFlags::STRIKETHROUGH),
                "reset" => {
                    state.style = Style::default();
                    // A [reset] also commits any option capture in flight.
                    self.menu.finish_capture();
                }
                "save" => state.style_stack.push(state.style),
                "load" => {
                    if let Some(style) = state.style_stack.pop() {
                        state.style = style;
                    }
                }

                // --- Background / foreground color keywords ---
                "bg" => {
                    if let Some(bg) = cursor.next().map(str::to_string) {
                        if !state.suppressing() {
                            if let Some(c) = parse_color(&bg) {
                                state.style.bg = c;
                            }
                        }
                    }
                }
                "fg" => {
                    if let Some(fg) = cursor.next().map(str::to_string) {
                        if !state.suppressing() {
                            if let Some(c) = parse_color(&fg) {
                                state.style.fg = c;
                            }
                        }
                    }
                }
                "on" => {
                    // Either [on exit <file>] or the background form [on <color>].
                    let next_is_exit = cursor
                        .peek()
                        .map(|p| p.eq_ignore_ascii_case("exit"))
                        .unwrap_or(false);
                    if next_is_exit && cursor.lookahead(1).is_some() {
                        cursor.advance();
                        let file = cursor.next().map(str::to_string).unwrap_or_default();
                        state.on_exit = Some(file);
                    } else if let Some(bg) = cursor.next().map(str::to_string) {
                        if !state.suppressing() {
                            if let Some(c) = parse_color(&bg) {
                                state.style.bg = c;
                            }
                        }
                    }
                }
                "onexit" => {
                    if let Some(file) = cursor.next().map(str::to_string) {
                        state.on_exit = Some(file);
                    }
                }

                // --- Color conditionals ---
                "color" | "colour" => state.cond_stack.push(!color),
                "nocolor" | "nocolour" => state.cond_stack.push(color),
                "endcolor" | "endcolour" => {
                    state.cond_stack.pop();
                }

                // --- File composition ---
                "include" => {
                    if let Some(name) = cursor.next().map(str::to_string) {
                        let rendered = self.render_chained(&name, vars, includes);
                        out.text.push_str(&rendered);
                    }
                }
                "display" => {
                    if let Some(name) = cursor.next().map(str::to_string) {
                        out.raise(Signal::Display(name));
                    }
                }
                "link" => {
                    if let Some(name) = cursor.next().map(str::to_string) {
                        out.raise(Signal::Link(name));
                    }
                }
                "ansi" | "copy" => {
                    if let Some(name) = cursor.next().map(str::to_string) {
                        match self.loader.read(&name) {
                            Ok(bytes) => out.text.push_str(&String::from_utf8_lossy(&bytes)),
                            Err(e) => out.text.push_str(&format!("[ERROR: {}]", e)),
                        }
                    }
                }
                "ansiconvert" => {
                    if let Some(args) = cursor.take(2) {
                        let (name, charset_name) = (args[0].clone(), args[1].clone());
                        match self.loader.read(&name) {
                            Ok(bytes) => match charset::decode(&bytes, &charset_name) {
                                Ok(text) => out.text.push_str(&text),
                                Err(e) => out.text.push_str(&format!("[ERROR: {}]", e)),
                            },
                            Err(e) => out.text.push_str(&format!("[ERROR: {}]", e)),
                        }
                    }
                }

                // --- Flow control ---
                "top" => out.raise(Signal::Top),
                "goto" | "jump" => {
                    if let Some(label) = cursor.next() {
                        out.raise(Signal::Goto(label.to_ascii_lowercase()));
                    }
                }
                "quit" => out.raise(Signal::Quit),
                "exit" => out.raise(Signal::Exit),
                "label" => {
                    // Targets are resolved by the pre-pass; at execution
                    // time the definition is a no-op.
                    cursor.advance();
                }

                // --- Input conditionals ---
                "choice" => {
                    if let Some(expected) = cursor.next().map(str::to_ascii_lowercase) {
                        let response = if !self.menu.selection.is_empty() {
                            self.menu.selection.clone()
                        } else {
                            self.readln_response
                                .chars()
                                .next()
                                .map(|c| c.to_lowercase().to_string())
                                .unwrap_or_default()
                        };
                        if response != expected {
                            out.skip_line = true;
                        }
                    }
                }
                "ifentered" => {
                    if let Some(expected) = cursor.next().map(str::to_ascii_lowercase) {
                        if self.readln_response.to_lowercase() != expected {
                            out.skip_line = true;
                        }
                    }
                }

                // --- Menus and interactive input ---
                "menu" => self.menu.begin_menu(),
                "option" => {
                    if let Some(raw) = cursor.next().map(str::to_string) {
                        let id = raw.to_ascii_lowercase();
                        let valid = id.len() == 1 && id.as_bytes()[0].is_ascii_alphanumeric();
                        if valid {
                            self.menu.begin_option(id.clone());
                            if !state.suppressing() {
                                out.text
                                    .push_str(&state.style.render(&id.to_ascii_uppercase(), color));
                            }
                        } else if !state.suppressing() {
                            let msg = format!(
                                "[ERROR: invalid option_id {}, must be single alphanumeric character]",
                                raw
                            );
                            out.text.push_str(&state.style.render(&msg, color));
                        }
                    }
                }
                "menuwait" => {
                    if self.input.is_none() {
                        if !state.suppressing() {
                            out.text.push_str(&state.style.render(NO_INPUT_ERROR, color));
                        }
                    } else {
                        out.flush = true;
                        let byte = self.read_byte();
                        self.menu.select(byte);
                        trace!("menuwait selected {:?}", self.menu.selection);
                    }
                }
                "readln" => {
                    let desc = cursor.next().map(str::to_string);
                    if self.input.is_none() {
                        if !state.suppressing() {
                            out.text.push_str(&state.style.render(NO_INPUT_ERROR, color));
                        }
                    } else {
                        out.flush = true;
                        match self.read_line() {
                            Some(line) => {
                                self.readln_response = line.clone();
                                self.questionnaire.push(match &desc {
                                    Some(d) => format!("{}: {}", d, line),
                                    None => line,
                                });
                            }
                            None => {
                                self.readln_response.clear();
                                if !self.answers_optional {
                                    self.questionnaire.push(match &desc {
                                        Some(d) => format!("{}: ", d),
                                        None => String::new(),
                                    });
                                }
                            }
                        }
                    }
                }
                "enter" => {
                    if self.input.is_none() {
                        if !state.suppressing() {
                            out.text.push_str(&state.style.render(NO_INPUT_ERROR, color));
                        }
                    } else {
                        out.flush = true;
                        let prompt = state.style.render("Press ENTER to continue", color);
                        self.write_direct(&prompt);
                        loop {
                            match self.read_byte() {
                                Some(b'\n') | Some(b'\r') | None => break,
                                Some(_) => {}
                            }
                        }
                    }
                }
                "more" => {
                    if self.input.is_none() {
                        if !state.suppressing() {
                            out.text.push_str(&state.style.render(NO_INPUT_ERROR, color));
                        }
                    } else {
                        out.flush = true;
                        out.prompt_more = true;
                    }
                }
                "moreon" => self.pagination.enabled = true,
                "moreoff" => self.pagination.enabled = false,
                "ansopt" => self.answers_optional = true,
                "ansreq" => self.answers_optional = false,

                // --- Questionnaire writes ---
                "store" => {
                    let desc = cursor.next().map(str::to_string);
                    if !self.menu.selection.is_empty() {
                        let entry = match &desc {
                            Some(d) => format!("{}: {}", d, self.menu.selection),
                            None => self.menu.selection.clone(),
                        };
                        self.questionnaire.push(entry);
                    }
                }
                "write" => {
                    if let Some(text) = cursor.next() {
                        self.questionnaire.push(text.to_string());
                    }
                }

                // --- Misc ---
                "bell" => out.text.push('\x07'),
                "bs" => out.text.push('\x08'),
                "tab" => out.text.push('\t'),
                "pause" => {
                    out.flush = true;
                    thread::sleep(Duration::from_millis(500));
                }
                "repeat" => {
                    if let Some(ch_field) = cursor.next().map(str::to_string) {
                        let mut count = 1usize;
                        if let Some(n) = cursor.peek().and_then(|p| p.parse::<usize>().ok()) {
                            count = n;
                            cursor.advance();
                        }
                        if let Some(c) = ch_field.chars().next() {
                            out.text.push_str(&c.to_string().repeat(count));
                        }
                    }
                }
                "comment" => cursor.skip_rest(),

                // --- Everything else: labels, colors, literal codes,
                //     variables, custom tokens ---
                _ => self.dispatch_fallthrough(&field, &mut cursor, &mut out, state, vars, color),
            }
        }
        out
    }

    /// Handles the non-keyword token kinds, in substitution-precedence
    /// order: label definitions, bare colors, literal code points,
    /// caller variables, registered custom tokens, and finally the inline
    /// unrecognized-token marker.
    fn dispatch_fallthrough(
        &mut self,
        field: &str,
        cursor: &mut ArgCursor,
        out: &mut TokenOutcome,
        state: &mut RenderState,
        vars: &Vars,
        color: bool,
    ) {
        // [/labelname] definitions resolve in the pre-pass.
        if field.starts_with('/') && field.len() > 1 {
            return;
        }

        // Bare color: sets the foreground, optionally `on <bg>` inline.
        if is_color_token(field) {
            if !state.suppressing() {
                if let Some(c) = parse_color(field) {
                    state.style.fg = c;
                }
            }
            let has_on = cursor
                .peek()
                .map(|p| p.eq_ignore_ascii_case("on"))
                .unwrap_or(false);
            if has_on && cursor.lookahead(1).is_some() {
                cursor.advance();
                if let Some(bg) = cursor.next().map(str::to_string) {
                    if !state.suppressing() {
                        if let Some(c) = parse_color(&bg) {
                            state.style.bg = c;
                        }
                    }
                }
            }
            return;
        }

        // [U+xxxx] literal code point.
        let hex = field
            .strip_prefix("U+")
            .or_else(|| field.strip_prefix("u+"));
        if let Some(hex) = hex {
            if !hex.is_empty() {
                if let Ok(n) = u32::from_str_radix(hex, 16) {
                    let c = char::from_u32(n).unwrap_or('\u{FFFD}');
                    self.emit_substitution(out, state, &c.to_string(), color);
                    return;
                }
            }
        }

        // [65] decimal code point.
        if !field.is_empty() && field.chars().all(|c| c.is_ascii_digit()) {
            let c = field
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            self.emit_substitution(out, state, &c.to_string(), color);
            return;
        }

        // Caller variables, matched case-sensitively, win over custom
        // tokens of the same name.
        if let Some(value) = vars.get(field) {
            let value = value.clone();
            self.emit_substitution(out, state, &value, color);
            return;
        }

        // Registered custom tokens, invoked with exactly `arity` fields or
        // none at all when fewer remain.
        let produced = if let Some(token) = self.registry.get(field) {
            let args: Vec<String> = if token.arity > 0 {
                cursor
                    .take(token.arity)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            Some((token.func)(&args))
        } else {
            None
        };
        if let Some(text) = produced {
            self.emit_substitution(out, state, &text, color);
            return;
        }

        if !state.suppressing() {
            let msg = format!("[UNRECOGNIZED TOKEN \"{}\"]", field);
            out.text.push_str(&state.style.render(&msg, color));
        }
    }

    /// Emits substitution text in the current style and mirrors it into an
    /// option capture in progress. Capture happens even while a color
    /// conditional suppresses the visible output.
    fn emit_substitution(
        &mut self,
        out: &mut TokenOutcome,
        state: &RenderState,
        text: &str,
        color: bool,
    ) {
        if !state.suppressing() {
            out.text.push_str(&state.style.render(text, color));
        }
        self.menu.capture(text);
    }
}

/// Composes a `w` x `h` rectangle outline from the current cursor
/// position, using line segments and relative cursor moves.
fn draw_box(w: usize, h: usize) -> String {
    if w == 0 || h == 0 {
        return String::new();
    }
    let wide = w as u16;
    let mut s = String::new();
    if h == 1 {
        s.push_str(&"─".repeat(w));
        return s;
    }
    if w == 1 {
        for row in 0..h {
            if row > 0 {
                s.push_str(&ansi::cursor_down(1));
                s.push_str(&ansi::cursor_backward(1));
            }
            s.push('│');
        }
        return s;
    }
    // Top edge.
    s.push('┌');
    s.push_str(&"─".repeat(w - 2));
    s.push('┐');
    // Side walls.
    for _ in 0..h - 2 {
        s.push_str(&ansi::cursor_down(1));
        s.push_str(&ansi::cursor_backward(wide));
        s.push('│');
        if w > 2 {
            s.push_str(&ansi::cursor_forward(wide - 2));
        }
        s.push('│');
    }
    // Bottom edge.
    s.push_str(&ansi::cursor_down(1));
    s.push_str(&ansi::cursor_backward(wide));
    s.push('└');
    s.push_str(&"─".repeat(w - 2));
    s.push('┘');
    s
}
