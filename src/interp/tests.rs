// src/interp/tests.rs

// Tests the public interpreter API end to end: scanning, styling, flow
// control, file chaining, menus, and the questionnaire. Interactive input
// is simulated with in-memory readers; the output sink is a shared buffer
// so flushed output can be inspected alongside the returned remainder.

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::rc::Rc;

use test_log::test;

use crate::loader::MemoryLoader;
use crate::terminal::FixedTerminal;
use crate::{Interpreter, Vars};

/// A cloneable sink capturing everything the interpreter flushes.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn interpret(template: &str) -> String {
    Interpreter::new().interpret(template, &Vars::new())
}

fn interpret_with_input(template: &str, input: &str) -> (Interpreter, String, SharedSink) {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_writer(sink.clone())
        .with_reader(Cursor::new(input.as_bytes().to_vec()));
    let out = interp.interpret(template, &Vars::new());
    (interp, out, sink)
}

// --- Plain text and escaping ---

#[test]
fn test_plain_text_round_trips() {
    assert_eq!(interpret("Hello World"), "Hello World");
    assert_eq!(interpret("line one\nline two\n"), "line one\nline two\n");
}

#[test]
fn test_escaped_bracket_is_single_literal() {
    assert_eq!(interpret("[["), "[");
    assert_eq!(interpret("a[[red]b"), "a[red]b");
}

#[test]
fn test_unmatched_bracket_degrades_to_literal() {
    assert_eq!(interpret("ok [oops"), "ok [oops");
}

#[test]
fn test_empty_token_is_ignored() {
    assert_eq!(interpret("a[]b"), "ab");
}

// --- Styling ---

#[test]
fn test_red_then_reset() {
    assert_eq!(interpret("[red]X[reset]Y"), "\x1b[31mX\x1b[0mY");
}

#[test]
fn test_save_load_roundtrip() {
    // The style at [save] is red+bold; [load] restores it exactly.
    let out = interpret("[red][bold][save][blue]W[load]X");
    assert_eq!(out, "\x1b[1;34mW\x1b[0m\x1b[1;31mX\x1b[0m");
}

#[test]
fn test_load_on_empty_stack_is_noop() {
    assert_eq!(interpret("[load]X"), "X");
}

#[test]
fn test_multiple_tokens_per_bracket() {
    // [lightblue blink]X is three sequential tokens' worth of state.
    assert_eq!(interpret("[lightblue blink]X"), "\x1b[5;94mX\x1b[0m");
}

#[test]
fn test_foreground_on_background() {
    assert_eq!(interpret("[red on white]X"), "\x1b[31;47mX\x1b[0m");
}

#[test]
fn test_bg_and_fg_keywords() {
    assert_eq!(interpret("[bg blue]X"), "\x1b[44mX\x1b[0m");
    assert_eq!(interpret("[FG red]X"), "\x1b[31mX\x1b[0m");
}

#[test]
fn test_steady_cancels_blink_only() {
    assert_eq!(interpret("[blink steady]X"), "X");
    assert_eq!(interpret("[bold blink steady]X"), "\x1b[1mX\x1b[0m");
}

#[test]
fn test_true_color_and_palette_tokens() {
    assert_eq!(interpret("[#FF0000]X"), "\x1b[38;2;255;0;0mX\x1b[0m");
    assert_eq!(interpret("[#202]X"), "\x1b[38;5;202mX\x1b[0m");
}

#[test]
fn test_color_disabled_renders_plain() {
    let mut interp = Interpreter::new().with_terminal(FixedTerminal {
        color: false,
        height: 24,
    });
    assert_eq!(interp.interpret("[red][bold]X", &Vars::new()), "X");
}

// --- Color conditionals ---

#[test]
fn test_color_block_shown_when_color_enabled() {
    assert_eq!(interpret("[color]A[endcolor]B"), "AB");
    assert_eq!(interpret("[nocolor]A[endcolor]B"), "B");
}

#[test]
fn test_color_block_hidden_without_color() {
    let mut interp = Interpreter::new().with_terminal(FixedTerminal {
        color: false,
        height: 24,
    });
    assert_eq!(interp.interpret("[color]A[endcolor]B", &Vars::new()), "B");
    assert_eq!(interp.interpret("[nocolor]A[endcolour]B", &Vars::new()), "AB");
}

#[test]
fn test_nested_conditionals_suppress_while_any_active() {
    let mut interp = Interpreter::new().with_terminal(FixedTerminal {
        color: false,
        height: 24,
    });
    // The outer [color] suppresses; the inner [nocolor] block stays
    // suppressed even though its own condition holds.
    let out = interp.interpret("[color]A[nocolor]B[endcolor]C[endcolor]D", &Vars::new());
    assert_eq!(out, "D");
}

// --- Cursor and screen tokens ---

#[test]
fn test_cls_and_movement() {
    assert_eq!(interpret("[cls]"), "\x1b[2J\x1b[1;1H");
    assert_eq!(
        interpret("[up down left right]"),
        "\x1b[1A\x1b[1B\x1b[1D\x1b[1C"
    );
    assert_eq!(interpret("[cr lf]"), "\r\x1b[1E");
    assert_eq!(interpret("[savecursor restorecursor]"), "\x1b7\x1b8");
}

#[test]
fn test_locate_is_zero_indexed_input() {
    assert_eq!(interpret("[locate 5 10]"), "\x1b[6;11H");
}

#[test]
fn test_locate_with_bad_arguments_emits_nothing() {
    assert_eq!(interpret("[locate x y]"), "");
}

#[test]
fn test_line_repeats_first_character() {
    assert_eq!(interpret("[line 10 -]"), "----------");
    assert_eq!(interpret("[line 3 abc]"), "aaa");
}

#[test]
fn test_line_with_non_integer_length_is_noop() {
    assert_eq!(interpret("[line x -]"), "");
}

#[test]
fn test_repeat_defaults_to_one() {
    assert_eq!(interpret("[repeat = 3]"), "===");
    assert_eq!(interpret("[repeat *]"), "*");
    assert_eq!(interpret("[repeat * banana]"), "*banana");
}

#[test]
fn test_box_is_composed_outline() {
    let out = interpret("[box 4 3]");
    assert!(out.starts_with("┌──┐"));
    assert!(out.ends_with("└──┘"));
}

#[test]
fn test_control_byte_tokens() {
    assert_eq!(interpret("[bell bs tab]"), "\x07\x08\t");
}

// --- Literal code tokens ---

#[test]
fn test_decimal_code_point() {
    assert_eq!(interpret("[65]"), "A");
}

#[test]
fn test_unicode_code_point() {
    assert_eq!(interpret("[U+2665]"), "♥");
    assert_eq!(interpret("[u+2665]"), "♥");
}

#[test]
fn test_invalid_scalar_renders_replacement() {
    assert_eq!(interpret("[55296]"), "\u{FFFD}"); // UTF-16 surrogate range
}

// --- Variables and custom tokens ---

#[test]
fn test_variable_substitution() {
    let mut vars = Vars::new();
    vars.insert("user".to_string(), "Alice".to_string());
    let out = Interpreter::new().interpret("Hello [user]!", &vars);
    assert_eq!(out, "Hello Alice!");
}

#[test]
fn test_variable_rendered_in_current_style() {
    let mut vars = Vars::new();
    vars.insert("user".to_string(), "Alice".to_string());
    let out = Interpreter::new().interpret("[red][user]", &vars);
    assert_eq!(out, "\x1b[31mAlice\x1b[0m");
}

#[test]
fn test_custom_token_with_arguments() {
    let mut interp = Interpreter::new();
    interp
        .register_token("greet", 2, |args| format!("Hello {} and {}", args[0], args[1]))
        .unwrap();
    let out = interp.interpret("[greet Alice Bob]", &Vars::new());
    assert_eq!(out, "Hello Alice and Bob");
}

#[test]
fn test_custom_token_short_invocation_gets_empty_args() {
    let mut interp = Interpreter::new();
    interp
        .register_token("mytoken", 2, |args| format!("argc={}", args.len()))
        .unwrap();
    let out = interp.interpret("[mytoken onlyonearg]", &Vars::new());
    // The function sees no arguments at all; the unconsumed field falls
    // through to normal token processing.
    assert!(out.contains("argc=0"));
    assert!(out.contains("[UNRECOGNIZED TOKEN \"onlyonearg\"]"));
}

#[test]
fn test_variable_overrides_registered_token() {
    let mut interp = Interpreter::new();
    interp.register_token("user", 0, |_| "Bob".to_string()).unwrap();
    let mut vars = Vars::new();
    vars.insert("user".to_string(), "Alice".to_string());
    assert_eq!(interp.interpret("[user]", &vars), "Alice");
    assert_eq!(interp.interpret("[user]", &Vars::new()), "Bob");
}

#[test]
fn test_duplicate_registration_fails() {
    let mut interp = Interpreter::new();
    interp.register_token("user", 0, |_| String::new()).unwrap();
    assert!(interp.register_token("USER", 0, |_| String::new()).is_err());
}

#[test]
fn test_unrecognized_token_marker() {
    assert_eq!(
        interpret("[nonsense]"),
        "[UNRECOGNIZED TOKEN \"nonsense\"]"
    );
}

#[test]
fn test_comment_discards_fields() {
    assert_eq!(interpret("[comment this is all ignored]X"), "X");
}

// --- File composition ---

fn loaded(files: &[(&str, &str)]) -> Interpreter {
    let mut loader = MemoryLoader::new();
    for (name, content) in files {
        loader.insert(*name, *content);
    }
    Interpreter::new().with_loader(loader)
}

#[test]
fn test_include_substitutes_inline() {
    let mut interp = loaded(&[("header.mec", "HEADER")]);
    assert_eq!(interp.interpret("<[include header.mec]>", &Vars::new()), "<HEADER>");
}

#[test]
fn test_include_missing_file_is_inline_error() {
    let mut interp = loaded(&[]);
    let out = interp.interpret("[include nope.mec]X", &Vars::new());
    assert!(out.starts_with("[ERROR: "));
    assert!(out.ends_with("X"));
}

#[test]
fn test_recursive_include_rejected() {
    let mut interp = loaded(&[("self.mec", "A[include self.mec]B")]);
    let out = interp.exec_template("self.mec", &Vars::new()).unwrap();
    assert!(out.contains("recursively"));
    assert_eq!(out, "A[ERROR: self.mec included recursively]B");
}

#[test]
fn test_indirect_recursion_rejected() {
    let mut interp = loaded(&[
        ("a.mec", "A[include b.mec]"),
        ("b.mec", "B[include a.mec]"),
    ]);
    let out = interp.exec_template("a.mec", &Vars::new()).unwrap();
    assert!(out.contains("recursively"));
}

#[test]
fn test_link_returns_to_caller() {
    let mut interp = loaded(&[("mid.mec", "M")]);
    assert_eq!(interp.interpret("A[link mid.mec]B", &Vars::new()), "AMB");
}

#[test]
fn test_link_restores_caller_style() {
    let mut interp = loaded(&[("mid.mec", "[blue]M")]);
    let out = interp.interpret("[red]A[link mid.mec]B", &Vars::new());
    // B renders in the caller's red, untouched by the linked file's blue.
    assert_eq!(
        out,
        "\x1b[31mA\x1b[0m\x1b[34mM\x1b[0m\x1b[31mB\x1b[0m"
    );
}

#[test]
fn test_link_depth_limit() {
    let mut files: Vec<(String, String)> = Vec::new();
    for i in 1..9 {
        files.push((format!("l{}.mec", i), format!("<[link l{}.mec]>", i + 1)));
    }
    files.push(("l9.mec".to_string(), "DEEP".to_string()));
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    let mut interp = loaded(&refs);
    let out = interp.interpret("[link l1.mec]", &Vars::new());
    // The ninth nested link errors inline; the target never renders.
    assert!(out.contains("link nesting too deep"));
    assert!(!out.contains("DEEP"));
}

#[test]
fn test_display_stops_current_file() {
    let mut interp = loaded(&[("end.mec", "END")]);
    assert_eq!(interp.interpret("A[display end.mec]B", &Vars::new()), "AEND");
}

#[test]
fn test_on_exit_runs_after_fall_off_end() {
    let mut interp = loaded(&[("bye.mec", " BYE")]);
    assert_eq!(interp.interpret("[on exit bye.mec]Hi", &Vars::new()), "Hi BYE");
}

#[test]
fn test_on_exit_runs_after_quit() {
    let mut interp = loaded(&[("bye.mec", " BYE")]);
    assert_eq!(
        interp.interpret("[onexit bye.mec]A[quit]B", &Vars::new()),
        "A BYE"
    );
}

#[test]
fn test_quit_stops_current_file_only() {
    let mut interp = loaded(&[("sub.mec", "S[quit]T")]);
    assert_eq!(interp.interpret("A[link sub.mec]B", &Vars::new()), "ASB");
}

#[test]
fn test_exit_stops_all_files() {
    let mut interp = loaded(&[("sub.mec", "S[exit]T")]);
    assert_eq!(interp.interpret("A[link sub.mec]B", &Vars::new()), "AS");
}

#[test]
fn test_ansi_passthrough_is_unparsed() {
    let mut interp = loaded(&[("art.ans", "RAW [red] \x1b[1mtext")]);
    assert_eq!(
        interp.interpret("[ansi art.ans]", &Vars::new()),
        "RAW [red] \x1b[1mtext"
    );
    assert_eq!(
        interp.interpret("[copy art.ans]", &Vars::new()),
        "RAW [red] \x1b[1mtext"
    );
}

#[test]
fn test_ansiconvert_decodes_cp437() {
    let mut loader = MemoryLoader::new();
    loader.insert("box.ans", vec![0xC9u8, 0xCD, 0xBB]);
    let mut interp = Interpreter::new().with_loader(loader);
    assert_eq!(interp.interpret("[ansiconvert box.ans cp437]", &Vars::new()), "╔═╗");
}

#[test]
fn test_ansiconvert_unknown_charset_is_inline_error() {
    let mut loader = MemoryLoader::new();
    loader.insert("a.ans", "x");
    let mut interp = Interpreter::new().with_loader(loader);
    let out = interp.interpret("[ansiconvert a.ans ebcdic]", &Vars::new());
    assert_eq!(out, "[ERROR: unsupported charset ebcdic]");
}

#[test]
fn test_exec_template_missing_file_is_caller_error() {
    let mut interp = loaded(&[]);
    assert!(interp.exec_template("ghost.mec", &Vars::new()).is_err());
}

// --- Flow control ---

#[test]
fn test_goto_skips_to_label() {
    assert_eq!(interpret("[goto end]SKIPPED[/end]After"), "After");
}

#[test]
fn test_goto_label_keyword_form() {
    assert_eq!(interpret("A[goto fin]B[label fin]C"), "AC");
}

#[test]
fn test_goto_unknown_label_is_ignored() {
    assert_eq!(interpret("[goto nowhere]X"), "X");
}

#[test]
fn test_jump_is_goto_synonym() {
    assert_eq!(interpret("[jump end]SKIPPED[/end]Y"), "Y");
}

#[test]
fn test_top_restarts_file() {
    // First pass: menuwait reads 'x' (no match), [choice a] fails and
    // skips the [quit], [top] restarts. Second pass: 'a' matches, the
    // choice holds, and [quit] ends the file.
    let template = "[menu][option a]Add[reset][menuwait][choice a][quit]\n[top]";
    let (interp, out, sink) = interpret_with_input(template, "xa");
    assert_eq!(interp.menu_selection(), "a");
    // The menu renders once per pass.
    let combined = format!("{}{}", sink.contents(), out);
    assert_eq!(combined.matches("AAdd").count(), 2);
}

// --- Menus and interactive tokens ---

#[test]
fn test_menu_selection_matches_input() {
    let template = "[menu][option a]Add[reset][option b]Delete[reset][menuwait]";
    let (interp, _, _) = interpret_with_input(template, "a");
    assert_eq!(interp.menu_selection(), "a");
}

#[test]
fn test_menu_selection_no_match_is_empty() {
    let template = "[menu][option a]Add[reset][option b]Delete[reset][menuwait]";
    let (interp, _, _) = interpret_with_input(template, "x");
    assert_eq!(interp.menu_selection(), "");
}

#[test]
fn test_menu_selection_is_case_insensitive() {
    let template = "[menu][option a]Add[reset][menuwait]";
    let (interp, _, _) = interpret_with_input(template, "A");
    assert_eq!(interp.menu_selection(), "a");
}

#[test]
fn test_option_id_renders_uppercased() {
    let (_, out, sink) = interpret_with_input("[menu][option a]Add[reset]", "");
    assert_eq!(format!("{}{}", sink.contents(), out), "AAdd");
}

#[test]
fn test_invalid_option_id_is_inline_error() {
    let out = interpret("[menu][option ab]text[reset]");
    assert!(out.contains("invalid option_id ab"));
}

#[test]
fn test_choice_suppresses_rest_of_line_only() {
    let template = "[menu][option n]No[reset][menuwait][choice y]Yes\nNext";
    let (interp, out, _) = interpret_with_input(template, "n");
    assert_eq!(interp.menu_selection(), "n");
    assert_eq!(out, "Next");
}

#[test]
fn test_choice_match_keeps_line() {
    let template = "[menu][option y]Yes[reset][menuwait][choice y] confirmed\nNext";
    let (_, out, _) = interpret_with_input(template, "y");
    assert_eq!(out, " confirmed\nNext");
}

#[test]
fn test_choice_falls_back_to_readln_first_char() {
    let template = "[readln][choice y]agreed\ndone";
    let (_, out, _) = interpret_with_input(template, "Yes please\n");
    assert_eq!(out, "agreed\ndone");
}

#[test]
fn test_ifentered_matches_full_response() {
    let template = "[readln][ifentered blue]cold\ndone";
    let (_, out, _) = interpret_with_input(template, "BLUE\n");
    assert_eq!(out, "cold\ndone");

    let (_, out, _) = interpret_with_input(template, "blueish\n");
    assert_eq!(out, "done");
}

#[test]
fn test_readln_records_response_and_questionnaire() {
    let (interp, _, _) = interpret_with_input("[readln name]", "Alice\n");
    assert_eq!(interp.readln_response(), "Alice");
    assert_eq!(interp.questionnaire(), ["name: Alice"]);
}

#[test]
fn test_readln_without_description() {
    let (interp, _, _) = interpret_with_input("[readln]", "hi\n");
    assert_eq!(interp.questionnaire(), ["hi"]);
}

#[test]
fn test_readln_eof_appends_empty_record_when_required() {
    let (interp, _, _) = interpret_with_input("[readln name]", "");
    assert_eq!(interp.questionnaire(), ["name: "]);
}

#[test]
fn test_ansopt_makes_missing_answer_silent() {
    let (interp, _, _) = interpret_with_input("[ansopt][readln name]", "");
    assert!(interp.questionnaire().is_empty());
}

#[test]
fn test_store_records_menu_selection() {
    let template = "[menu][option a]Add[reset][menuwait][store choice]";
    let (interp, _, _) = interpret_with_input(template, "a");
    assert_eq!(interp.questionnaire(), ["choice: a"]);
}

#[test]
fn test_store_without_selection_records_nothing() {
    let template = "[menu][option a]Add[reset][menuwait][store choice]";
    let (interp, _, _) = interpret_with_input(template, "x");
    assert!(interp.questionnaire().is_empty());
}

#[test]
fn test_write_appends_verbatim() {
    let out = interpret("[write \"free form note\"]");
    assert_eq!(out, "");
    let mut interp = Interpreter::new();
    interp.interpret("[write \"free form note\"]", &Vars::new());
    assert_eq!(interp.questionnaire(), ["free form note"]);
}

#[test]
fn test_questionnaire_persists_across_calls() {
    let mut interp = Interpreter::new();
    interp.interpret("[write one]", &Vars::new());
    interp.interpret("[write two]", &Vars::new());
    assert_eq!(interp.questionnaire(), ["one", "two"]);
    interp.clear_questionnaire();
    assert!(interp.questionnaire().is_empty());
}

#[test]
fn test_interactive_token_without_input_is_inline_error() {
    assert_eq!(
        interpret("[menuwait]"),
        "[ERROR: no input source configured]"
    );
    assert!(interpret("[readln]").contains("no input source"));
    assert!(interpret("[enter]").contains("no input source"));
}

#[test]
fn test_enter_writes_prompt_before_blocking() {
    let (_, _, sink) = interpret_with_input("[enter]done", "\n");
    assert!(sink.contents().contains("Press ENTER to continue"));
}

#[test]
fn test_menuwait_flushes_pending_output() {
    let (_, out, sink) = interpret_with_input("Pick one: [menuwait]", "x");
    // Everything before the blocking read reached the sink.
    assert_eq!(sink.contents(), "Pick one: ");
    assert_eq!(out, "");
}

// --- Pagination ---

#[test]
fn test_auto_more_prompts_and_stops_on_n() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_writer(sink.clone())
        .with_reader(Cursor::new(b"n".to_vec()))
        .with_terminal(FixedTerminal {
            color: true,
            height: 5,
        });
    let out = interp.interpret("[moreon]L1\nL2\nL3\nL4\nL5\nL6", &Vars::new());
    let flushed = sink.contents();
    assert!(flushed.contains("More [Y,n,=]? "));
    assert!(flushed.contains("L3"));
    assert!(!flushed.contains("L5"));
    assert!(!out.contains("L5"));
}

#[test]
fn test_auto_more_continues_on_equals() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_writer(sink.clone())
        .with_reader(Cursor::new(b"==".to_vec()))
        .with_terminal(FixedTerminal {
            color: true,
            height: 5,
        });
    let out = interp.interpret("[moreon]L1\nL2\nL3\nL4\nL5", &Vars::new());
    assert!(out.contains("L5"));
}

#[test]
fn test_more_disabled_never_prompts() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_writer(sink.clone())
        .with_reader(Cursor::new(b"n".to_vec()))
        .with_terminal(FixedTerminal {
            color: true,
            height: 5,
        });
    let out = interp.interpret("L1\nL2\nL3\nL4\nL5\nL6", &Vars::new());
    assert!(!sink.contents().contains("More"));
    assert!(out.contains("L6"));
}

#[test]
fn test_explicit_more_token_prompts() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_writer(sink.clone())
        .with_reader(Cursor::new(b"=".to_vec()));
    let out = interp.interpret("page one[more]page two", &Vars::new());
    assert!(sink.contents().contains("More [Y,n,=]? "));
    assert!(out.contains("page two"));
}

// --- Rendering entry points ---

#[test]
fn test_render_streams_to_sink() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new().with_writer(sink.clone());
    interp.render("plain [red]red", &Vars::new()).unwrap();
    assert_eq!(sink.contents(), "plain \x1b[31mred\x1b[0m");
}

#[test]
fn test_render_template_streams_to_sink() {
    let sink = SharedSink::default();
    let mut interp = Interpreter::new()
        .with_loader(MemoryLoader::new().with("hello.mec", "[bold]hi"))
        .with_writer(sink.clone());
    interp.render_template("hello.mec", &Vars::new()).unwrap();
    assert_eq!(sink.contents(), "\x1b[1mhi\x1b[0m");
}
