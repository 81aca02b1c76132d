//! End-to-end completion flows: trigger, narrow, accept, terminate.

pub mod common;

use quickcheck::{QuickCheck, TestResult};

use quaver_completion_engine::completion::{
    Completer, CompletionContext, CompletionKind, resolve,
};
use quaver_completion_engine::editor::KeyInput;
use quaver_completion_engine::logging::init_logger;
use quaver_completion_engine::symbols::{ClassDump, SymbolDatabase, SymbolDump};

use crate::common::{RecordingSink, SinkEvent, buf, fixture_db};

fn completer() -> Completer<RecordingSink> {
    Completer::new(fixture_db(), RecordingSink::default())
}

#[test]
fn class_prefix_lists_matches_in_name_order() {
    let buffer = buf("Arr");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buffer);

    assert!(engine.is_completing());
    let (labels, selected, anchor) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["Array", "ArrayedCollection"]);
    assert_eq!(selected, 0);
    assert_eq!(anchor, 0);
}

#[test]
fn short_class_prefix_does_not_trigger() {
    let buffer = buf("Ar");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 2, &buffer);
    assert!(!engine.is_completing());
    assert!(engine.sink().events.is_empty());
}

#[test]
fn re_trigger_refreshes_without_stacking_sessions() {
    let buffer = buf("Arr");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buffer);
    engine.trigger_completion(false, 3, &buffer);

    assert!(engine.is_completing());
    assert_eq!(engine.sink().menu_count(), 2);
    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["Array", "ArrayedCollection"]);
}

#[test]
fn typing_narrows_and_accept_replaces_the_span() {
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buf("Arr"));

    // Typed 'a': both candidates still share the prefix.
    engine.on_content_changed(3, 4, &buf("Arra"));
    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["Array", "ArrayedCollection"]);

    // Typed on to "ArrayedC": one candidate left.
    let mut buffer = buf("ArrayedC");
    engine.on_content_changed(4, 8, &buffer);
    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["ArrayedCollection"]);

    engine.accept(&mut buffer);
    assert_eq!(buffer.text(), "ArrayedCollection");
    assert!(!engine.is_completing());
    assert_eq!(engine.sink().events.last(), Some(&SinkEvent::MenuHidden));
}

#[test]
fn edit_before_the_anchor_ends_the_session() {
    let buffer = buf("Arr");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buffer);
    assert!(engine.is_completing());

    engine.on_content_changed(2, 2, &buf("Apr"));
    assert!(!engine.is_completing());
    assert_eq!(engine.sink().events.last(), Some(&SinkEvent::MenuHidden));
}

#[test]
fn cursor_leaving_the_span_ends_the_session() {
    let buffer = buf("x = Arr");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 7, &buffer);
    assert!(engine.is_completing());

    // Inside the span: survives.
    engine.on_cursor_moved(5, &buffer);
    assert!(engine.is_completing());

    // Left of it: terminates.
    engine.on_cursor_moved(2, &buffer);
    assert!(!engine.is_completing());
}

#[test]
fn zero_match_filter_hides_the_menu_but_keeps_the_session() {
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buf("Arr"));

    // A stray character kills every match; the menu hides but the session
    // survives.
    engine.on_content_changed(3, 4, &buf("Arrz"));
    assert!(engine.is_completing());
    assert_eq!(engine.sink().events.last(), Some(&SinkEvent::MenuHidden));

    // Backspacing it recovers.
    engine.on_content_changed(3, 3, &buf("Arr"));
    assert!(engine.is_completing());
    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["Array", "ArrayedCollection"]);
}

#[test]
fn class_method_fragment_completes_after_the_dot() {
    let mut buffer = buf("Array.ne");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('e'), 8, &buffer);

    assert!(engine.is_completing());
    let (labels, _, anchor) = engine.sink().last_menu().unwrap();
    // Operators like `++` never surface in call syntax.
    assert_eq!(labels, ["new"]);
    assert_eq!(anchor, 6);

    engine.accept(&mut buffer);
    assert_eq!(buffer.text(), "Array.new");
}

#[test]
fn ambiguous_bare_method_shows_one_grouped_entry() {
    let buffer = buf("x.bar");
    let mut engine = completer();
    // The exact name is already typed, so only a forced trigger shows it.
    engine.trigger_completion(true, 5, &buffer);

    assert!(engine.is_completing());
    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["bar [ 2 ]"]);
}

#[test]
fn unique_bare_method_is_attributed_to_its_owner() {
    let buffer = buf("x.pla");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('a'), 5, &buffer);

    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["play [ Float ]"]);
}

#[test]
fn float_receiver_completes_instance_methods() {
    let mut buffer = buf("3.0.cop");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('p'), 7, &buffer);

    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["copy [ Object ]"]);

    engine.accept(&mut buffer);
    assert_eq!(buffer.text(), "3.0.copy");
}

#[test]
fn integer_receiver_never_opens_a_session() {
    // "3." is a method dot being typed, not a Float literal receiver.
    let buffer = buf("3.cop");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('p'), 5, &buffer);

    assert!(!engine.is_completing());
    assert!(engine.sink().events.is_empty());
}

#[test]
fn pseudo_variable_receiver_resolves_through_its_class() {
    let buffer = buf("true.dum");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('m'), 8, &buffer);

    let (labels, _, _) = engine.sink().last_menu().unwrap();
    assert_eq!(labels, ["dump [ Object ]"]);
}

#[test]
fn accepting_with_nothing_visible_keeps_the_session_open() {
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buf("Arr"));
    let mut buffer = buf("Arrz");
    engine.on_content_changed(3, 4, &buffer);

    engine.accept(&mut buffer);
    assert!(engine.is_completing());
    assert_eq!(buffer.text(), "Arrz");
}

#[test]
fn cancel_hides_and_forgets() {
    let buffer = buf("Arr");
    let mut engine = completer();
    engine.on_key(KeyInput::Char('r'), 3, &buffer);
    engine.cancel();

    assert!(!engine.is_completing());
    assert_eq!(engine.sink().events.last(), Some(&SinkEvent::MenuHidden));
}

#[test]
fn class_prefix_query_matches_a_naive_scan() {
    fn letter(n: u8) -> char {
        (b'a' + n % 26) as char
    }

    fn prop(seeds: Vec<(u8, u8, u8)>, pick: usize) -> TestResult {
        if seeds.is_empty() {
            return TestResult::discard();
        }
        let mut names: Vec<String> = seeds
            .iter()
            .map(|&(a, b, c)| format!("Q{}{}{}", letter(a), letter(b), letter(c)))
            .collect();
        names.sort();
        names.dedup();

        let dump = SymbolDump {
            classes: names.iter().map(|n| ClassDump::new(n.as_str())).collect(),
        };
        let db = SymbolDatabase::from_dump(dump).unwrap();

        let base: String = names[pick % names.len()].chars().take(3).collect();
        let context = CompletionContext {
            kind: CompletionKind::Class,
            pos: 0,
            len: base.len(),
            context_pos: 3,
            base: base.clone(),
            text: base.clone(),
            receiver_kind: None,
        };
        let resolved: Vec<String> =
            resolve(&db, &context).into_iter().map(|c| c.text).collect();
        let expected: Vec<String> =
            names.iter().filter(|n| n.starts_with(&base)).cloned().collect();
        TestResult::from_bool(resolved == expected)
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<(u8, u8, u8)>, usize) -> TestResult);
}

#[test]
fn logger_initializes_idempotently() {
    let first = init_logger(true, Some("warn"), false);
    assert!(first.is_ok());
    let second = init_logger(true, Some("warn"), false);
    assert!(second.is_ok());
}
