//! Shared fixtures for the integration suite: a small reference tokenizer,
//! a class library snapshot, and a recording display sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use quaver_completion_engine::completion::Candidate;
use quaver_completion_engine::editor::DisplaySink;
use quaver_completion_engine::symbols::{
    ClassDump, MethodDump, SymbolDatabase, SymbolDump,
};
use quaver_completion_engine::tokens::{Token, TokenBuffer, TokenKind};

const PSEUDO_VARIABLES: &[&str] = &[
    "true",
    "false",
    "nil",
    "inf",
    "thisProcess",
    "thisFunction",
    "thisFunctionDef",
    "thisMethod",
    "thisThread",
    "currentEnvironment",
    "topEnvironment",
];

/// Minimal tokenizer covering the surface syntax the engine reacts to.
/// Hosts bring their own; this one exists so the tests can write buffers as
/// plain source text.
pub fn lex(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| if i < chars.len() { chars[i].0 } else { text.len() };

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (position, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let word = &text[position..byte_at(i)];
            if i < chars.len() && chars[i].1 == ':' {
                i += 1;
                tokens.push(Token {
                    kind: TokenKind::SymbolArg,
                    character: None,
                    position,
                    length: byte_at(i) - position,
                });
                continue;
            }
            let kind = if c.is_uppercase() {
                TokenKind::Class
            } else if PSEUDO_VARIABLES.contains(&word) {
                TokenKind::Builtin
            } else if matches!(word, "var" | "arg" | "classvar" | "const") {
                TokenKind::Keyword
            } else {
                TokenKind::Name
            };
            tokens.push(Token { kind, character: None, position, length: word.len() });
        } else if c.is_ascii_digit() {
            while i < chars.len() && chars[i].1.is_ascii_digit() {
                i += 1;
            }
            // Only a dot followed by a digit belongs to the literal; a
            // trailing dot is a method dot.
            if i + 1 < chars.len() && chars[i].1 == '.' && chars[i + 1].1.is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Float,
                character: None,
                position,
                length: byte_at(i) - position,
            });
        } else if c == '"' {
            i += 1;
            while i < chars.len() && chars[i].1 != '"' {
                i += 1;
            }
            i = (i + 1).min(chars.len());
            tokens.push(Token {
                kind: TokenKind::String,
                character: None,
                position,
                length: byte_at(i) - position,
            });
        } else if c == '$' {
            i += 1;
            i = (i + 1).min(chars.len());
            tokens.push(Token {
                kind: TokenKind::Char,
                character: None,
                position,
                length: byte_at(i) - position,
            });
        } else if c == '\\' {
            i += 1;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Symbol,
                character: None,
                position,
                length: byte_at(i) - position,
            });
        } else {
            let kind = match c {
                '(' | '[' | '{' => TokenKind::OpeningBracket,
                ')' | ']' | '}' => TokenKind::ClosingBracket,
                _ => TokenKind::Unknown,
            };
            i += 1;
            tokens.push(Token { kind, character: Some(c), position, length: c.len_utf8() });
        }
    }
    tokens
}

/// Buffer with its token snapshot, from plain source text.
pub fn buf(text: &str) -> TokenBuffer {
    TokenBuffer::new(text, lex(text))
}

/// A cut-down class library with the shapes the tests need: a deep
/// inheritance chain, shadowed class-side constructors, an operator method,
/// pseudo-variable target classes, and one ambiguous method name.
pub fn fixture_db() -> Arc<SymbolDatabase> {
    let dump = SymbolDump {
        classes: vec![
            ClassDump::new("Object")
                .instance_method(MethodDump::new("copy"))
                .instance_method(MethodDump::new("dump"))
                .class_method(MethodDump::new("new")),
            ClassDump::new("Collection")
                .with_superclass("Object")
                .class_method(
                    MethodDump::new("fill").arg("size", None).arg("function", None),
                ),
            ClassDump::new("ArrayedCollection").with_superclass("Collection"),
            ClassDump::new("Array")
                .with_superclass("ArrayedCollection")
                .instance_method(MethodDump::new("reverse"))
                .class_method(MethodDump::new("new").arg("size", Some("0")))
                .class_method(MethodDump::new("++")),
            ClassDump::new("String")
                .with_superclass("ArrayedCollection")
                .instance_method(MethodDump::new("size")),
            ClassDump::new("Float")
                .with_superclass("Object")
                .instance_method(
                    MethodDump::new("play").arg("freq", Some("440")).arg("amp", Some("1.0")),
                ),
            ClassDump::new("Symbol")
                .with_superclass("Object")
                .instance_method(MethodDump::new("asString")),
            ClassDump::new("Char").with_superclass("Object"),
            ClassDump::new("True").with_superclass("Object"),
            ClassDump::new("False").with_superclass("Object"),
            ClassDump::new("Nil").with_superclass("Object"),
            ClassDump::new("Main").with_superclass("Object"),
            ClassDump::new("Function").with_superclass("Object"),
            ClassDump::new("Thread").with_superclass("Object"),
            ClassDump::new("Environment").with_superclass("Object"),
            ClassDump::new("Foo")
                .with_superclass("Object")
                .instance_method(MethodDump::new("bar").arg("a", None).arg("b", None)),
            ClassDump::new("Bar")
                .with_superclass("Object")
                .instance_method(MethodDump::new("bar").arg("x", None)),
        ],
    };
    Arc::new(SymbolDatabase::from_dump(dump).expect("fixture dump links"))
}

/// Everything the engine pushed at the display, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Menu { labels: Vec<String>, selected: usize, anchor: usize },
    MenuHidden,
    Chooser { labels: Vec<String> },
    Hint { signature: String, highlighted: Option<usize>, anchor: usize },
    HintHidden,
}

/// Display sink that records every call and answers modal choices from a
/// pre-loaded script.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub choices: VecDeque<Option<usize>>,
}

impl RecordingSink {
    pub fn with_choices(choices: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self { events: Vec::new(), choices: choices.into_iter().collect() }
    }

    /// The most recent menu render, if any.
    pub fn last_menu(&self) -> Option<(&[String], usize, usize)> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Menu { labels, selected, anchor } => {
                Some((labels.as_slice(), *selected, *anchor))
            }
            _ => None,
        })
    }

    /// The most recent argument-hint render, if any.
    pub fn last_hint(&self) -> Option<(&str, Option<usize>, usize)> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Hint { signature, highlighted, anchor } => {
                Some((signature.as_str(), *highlighted, *anchor))
            }
            _ => None,
        })
    }

    pub fn menu_count(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, SinkEvent::Menu { .. })).count()
    }
}

impl DisplaySink for RecordingSink {
    fn show_candidates(&mut self, items: &[Candidate], selected: usize, anchor: usize) {
        self.events.push(SinkEvent::Menu {
            labels: items.iter().map(|c| c.label.clone()).collect(),
            selected,
            anchor,
        });
    }

    fn hide_candidates(&mut self) {
        self.events.push(SinkEvent::MenuHidden);
    }

    fn choose_one(&mut self, items: &[Candidate], _anchor: usize) -> Option<usize> {
        self.events.push(SinkEvent::Chooser {
            labels: items.iter().map(|c| c.label.clone()).collect(),
        });
        self.choices.pop_front().flatten()
    }

    fn show_argument_hint(&mut self, signature: &str, highlighted: Option<usize>, anchor: usize) {
        self.events.push(SinkEvent::Hint {
            signature: signature.to_owned(),
            highlighted,
            anchor,
        });
    }

    fn hide_argument_hint(&mut self) {
        self.events.push(SinkEvent::HintHidden);
    }
}
