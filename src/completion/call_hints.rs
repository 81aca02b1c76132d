//! Nested open-call tracking for the argument-hint tooltip.
//!
//! Each frame remembers the position of an opening bracket and, once
//! resolved, the method being called there. The stack is recomputed against
//! the cursor on every move: frames the cursor has left are popped, and the
//! topmost surviving frame with a documented argument list drives the hint.
//!
//! Resolution is eager for unambiguous lookups; when several methods share
//! the called name, a modal choice is put to the display sink (the one
//! suspension point of the engine). A cancelled choice leaves the frame
//! permanently unresolved: it stays on the stack but never shows a hint.

use tracing::{debug, warn};

use crate::editor::{DisplaySink, EditorBuffer};
use crate::symbols::{MethodId, SymbolDatabase};
use crate::tokens::{TokenCursor, TokenKind, TokenSource, token_text};

use super::resolve::{Candidate, find_class_method};

/// One tracked open call.
#[derive(Debug, Clone, Copy)]
pub struct CallFrame {
    /// Buffer position of the opening bracket.
    pub bracket: usize,
    /// Resolved method; `None` until resolved, or permanently if resolution
    /// failed or was cancelled.
    pub method: Option<MethodId>,
}

/// Stack of open calls, ordered by strictly ascending bracket position.
#[derive(Debug, Default)]
pub struct CallHintStack {
    frames: Vec<CallFrame>,
}

impl CallHintStack {
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Pop frames invalidated by an edit at `pos` (the edit precedes or
    /// touches their bracket). Returns whether anything was popped.
    pub fn handle_edit(&mut self, pos: usize) -> bool {
        let mut popped = false;
        while let Some(top) = self.frames.last() {
            if pos > top.bracket {
                break;
            }
            debug!(bracket = top.bracket, "call hint: edit before call, popping");
            self.frames.pop();
            popped = true;
        }
        popped
    }

    /// Manual trigger: locate the enclosing `(`, identify and resolve the
    /// called method, and push a frame for it. Triggering a bracket that is
    /// already the top frame is a no-op unless `force`, which pops and
    /// re-resolves it.
    pub fn trigger<B, S>(
        &mut self,
        force: bool,
        cursor: usize,
        db: &SymbolDatabase,
        buffer: &B,
        sink: &mut S,
    ) where
        B: TokenSource + EditorBuffer + ?Sized,
        S: DisplaySink + ?Sized,
    {
        let tokens = buffer.tokens();

        // Scan left for the bracket we are inside, counting nesting level.
        let mut it = TokenCursor::left_of(tokens, cursor);
        let mut level = 1u32;
        let mut arg_pos = 0usize;
        let bracket = loop {
            let Some(current) = it else { return };
            let token = current.token();
            if token.character == Some(',') {
                if level == 1 {
                    arg_pos += 1;
                }
            } else if token.kind == TokenKind::ClosingBracket {
                level += 1;
            } else if token.kind == TokenKind::OpeningBracket {
                level -= 1;
                if level == 0 {
                    if token.character == Some('(') {
                        break current;
                    }
                    // Inside an array or block literal, not a call.
                    return;
                }
            }
            it = current.prev();
        };

        let bracket_pos = bracket.token().position;

        // Identify the receiver: `Class(` is an implicit `.new`, a name may
        // carry a `Class.` qualifier one step further left.
        let mut class_name = None;
        let mut method_name = None;
        if let Some(before) = bracket.prev() {
            match before.token().kind {
                TokenKind::Class => {
                    class_name = Some(token_text(buffer, before.token()));
                    method_name = Some("new".to_owned());
                }
                TokenKind::Name => {
                    method_name = Some(token_text(buffer, before.token()));
                    if let Some(dot) = before.prev() {
                        if dot.token().character == Some('.') {
                            if let Some(object) = dot.prev() {
                                if object.token().kind == TokenKind::Class {
                                    class_name = Some(token_text(buffer, object.token()));
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        let Some(method_name) = method_name else { return };

        debug!(
            class = class_name.as_deref().unwrap_or(""),
            method = %method_name,
            arg = arg_pos,
            "call hint: found call"
        );

        if let Some(top) = self.frames.last() {
            if top.bracket == bracket_pos {
                if !force {
                    // Already tracked; the per-cursor-move update keeps the
                    // hint current.
                    return;
                }
                debug!("call hint: forced re-trigger, popping current call");
                self.frames.pop();
                sink.hide_argument_hint();
            }
        }

        debug_assert!(self.frames.last().is_none_or(|f| f.bracket < bracket_pos));
        self.frames.push(CallFrame { bracket: bracket_pos, method: None });

        let method = match class_name {
            Some(class_name) => {
                let Some(class) = db.find_class(&class_name) else {
                    debug!(class = %class_name, "call hint: class not found");
                    return;
                };
                find_class_method(db, class, &method_name)
            }
            None => match db.methods_named(&method_name) {
                [] => {
                    debug!(method = %method_name, "call hint: no method matches");
                    return;
                }
                [only] => Some(*only),
                many => {
                    let items: Vec<_> = many
                        .iter()
                        .map(|&id| Candidate {
                            text: method_name.clone(),
                            label: format!("{} ({})", method_name, db.owner_name(id)),
                            method: Some(id),
                        })
                        .collect();
                    match sink.choose_one(&items, bracket_pos) {
                        Some(index) => items.get(index).and_then(|c| c.method),
                        // Dismissed chooser: the frame stays unresolved.
                        None => return,
                    }
                }
            },
        };

        if method.is_some() {
            if let Some(top) = self.frames.last_mut() {
                top.method = method;
            }
            self.update(cursor, db, buffer, sink);
        }
    }

    /// Recompute the stack against the cursor and render the hint for the
    /// topmost surviving frame whose method has arguments.
    pub fn update<B, S>(&mut self, cursor: usize, db: &SymbolDatabase, buffer: &B, sink: &mut S)
    where
        B: TokenSource + EditorBuffer + ?Sized,
        S: DisplaySink + ?Sized,
    {
        let tokens = buffer.tokens();
        let mut index = self.frames.len();
        while index > 0 {
            index -= 1;
            let frame = self.frames[index];

            if frame.bracket >= cursor {
                debug!("call hint: call right of cursor, popping");
                // Not necessarily the top: frames above may have been
                // skipped as unresolved.
                self.frames.remove(index);
                continue;
            }

            let Some(bracket) = TokenCursor::right_of(tokens, frame.bracket) else {
                // The bracket token vanished under us; bookkeeping is out of
                // sync with the buffer.
                warn!("call hint: stack out of sync, clearing");
                self.frames.clear();
                break;
            };

            // Scan the argument list from the bracket to the cursor.
            let mut token = bracket.next();
            let mut level = 1i32;
            let mut positional: Option<usize> = Some(0);
            let mut named: Option<crate::tokens::Token> = None;
            while level > 0 {
                let Some(current) = token else { break };
                let t = current.token();
                if t.position >= cursor {
                    break;
                }
                if level == 1 {
                    if t.kind == TokenKind::SymbolArg {
                        // A named argument overrides positional indexing for
                        // the rest of the call.
                        named = Some(*t);
                        positional = None;
                    } else if t.character == Some(',') {
                        named = None;
                        if let Some(n) = positional.as_mut() {
                            *n += 1;
                        }
                    }
                }
                if t.kind == TokenKind::OpeningBracket {
                    level += 1;
                } else if t.kind == TokenKind::ClosingBracket {
                    level -= 1;
                }
                token = current.next();
            }

            if level <= 0 {
                debug!("call hint: call left of cursor, popping");
                self.frames.remove(index);
                continue;
            }

            let Some(method) = frame.method.map(|id| db.method(id)) else {
                debug!("call hint: unresolved call, skipping");
                continue;
            };
            if method.arguments.is_empty() {
                debug!("call hint: no arguments to show, skipping");
                continue;
            }

            let highlighted = match named {
                Some(token) => {
                    let text = token_text(buffer, &token);
                    let name = text.strip_suffix(':').unwrap_or(&text);
                    method.arguments.iter().position(|a| a.name == name)
                }
                None => positional,
            };

            debug!(method = %method.name, arg = ?highlighted, "call hint: showing");
            sink.show_argument_hint(&method.signature(), highlighted, frame.bracket);
            return;
        }

        sink.hide_argument_hint();
    }
}
