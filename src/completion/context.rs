//! Completion-context classification.
//!
//! Given the token immediately left of the cursor, decide whether a
//! completion trigger applies and which of the four completion kinds it is.
//! This is a purely local, cursor-anchored analysis: no parsing beyond a
//! handful of adjacent tokens.

use tracing::debug;

use crate::editor::EditorBuffer;
use crate::tokens::{Token, TokenCursor, TokenKind, TokenSource, token_text};

/// Minimum typed prefix before a class or unqualified method completion
/// fires. Class names are classifiable by token kind alone, but short
/// prefixes produce too much noise; receiver-less method lookups need the
/// same bound to keep the candidate set manageable.
pub const MIN_PREFIX_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Partially typed class name.
    Class,
    /// Method call on a named class (class-side methods).
    ClassMethod,
    /// Method call with no known receiver type (flattened method table).
    Method,
    /// Method call on a literal or pseudo-variable of inferable class.
    InferredObjectMethod,
}

/// One classified completion trigger; lives for the duration of a session.
#[derive(Debug, Clone)]
pub struct CompletionContext {
    pub kind: CompletionKind,
    /// Start of the editable span being completed.
    pub pos: usize,
    /// Current length of the span; updated as the user types.
    pub len: usize,
    /// Earliest position past which an edit invalidates the whole context.
    /// Edits at or after it only re-narrow the filter.
    pub context_pos: usize,
    /// Prefix used for the candidate lookup: the first characters of the
    /// typed fragment, or the receiver text for qualified completions.
    pub base: String,
    /// Live filter text (the full typed fragment).
    pub text: String,
    /// Receiver token kind, for [`CompletionKind::InferredObjectMethod`].
    pub receiver_kind: Option<TokenKind>,
}

/// First `MIN_PREFIX_LEN` characters of a fragment.
fn anchored_prefix(text: &str) -> String {
    text.chars().take(MIN_PREFIX_LEN).collect()
}

/// Classify the completion context at `cursor`, or `None` when no trigger
/// heuristic recognizes a valid context.
pub fn classify<B>(buffer: &B, cursor: usize) -> Option<CompletionContext>
where
    B: TokenSource + EditorBuffer + ?Sized,
{
    let tokens = buffer.tokens();
    let trigger_cursor = TokenCursor::containing(tokens, cursor.checked_sub(1)?)?;
    let trigger = *trigger_cursor.token();

    if trigger.kind == TokenKind::Class {
        return classify_class(buffer, &trigger);
    }

    // Attempt to parse a method-call expression ending at the cursor: find
    // the dot and the receiver token left of it.
    let mut receiver: Option<Token> = None;
    let mut method: Option<Token> = None;
    let dot;

    if trigger.character == Some('.') {
        dot = trigger;
        let object = trigger_cursor.prev()?;
        match object.token().kind {
            TokenKind::Class
            | TokenKind::Char
            | TokenKind::String
            | TokenKind::Builtin
            | TokenKind::Float => receiver = Some(*object.token()),
            _ => {
                debug!("completion: no valid receiver left of dot");
                return None;
            }
        }
        // A method fragment only counts when glued to the dot.
        if let Some(next) = trigger_cursor.next() {
            let candidate = next.token();
            if candidate.kind.is_name_like() && candidate.position == dot.end() {
                method = Some(*candidate);
            }
        }
    } else if trigger.kind.is_name_like() {
        method = Some(trigger);
        let dot_cursor = trigger_cursor.prev()?;
        if dot_cursor.token().character != Some('.') {
            return None;
        }
        dot = *dot_cursor.token();
        if let Some(object) = dot_cursor.prev() {
            match object.token().kind {
                TokenKind::Class
                | TokenKind::Char
                | TokenKind::Symbol
                | TokenKind::String
                | TokenKind::Builtin
                | TokenKind::Float => receiver = Some(*object.token()),
                _ => {}
            }
        }
    } else {
        return None;
    }

    let receiver_is_class = receiver.map(|t| t.kind == TokenKind::Class).unwrap_or(false);

    // An unqualified method-name completion needs a bounding prefix.
    if receiver.is_none() && method.map(|t| t.length).unwrap_or(0) < MIN_PREFIX_LEN {
        return None;
    }

    let (pos, len, text) = match method {
        Some(m) => (m.position, m.length, token_text(buffer, &m)),
        None => (dot.end(), 0, String::new()),
    };

    let context = match receiver {
        Some(object) if receiver_is_class => CompletionContext {
            kind: CompletionKind::ClassMethod,
            pos,
            len,
            context_pos: pos,
            base: token_text(buffer, &object),
            text,
            receiver_kind: None,
        },
        Some(object) => CompletionContext {
            kind: CompletionKind::InferredObjectMethod,
            pos,
            len,
            context_pos: pos,
            base: token_text(buffer, &object),
            text,
            receiver_kind: Some(object.kind),
        },
        None => {
            let base = anchored_prefix(&text);
            CompletionContext {
                kind: CompletionKind::Method,
                pos,
                len,
                context_pos: pos + base.len(),
                base,
                text,
                receiver_kind: None,
            }
        }
    };

    debug!(kind = ?context.kind, base = %context.base, "completion context classified");
    Some(context)
}

fn classify_class<B>(buffer: &B, trigger: &Token) -> Option<CompletionContext>
where
    B: TokenSource + EditorBuffer + ?Sized,
{
    if trigger.length < MIN_PREFIX_LEN {
        return None;
    }
    let text = token_text(buffer, trigger);
    let base = anchored_prefix(&text);
    let context_pos = trigger.position + base.len();
    Some(CompletionContext {
        kind: CompletionKind::Class,
        pos: trigger.position,
        len: trigger.length,
        context_pos,
        base,
        text,
        receiver_kind: None,
    })
}
