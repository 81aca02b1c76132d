//! Completion-context inference and candidate resolution.
//!
//! This module provides:
//! - Token-walk classification of the cursor context into four completion
//!   kinds (class, class method, unqualified method, inferred object method)
//! - Candidate resolution over the inheritance-aware symbol database
//! - Incremental session filtering as the user types or moves the cursor
//! - Nested open-call tracking for the argument-hint tooltip

pub mod call_hints;
pub mod context;
pub mod resolve;
pub mod session;

pub use call_hints::{CallFrame, CallHintStack};
pub use context::{CompletionContext, CompletionKind, classify};
pub use resolve::{Candidate, resolve};
pub use session::CompletionSession;

use std::sync::Arc;

use tracing::debug;

use crate::editor::{DisplaySink, EditorBuffer, KeyInput};
use crate::symbols::SymbolDatabase;
use crate::tokens::TokenSource;

/// The event-facing completion engine for one editor view.
///
/// Owns at most one live [`CompletionSession`] and one [`CallHintStack`].
/// All operations run synchronously on the editor's event thread; the
/// database handle is shared read-only.
pub struct Completer<S: DisplaySink> {
    db: Arc<SymbolDatabase>,
    sink: S,
    session: Option<CompletionSession>,
    calls: CallHintStack,
}

impl<S: DisplaySink> Completer<S> {
    pub fn new(db: Arc<SymbolDatabase>, sink: S) -> Self {
        Self { db, sink, session: None, calls: CallHintStack::default() }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_completing(&self) -> bool {
        self.session.is_some()
    }

    pub fn call_frames(&self) -> &[CallFrame] {
        self.calls.frames()
    }

    /// Route a classified keystroke. The host applies the keystroke's edit
    /// and re-tokenizes before calling this.
    pub fn on_key<B>(&mut self, key: KeyInput, cursor: usize, buffer: &B)
    where
        B: TokenSource + EditorBuffer + ?Sized,
    {
        match key {
            KeyInput::OpenParen | KeyInput::Comma => {
                self.trigger_call_hint(false, cursor, buffer);
            }
            KeyInput::Backspace | KeyInput::Delete | KeyInput::Other => {}
            KeyInput::Char(_) => {
                if self.session.is_none() {
                    self.trigger_completion(false, cursor, buffer);
                }
            }
        }
    }

    /// Start a completion session at the cursor, or refresh the already
    /// active one (a trigger never stacks sessions).
    pub fn trigger_completion<B>(&mut self, force: bool, cursor: usize, buffer: &B)
    where
        B: TokenSource + EditorBuffer + ?Sized,
    {
        if let Some(session) = &mut self.session {
            debug!("completion already started, refreshing");
            session.update_menu(force, &mut self.sink);
            return;
        }

        let Some(context) = classify(buffer, cursor) else { return };
        let candidates = resolve(&self.db, &context);
        if candidates.is_empty() {
            return;
        }

        debug!(base = %context.base, "completion on");
        let mut session = CompletionSession::new(context, candidates);
        session.update_menu(force, &mut self.sink);
        self.session = Some(session);
    }

    /// Explicit call-hint trigger (open paren, comma, or a re-trigger
    /// command, which passes `force`).
    pub fn trigger_call_hint<B>(&mut self, force: bool, cursor: usize, buffer: &B)
    where
        B: TokenSource + EditorBuffer + ?Sized,
    {
        self.calls.trigger(force, cursor, &self.db, buffer, &mut self.sink);
    }

    /// Content-change notification: `pos` is the edit position in the
    /// re-tokenized buffer, `cursor` the cursor position after the edit.
    pub fn on_content_changed<B>(&mut self, pos: usize, cursor: usize, buffer: &B)
    where
        B: TokenSource + EditorBuffer + ?Sized,
    {
        if self.calls.handle_edit(pos) {
            self.calls.update(cursor, &self.db, buffer, &mut self.sink);
        }

        if let Some(session) = &mut self.session {
            if !session.on_content_changed(pos, buffer, &mut self.sink) {
                self.quit_completion();
            }
        }
    }

    /// Cursor-change notification.
    pub fn on_cursor_moved<B>(&mut self, cursor: usize, buffer: &B)
    where
        B: TokenSource + EditorBuffer + ?Sized,
    {
        if let Some(session) = &mut self.session {
            if !session.on_cursor_moved(cursor) {
                self.quit_completion();
            }
        }
        self.calls.update(cursor, &self.db, buffer, &mut self.sink);
    }

    /// Move the highlight in the candidate menu (host-driven navigation).
    pub fn select_candidate(&mut self, index: usize) {
        if let Some(session) = &mut self.session {
            session.set_selected(index);
        }
    }

    /// Accept the highlighted candidate: replace the completion span and end
    /// the session. With no visible selection the session stays open.
    pub fn accept<B: EditorBuffer + ?Sized>(&mut self, buffer: &mut B) {
        if let Some(session) = &mut self.session {
            if session.accept(buffer) {
                self.quit_completion();
            }
        }
    }

    /// End the session without touching the buffer.
    pub fn cancel(&mut self) {
        if self.session.is_some() {
            self.quit_completion();
        }
    }

    fn quit_completion(&mut self) {
        debug!("completion off");
        self.sink.hide_candidates();
        self.session = None;
    }
}
