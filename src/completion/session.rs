//! One active completion session: span tracking, incremental filtering and
//! candidate acceptance.
//!
//! A session owns the classified context plus the resolved candidate list.
//! Edits inside the span re-narrow (or widen) the filter; edits before the
//! context anchor and cursor moves outside the span terminate the session.
//! The menu is a derived rendering: the filtered, sorted list is pushed to
//! the display sink whole on every change.

use tracing::debug;

use crate::editor::{DisplaySink, EditorBuffer};
use crate::tokens::{TokenCursor, TokenKind, TokenSource, token_text};

use super::context::CompletionContext;
use super::resolve::Candidate;

#[derive(Debug)]
pub struct CompletionSession {
    context: CompletionContext,
    /// Live filter text; starts as the typed fragment from classification.
    filter: String,
    /// All resolved candidates, sorted by insert text.
    candidates: Vec<Candidate>,
    /// Indices into `candidates` passing the current filter.
    visible: Vec<usize>,
    /// Index into `visible` of the highlighted row.
    selected: usize,
}

impl CompletionSession {
    pub fn new(context: CompletionContext, mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| a.text.cmp(&b.text));
        let filter = context.text.clone();
        Self { context, filter, candidates, visible: Vec::new(), selected: 0 }
    }

    pub fn context(&self) -> &CompletionContext {
        &self.context
    }

    /// Candidates currently passing the filter, in display order.
    pub fn visible_candidates(&self) -> Vec<Candidate> {
        self.visible.iter().map(|&i| self.candidates[i].clone()).collect()
    }

    /// Move the highlight; out-of-range indices are clamped.
    pub fn set_selected(&mut self, index: usize) {
        if !self.visible.is_empty() {
            self.selected = index.min(self.visible.len() - 1);
        }
    }

    fn selected_candidate(&self) -> Option<&Candidate> {
        self.visible.get(self.selected).map(|&i| &self.candidates[i])
    }

    /// Recompute the filtered list and render it. Without `force` the menu
    /// only shows when the top match still differs from what the user has
    /// already typed.
    pub fn update_menu<S: DisplaySink + ?Sized>(&mut self, force: bool, sink: &mut S) {
        self.visible = (0..self.candidates.len())
            .filter(|&i| self.candidates[i].text.starts_with(&self.filter))
            .collect();
        self.selected = 0;

        match self.visible.first() {
            Some(&top) if force || self.candidates[top].text != self.filter => {
                let items = self.visible_candidates();
                sink.show_candidates(&items, self.selected, self.context.pos);
            }
            _ => sink.hide_candidates(),
        }
    }

    /// React to a content change at `pos`. Returns `false` when the session
    /// must terminate (the structural anchor changed).
    pub fn on_content_changed<B, S>(&mut self, pos: usize, buffer: &B, sink: &mut S) -> bool
    where
        B: TokenSource + EditorBuffer + ?Sized,
        S: DisplaySink + ?Sized,
    {
        if pos < self.context.context_pos {
            debug!("completion off: context changed");
            return false;
        }
        if pos <= self.context.pos + self.context.len {
            // Re-read the live token at the span start; a fully backspaced
            // trigger leaves an empty filter rather than ending the session.
            match TokenCursor::containing(buffer.tokens(), self.context.pos) {
                Some(cursor)
                    if cursor.token().kind == TokenKind::Class
                        || cursor.token().kind.is_name_like() =>
                {
                    self.context.len = cursor.token().length;
                    self.filter = token_text(buffer, cursor.token());
                }
                _ => {
                    self.context.len = 0;
                    self.filter.clear();
                }
            }
            self.update_menu(false, sink);
        }
        true
    }

    /// React to a cursor move. Returns `false` when the cursor left the
    /// completion span and the session must terminate.
    pub fn on_cursor_moved(&mut self, cursor: usize) -> bool {
        if cursor < self.context.pos || cursor > self.context.pos + self.context.len {
            debug!("completion off: out of bounds");
            return false;
        }
        true
    }

    /// Insert the selected candidate over the span. Returns `true` when the
    /// buffer was mutated and the session is done. With no visible
    /// selection this is a no-op and the session stays open: the menu may be
    /// hidden because the filter matched zero rows, not because the user
    /// cancelled.
    pub fn accept<B: EditorBuffer + ?Sized>(&mut self, buffer: &mut B) -> bool {
        let Some(candidate) = self.selected_candidate() else {
            return false;
        };
        if candidate.text.is_empty() {
            return false;
        }
        let text = candidate.text.clone();
        debug!(completion = %text, "completion accepted");
        buffer.replace_range(self.context.pos, self.context.pos + self.context.len, &text);
        true
    }
}
