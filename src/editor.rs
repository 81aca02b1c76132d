//! Host editor contracts: buffer mutation, key classification and the
//! display sink.
//!
//! The engine never talks to a widget toolkit. Key-driven triggers arrive as
//! pre-classified [`KeyInput`] values, and everything the user sees goes
//! through [`DisplaySink`], which the host implements on top of whatever
//! popup and tooltip machinery it has.

use std::borrow::Cow;

use crate::completion::Candidate;

/// Read and mutate access to the editable buffer.
///
/// `replace_range` is the only way the engine mutates buffer content, used
/// solely when a completion candidate is accepted.
pub trait EditorBuffer {
    fn text_range(&self, start: usize, end: usize) -> Cow<'_, str>;
    fn replace_range(&mut self, start: usize, end: usize, text: &str);
}

/// Classification of a keystroke, produced by the host before delivery.
///
/// The host applies the keystroke's edit and re-tokenizes first; the engine
/// then reacts to the classified input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// `(` was typed: trigger the call-hint aid.
    OpenParen,
    /// `,` was typed: trigger the call-hint aid.
    Comma,
    /// Deletion keys never start a completion on their own.
    Backspace,
    Delete,
    /// Any other text-producing keystroke.
    Char(char),
    /// Navigation and other non-text keys.
    Other,
}

/// Display surface for the candidate menu and the argument-hint tooltip.
///
/// The engine treats the display as a derived rendering: it pushes the full
/// filtered list on every change rather than mutating widget state
/// incrementally. `choose_one` is the single modal suspension point of the
/// engine: it must block until the user picks an item or dismisses the
/// chooser.
pub trait DisplaySink {
    /// Show the candidate menu anchored at buffer position `anchor`, with
    /// `selected` (an index into `items`) pre-selected.
    fn show_candidates(&mut self, items: &[Candidate], selected: usize, anchor: usize);

    fn hide_candidates(&mut self);

    /// Modal choice between ambiguous items. `None` means dismissed.
    fn choose_one(&mut self, items: &[Candidate], anchor: usize) -> Option<usize>;

    /// Show the argument hint for the call at `anchor`. `highlighted` is the
    /// index of the argument to emphasize, if any resolved.
    fn show_argument_hint(&mut self, signature: &str, highlighted: Option<usize>, anchor: usize);

    fn hide_argument_hint(&mut self);
}
