//! Live completion and call-hint engine for the Quaver scripting language IDE.
//!
//! The crate is editor-agnostic: the host delivers key-press, content-change
//! and cursor-change events together with a token stream over the current
//! buffer, and supplies a [`editor::DisplaySink`] for the candidate menu and
//! the argument-hint tooltip. The engine classifies the completion context at
//! the cursor, resolves candidates against an inheritance-aware
//! [`symbols::SymbolDatabase`], keeps the candidate list filtered as the user
//! types, and tracks nested open calls to drive the argument hint.

pub mod completion;
pub mod editor;
pub mod logging;
pub mod symbols;
pub mod tokens;
