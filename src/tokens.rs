//! Token stream contract between the host editor and the engine.
//!
//! Tokenization itself belongs to the editor: the engine only consumes an
//! ordered snapshot of tokens over the current buffer contents, anchored at
//! byte positions. After an edit the host is responsible for re-tokenizing
//! before delivering the next event.

use std::borrow::Cow;

use crate::editor::EditorBuffer;

/// Lexical category of a token, as reported by the editor's tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Keyword,
    Builtin,
    /// Class name (capitalized identifier by lexical convention).
    Class,
    String,
    Char,
    Symbol,
    /// Numeric literal. Integer-looking text is still reported as Float;
    /// the engine inspects the text for a decimal point where it matters.
    Float,
    OpeningBracket,
    ClosingBracket,
    /// Named-argument label followed by a colon, e.g. `freq:`.
    SymbolArg,
    Unknown,
}

impl TokenKind {
    /// Kinds that can act as a method-name fragment: plain names, keywords
    /// and builtins all tokenize identifier-shaped text.
    pub fn is_name_like(self) -> bool {
        matches!(self, TokenKind::Name | TokenKind::Keyword | TokenKind::Builtin)
    }
}

/// Immutable token snapshot produced by the external tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The character, for single-character tokens (brackets, dots, commas).
    pub character: Option<char>,
    /// Absolute byte position of the token start in the buffer.
    pub position: usize,
    /// Byte length of the token.
    pub length: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.position + self.length
    }
}

/// Read access to the token snapshot of a buffer.
///
/// Tokens must be reported in ascending position order without overlap. The
/// snapshot must stay valid for the duration of the event being processed.
pub trait TokenSource {
    fn tokens(&self) -> &[Token];
}

/// Bidirectional cursor over a token snapshot.
///
/// A cursor is a cheap copyable index; stepping off either end yields `None`
/// rather than an invalid cursor.
#[derive(Debug, Clone, Copy)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenCursor<'a> {
    /// Cursor at the token whose span contains byte position `pos`.
    pub fn containing(tokens: &'a [Token], pos: usize) -> Option<Self> {
        let index = tokens
            .iter()
            .position(|t| t.position <= pos && pos < t.end())?;
        Some(Self { tokens, index })
    }

    /// Cursor at the nearest token starting left of `pos`.
    pub fn left_of(tokens: &'a [Token], pos: usize) -> Option<Self> {
        let index = tokens.iter().rposition(|t| t.position < pos)?;
        Some(Self { tokens, index })
    }

    /// Cursor at the nearest token starting at or right of `pos`.
    pub fn right_of(tokens: &'a [Token], pos: usize) -> Option<Self> {
        let index = tokens.iter().position(|t| t.position >= pos)?;
        Some(Self { tokens, index })
    }

    pub fn token(&self) -> &'a Token {
        &self.tokens[self.index]
    }

    pub fn prev(&self) -> Option<Self> {
        let index = self.index.checked_sub(1)?;
        Some(Self { tokens: self.tokens, index })
    }

    pub fn next(&self) -> Option<Self> {
        let index = self.index + 1;
        if index < self.tokens.len() {
            Some(Self { tokens: self.tokens, index })
        } else {
            None
        }
    }
}

/// Text of a token, read back from the buffer.
pub fn token_text<B: EditorBuffer + ?Sized>(buffer: &B, token: &Token) -> String {
    buffer.text_range(token.position, token.end()).into_owned()
}

/// Reference implementation of the buffer-side contracts.
///
/// Holds the buffer text together with its token snapshot. Used by the test
/// suite and by embedders that do not bring their own buffer type. A
/// `replace_range` invalidates the token snapshot; re-tokenization is the
/// caller's responsibility, as with any other buffer.
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer {
    text: String,
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Self {
        let buffer = Self { text: text.into(), tokens };
        debug_assert!(
            buffer
                .tokens
                .windows(2)
                .all(|w| w[0].end() <= w[1].position),
            "tokens must be ordered and non-overlapping"
        );
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }
}

impl TokenSource for TokenBuffer {
    fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl EditorBuffer for TokenBuffer {
    fn text_range(&self, start: usize, end: usize) -> Cow<'_, str> {
        let end = end.min(self.text.len());
        let start = start.min(end);
        Cow::Borrowed(&self.text[start..end])
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.text.replace_range(start..end, text);
        // The token snapshot is stale from here on.
        self.tokens.clear();
    }
}
