//! # lexer.rs
//!
//! Tokenizer for function definitions such as `f(x) = 3x^2 + sin(x)`.
//!
//! The tokenizer is parameterized by a [`Library`]: runs of letters are split
//! greedily into the library's multi-character names (functions such as
//! `sinh`, constants such as `pi`) and the keywords `if`, `otherwise`, `and`
//! and `mod`. Any other letter becomes a single-letter identifier, optionally
//! followed by digits (`x`, `x1`), so `pix` scans as `pi`, `x`.
//!
//! After scanning, every token is passed through the supplied [`TokenHook`]s
//! in order. Hooks are the extension point for reclassifying tokens.

use crate::error::{Error, Result};
use crate::library::Library;
use phf::Set;
use phf_macros::phf_set;
use std::ops::Range;

/// Words with a grammatical meaning of their own.
static KEYWORDS: Set<&'static str> = phf_set! {
    "if",
    "otherwise",
    "and",
    "mod",
};

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal, e.g. `3`, `1.5e-3`.
    Number,
    /// Name that is not a library function or multi-letter constant.
    Identifier,
    /// Name of a library constant.
    Constant,
    /// Name of a library function.
    Function,
    /// One of `if`, `otherwise`, `and`, `mod`.
    Keyword,
    /// One of `+ - * / ^ % !`.
    Operator,
    /// One of `== != < <= > >=`.
    Comparison,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `|`
    Bar,
    /// `=`
    Equals,
}

/// A classified slice of the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    span: Range<usize>,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, text: &str, span: Range<usize>) -> Self {
        Self { kind, text: text.to_string(), span }
    }

    /// Returns the classification of the token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the source text of the token.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the byte range of the token in the source.
    pub fn span(&self) -> &Range<usize> {
        &self.span
    }

    /// Returns the byte offset where the token starts.
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Returns the same token with another classification.
    pub fn with_kind(self, kind: TokenKind) -> Self {
        Self { kind, ..self }
    }

    /// Returns `true` if the token has the given kind and text.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{text} [{start}, {end})", text=self.text, start=self.span.start, end=self.span.end)
    }
}

/// Type alias for a scanned token stream.
pub type Tokens = Vec<Token>;

/// Post-processing step applied to every scanned token.
pub trait TokenHook {
    /// Returns the token to use in place of `token`.
    fn patch(&self, token: Token) -> Token;
}

impl<F> TokenHook for F
where
    F: Fn(Token) -> Token,
{
    fn patch(&self, token: Token) -> Token {
        self(token)
    }
}

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    words: Vec<(&'static str, TokenKind)>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, library: &Library) -> Self {
        let mut words: Vec<(&'static str, TokenKind)> = library.words()
            .map(|w| {
                let kind = if library.is_function(w) { TokenKind::Function } else { TokenKind::Constant };
                (w, kind)
            })
            .chain(KEYWORDS.iter().map(|&w| (w, TokenKind::Keyword)))
            .collect();
        // longest first, so that `sinh` wins over `sin`
        words.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        Self { source, pos: 0, words }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        Token::new(kind, &self.source[start..self.pos], start..self.pos)
    }

    fn number(&mut self) -> Result<Token> {
        let rest = self.rest();
        let mut len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());

        let tail = &rest[len..];
        if matches!(tail.chars().next(), Some('e' | 'E')) {
            let sign = matches!(tail.chars().nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if tail.chars().nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                let digits = &tail[digit_at..];
                len += digit_at + digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
            }
        }

        let token = self.take(TokenKind::Number, len);
        if token.text().parse::<f64>().is_err() {
            return Err(Error::InvalidNumber { text: token.text().to_string(), at: token.start() });
        }
        Ok(token)
    }

    fn word(&mut self) -> Token {
        let rest = self.rest();
        if let Some(&(word, kind)) = self.words.iter().find(|(w, _)| rest.starts_with(*w)) {
            return self.take(kind, word.len());
        }
        // a single letter, then any digits
        let digits = rest[1..].find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len() - 1);
        self.take(TokenKind::Identifier, 1 + digits)
    }

    fn symbol(&mut self, ch: char) -> Result<Token> {
        let followed_by_eq = self.peek(1) == Some('=');
        let token = match ch {
            '+' | '-' | '*' | '/' | '^' | '%' => self.take(TokenKind::Operator, 1),
            '!' if followed_by_eq => self.take(TokenKind::Comparison, 2),
            '!' => self.take(TokenKind::Operator, 1),
            '=' if followed_by_eq => self.take(TokenKind::Comparison, 2),
            '=' => self.take(TokenKind::Equals, 1),
            '<' | '>' if followed_by_eq => self.take(TokenKind::Comparison, 2),
            '<' | '>' => self.take(TokenKind::Comparison, 1),
            '(' => self.take(TokenKind::LParen, 1),
            ')' => self.take(TokenKind::RParen, 1),
            ',' => self.take(TokenKind::Comma, 1),
            ';' => self.take(TokenKind::Semicolon, 1),
            '|' => self.take(TokenKind::Bar, 1),
            _ => return Err(Error::UnexpectedCharacter { ch, at: self.pos }),
        };
        Ok(token)
    }

    fn scan(mut self) -> Result<Tokens> {
        let mut tokens = Tokens::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
                continue;
            }
            let token = match ch {
                '0'..='9' | '.' => self.number()?,
                'a'..='z' | 'A'..='Z' => self.word(),
                _ => self.symbol(ch)?,
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Splits `source` into tokens, resolving words against `library`.
pub fn scan(source: &str, library: &Library) -> Result<Tokens> {
    scan_with(source, library, &[])
}

/// Splits `source` into tokens and passes each through `hooks`, in order.
///
/// # Errors
/// - [`Error::UnexpectedCharacter`] for characters that start no token.
/// - [`Error::InvalidNumber`] for malformed numeric literals such as `1.2.3`.
pub fn scan_with(source: &str, library: &Library, hooks: &[&dyn TokenHook]) -> Result<Tokens> {
    let tokens = Scanner::new(source, library).scan()?;
    let tokens: Tokens = tokens.into_iter()
        .map(|token| hooks.iter().fold(token, |token, hook| hook.patch(token)))
        .collect();
    log::trace!("scanned {} tokens from {:?}", tokens.len(), source);
    Ok(tokens)
}
