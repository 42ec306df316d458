//! Lexer for `OpenQASM` 2.0.
//!
//! Scanning is driven by a [`logos`] state machine over raw lexemes. Each raw
//! lexeme is then classified into a public [`TokenKind`], keyword lookup is
//! applied to the completed identifier, and row/column positions are tracked
//! over every consumed character.

use std::fmt;

use logos::Logos;
use serde::{Deserialize, Serialize};

/// Raw lexemes recognised by the scanner.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Raw {
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    Comment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9][0-9_]*")]
    Integer,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    Real,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?\.")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?\.")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+\.")]
    MalformedReal,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r#""([^"\\]|\\.)*"#)]
    UnterminatedString,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("==")]
    EqEq,

    #[token("+")]
    Plus,

    #[token("-")]
    #[token("\u{2212}")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("**")]
    #[token("=")]
    InvalidOperator,
}

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// End of input. Repeated once reached.
    EndMarker,
    /// Malformed lexeme; the token's `error` holds the diagnostic.
    Error,
    /// `// ...` up to end of line.
    Comment,
    /// Spaces, tabs and newlines.
    Whitespace,
    Identifier,
    Integer,
    Real,
    /// Double-quoted string; the token value is unescaped.
    String,
    Comma,
    Semicolon,
    Arrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    EqEq,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    // Keywords
    OpenQasm,
    Include,
    QReg,
    CReg,
    Gate,
    Opaque,
    If,
    Barrier,
    Measure,
    Reset,
    U,
    CX,
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl TokenKind {
    /// Look up a completed identifier lexeme in the keyword table.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "OPENQASM" => TokenKind::OpenQasm,
            "include" => TokenKind::Include,
            "qreg" => TokenKind::QReg,
            "creg" => TokenKind::CReg,
            "gate" => TokenKind::Gate,
            "opaque" => TokenKind::Opaque,
            "if" => TokenKind::If,
            "barrier" => TokenKind::Barrier,
            "measure" => TokenKind::Measure,
            "reset" => TokenKind::Reset,
            "U" => TokenKind::U,
            "CX" => TokenKind::CX,
            "sin" => TokenKind::Sin,
            "cos" => TokenKind::Cos,
            "tan" => TokenKind::Tan,
            "exp" => TokenKind::Exp,
            "ln" => TokenKind::Ln,
            "sqrt" => TokenKind::Sqrt,
            _ => return None,
        };
        Some(kind)
    }

    /// Tokens the parser never sees.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::EndMarker => "end of input",
            TokenKind::Error => "error",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Identifier => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::Real => "real",
            TokenKind::String => "string",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Arrow => "'->'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::EqEq => "'=='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Caret => "'^'",
            TokenKind::OpenQasm => "'OPENQASM'",
            TokenKind::Include => "'include'",
            TokenKind::QReg => "'qreg'",
            TokenKind::CReg => "'creg'",
            TokenKind::Gate => "'gate'",
            TokenKind::Opaque => "'opaque'",
            TokenKind::If => "'if'",
            TokenKind::Barrier => "'barrier'",
            TokenKind::Measure => "'measure'",
            TokenKind::Reset => "'reset'",
            TokenKind::U => "'U'",
            TokenKind::CX => "'CX'",
            TokenKind::Sin => "'sin'",
            TokenKind::Cos => "'cos'",
            TokenKind::Tan => "'tan'",
            TokenKind::Exp => "'exp'",
            TokenKind::Ln => "'ln'",
            TokenKind::Sqrt => "'sqrt'",
        };
        f.write_str(s)
    }
}

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    /// The first character of a source text.
    pub const START: Position = Position { row: 1, col: 1 };

    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// A positioned token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the lexeme. Strings are unquoted and unescaped.
    pub value: String,
    pub start_pos: Position,
    /// Position of the last character (inclusive).
    pub end_pos: Position,
    /// Diagnostic for [`TokenKind::Error`] tokens.
    pub error: Option<String>,
}

impl Token {
    /// An end-of-input marker at `pos`.
    pub fn end_marker(pos: Position) -> Self {
        Token {
            kind: TokenKind::EndMarker,
            value: String::new(),
            start_pos: pos,
            end_pos: pos,
            error: None,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start_pos, self.kind)?;
        if !self.value.is_empty() {
            write!(f, " {:?}", self.value)?;
        }
        if let Some(err) = &self.error {
            write!(f, " ({err})")?;
        }
        Ok(())
    }
}

/// Streaming lexer over a source string.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, Raw>,
    pos: Position,
}

impl<'src> Lexer<'src> {
    /// Create a lexer positioned at the start of `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: Raw::lexer(source),
            pos: Position::START,
        }
    }

    /// Produce the next token. Returns [`TokenKind::EndMarker`] forever once
    /// the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        let Some(raw) = self.inner.next() else {
            return Token::end_marker(self.pos);
        };
        let slice = self.inner.slice();
        let start_pos = self.pos;
        let mut end_pos = self.pos;
        for c in slice.chars() {
            end_pos = self.pos;
            self.pos.advance(c);
        }

        let (kind, value, error) = match raw {
            Ok(raw) => classify(raw, slice),
            Err(()) => (
                TokenKind::Error,
                slice.to_string(),
                Some("unexpected character".to_string()),
            ),
        };

        Token {
            kind,
            value,
            start_pos,
            end_pos,
            error,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::EndMarker).then_some(token)
    }
}

fn classify(raw: Raw, slice: &str) -> (TokenKind, String, Option<String>) {
    let kind = match raw {
        Raw::Whitespace => TokenKind::Whitespace,
        Raw::Comment => TokenKind::Comment,
        Raw::Identifier => TokenKind::keyword(slice).unwrap_or(TokenKind::Identifier),
        Raw::Integer => TokenKind::Integer,
        Raw::Real => TokenKind::Real,
        Raw::String => {
            let body = &slice[1..slice.len() - 1];
            return (TokenKind::String, unescape(body), None);
        }
        Raw::MalformedReal => return error(slice, "invalid numeric constant"),
        Raw::UnterminatedString => return error(slice, "unterminated string literal"),
        Raw::InvalidOperator => return error(slice, "invalid operator"),
        Raw::Comma => TokenKind::Comma,
        Raw::Semicolon => TokenKind::Semicolon,
        Raw::Arrow => TokenKind::Arrow,
        Raw::LParen => TokenKind::LParen,
        Raw::RParen => TokenKind::RParen,
        Raw::LBracket => TokenKind::LBracket,
        Raw::RBracket => TokenKind::RBracket,
        Raw::LBrace => TokenKind::LBrace,
        Raw::RBrace => TokenKind::RBrace,
        Raw::EqEq => TokenKind::EqEq,
        Raw::Plus => TokenKind::Plus,
        Raw::Minus => TokenKind::Minus,
        Raw::Star => TokenKind::Star,
        Raw::Slash => TokenKind::Slash,
        Raw::Caret => TokenKind::Caret,
    };
    (kind, slice.to_string(), None)
}

fn error(slice: &str, message: &str) -> (TokenKind, String, Option<String>) {
    (
        TokenKind::Error,
        slice.to_string(),
        Some(message.to_string()),
    )
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Tokenize a whole source string, trivia included, ending with a single
/// [`TokenKind::EndMarker`].
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is(TokenKind::EndMarker);
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
