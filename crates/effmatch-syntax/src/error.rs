//! Errors from the lexer and parser.

use derive_more::Display;
use effmatch_core::Span;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Clone, Display, Debug, PartialEq)]
#[display("{kind}")]
pub struct ParseError {
    pub span: Span,
    kind: Box<ParseErrorKind>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            span,
            kind: Box::new(kind),
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub(crate) fn unexpected(expected: impl Into<String>, found: impl ToString, span: Span) -> Self {
        Self::new(
            ParseErrorKind::Unexpected {
                expected: expected.into(),
                found: found.to_string(),
            },
            span,
        )
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum ParseErrorKind {
    #[display("unexpected character `{_0}`")]
    UnexpectedChar(char),

    #[display("unterminated string literal")]
    UnterminatedString,

    #[display("unterminated comment")]
    UnterminatedComment,

    #[display("invalid character literal")]
    InvalidChar,

    #[display("invalid escape sequence `\\{_0}`")]
    InvalidEscape(char),

    #[display("integer literal `{_0}` is out of range")]
    IntOutOfRange(String),

    #[display("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },
}

impl std::error::Error for ParseError {}
