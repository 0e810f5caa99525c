//! Errors produced while turning source text into a `Term` tree.

use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("{span:?}: unrecognized character {text:?}")]
    UnrecognizedToken { text: String, span: Span },

    #[error("{span:?}: unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("{span:?}: unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("{span:?}: invalid escape sequence '\\{escape}'")]
    InvalidEscape { escape: char, span: Span },

    #[error("{span:?}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("{span:?}: a lambda match must be a name or a name:type pair")]
    InvalidMatch { span: Span },
}

pub type SyntaxResult<T> = Result<T, SyntaxError>;
