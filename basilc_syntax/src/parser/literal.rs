//! Decodes literal token text into the values `Term` carries.

use crate::error::{SyntaxError, SyntaxResult};
use crate::span::Span;

pub fn decode_integer(text: &str, span: Span) -> SyntaxResult<i64> {
    text.replace('_', "")
        .parse()
        .map_err(|_| SyntaxError::UnexpectedToken {
            expected: "an integer literal".into(),
            found: text.to_string(),
            span,
        })
}

pub fn decode_float(text: &str, span: Span) -> SyntaxResult<f64> {
    text.replace('_', "")
        .parse()
        .map_err(|_| SyntaxError::UnexpectedToken {
            expected: "a rational literal".into(),
            found: text.to_string(),
            span,
        })
}

pub fn decode_string(text: &str, span: Span) -> SyntaxResult<String> {
    let inner = &text[1..text.len() - 1];
    unescape(inner, span)
}

pub fn decode_char(text: &str, span: Span) -> SyntaxResult<char> {
    let inner = &text[1..text.len() - 1];
    let decoded = unescape(inner, span)?;
    decoded
        .chars()
        .next()
        .ok_or(SyntaxError::UnterminatedChar { span })
}

fn unescape(raw: &str, span: Span) -> SyntaxResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or(SyntaxError::UnterminatedString { span })?;
        out.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            other => return Err(SyntaxError::InvalidEscape { escape: other, span }),
        });
    }
    Ok(out)
}
