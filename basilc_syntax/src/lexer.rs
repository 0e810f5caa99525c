//! Wraps the generated `Token` stream with span tracking and a two-token
//! lookahead buffer (the parser's body-capture rule needs to see past the
//! token it is about to consume).

use std::collections::VecDeque;

use logos::Logos;

use crate::error::SyntaxError;
use crate::span::{SourceMap, Span};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub text: &'a str,
    pub span: Span,
}

type LexItem<'a> = Result<SpannedToken<'a>, SyntaxError>;

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    map: SourceMap,
    lookahead: VecDeque<LexItem<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            map: SourceMap::new(source),
            lookahead: VecDeque::new(),
        }
    }

    fn pull(&mut self) -> Option<LexItem<'a>> {
        let token = self.inner.next()?;
        let range = self.inner.span();
        let span = self.map.span_at(range.start);
        let text = &self.source[range.clone()];
        Some(match token {
            Ok(Token::Error) | Err(()) => Err(SyntaxError::UnrecognizedToken {
                text: text.to_string(),
                span,
            }),
            Ok(tok) => Ok(SpannedToken { token: tok, text, span }),
        })
    }

    fn fill(&mut self, want: usize) {
        while self.lookahead.len() < want {
            match self.pull() {
                Some(item) => self.lookahead.push_back(item),
                None => break,
            }
        }
    }

    pub fn next(&mut self) -> Option<LexItem<'a>> {
        self.fill(1);
        self.lookahead.pop_front()
    }

    pub fn peek(&mut self) -> Option<&LexItem<'a>> {
        self.fill(1);
        self.lookahead.front()
    }

    /// The token after the one `peek` returns, if any (errors collapse to
    /// `None` here since only the token *kind* matters to the caller).
    pub fn peek_second(&mut self) -> Option<Token> {
        self.fill(2);
        self.lookahead.get(1).and_then(|r| r.as_ref().ok()).map(|t| t.token.clone())
    }
}
