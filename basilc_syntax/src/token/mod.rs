//! Token definitions for the source lexer.

mod precedence;

#[cfg(test)]
mod tests;

use logos::Logos;

pub use precedence::{Associativity, Precedence};

/// Lexical tokens.
///
/// `let`, `if`, `while` and `print` are reserved words here even though the
/// language they front-end treats them as ordinary builtin-bound names —
/// see `parser::body` for why a static keyword makes the grammar
/// unambiguous without needing the elaborator to resolve it.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[token("let")]
    KwLet,
    #[token("if")]
    KwIf,
    #[token("while")]
    KwWhile,
    #[token("print")]
    KwPrint,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
    #[token("=")]
    Assign,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("'")]
    Tick,

    #[regex(r"[0-9][0-9_]*", priority = 3)]
    Integer,
    #[regex(r"[0-9][0-9_]*\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\]|\\.)'", priority = 2)]
    Char,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    Error,
}

impl Token {
    pub fn is_body_starter(&self) -> bool {
        matches!(self, Token::KwLet | Token::KwPrint)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Token::KwLet => "'let'",
            Token::KwIf => "'if'",
            Token::KwWhile => "'while'",
            Token::KwPrint => "'print'",
            Token::True | Token::False => "a boolean literal",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Comma => "','",
            Token::Semi => "';'",
            Token::Colon => "':'",
            Token::Arrow => "'->'",
            Token::Assign => "'='",
            Token::EqEq => "'=='",
            Token::NotEq => "'!='",
            Token::LtEq => "'<='",
            Token::GtEq => "'>='",
            Token::Lt => "'<'",
            Token::Gt => "'>'",
            Token::AndAnd => "'&&'",
            Token::OrOr => "'||'",
            Token::Caret => "'^'",
            Token::Amp => "'&'",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Bang => "'!'",
            Token::Tilde => "'~'",
            Token::Tick => "'\\''",
            Token::Integer => "an integer literal",
            Token::Float => "a rational literal",
            Token::Str => "a string literal",
            Token::Char => "a character literal",
            Token::Ident => "an identifier",
            Token::Error => "an unrecognized token",
        }
    }
}
