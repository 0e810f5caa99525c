//! The `Term` syntax tree — the external interface contract between this
//! crate and the `basilc` core.
//!
//! `basilc`'s core never looks past this type: it consumes whatever `Term`
//! tree a front end hands it. Kept deliberately flat (no operator nodes):
//! precedence is resolved by this crate's parser when it groups operator
//! applications into nested `Block`s, not by the core's elaborator, which
//! only ever sees already-grouped terms (see `parser::expr` for why).
//!
//! `Block`'s members are pushed onto the core's expression stack left to
//! right, so the shape of a block encodes how its pieces interact:
//!
//! - `[lhs, Variable(op), rhs]` — a binary operator application; `op` is
//!   looked up and interacts with `lhs` already on the stack, then `rhs`
//!   completes it.
//! - `[Variable(op), operand]` — unary prefix application.
//! - `[callee, arg]` — juxtaposition function application (`f x`).
//! - `[Variable(marker), ..]` where `marker` is a reserved, unbindable name
//!   (`let`, `if`, `while`, `lambda`, `annotate`, `array`, `index`) — a
//!   special form the parser resolved statically. This mirrors how the
//!   language's own surface syntax desugars `->`, `=` and `:` into
//!   synthetic marker terms rather than dedicated node kinds.
//!
//! A `Program` is a `;`-joined statement sequence using the fallthrough
//! rule in spec §4.4: each non-final statement must evaluate to the
//! `Incomplete` meta value to continue; the first statement that doesn't
//! (an `if` whose condition was true) short-circuits the whole sequence.

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    Integer(i64),
    Rational(f64),
    String(String),
    Char(char),
    Bool(bool),
    Void,
    Empty,
    Variable(String),
    Block(Vec<Term>),
    Program(Vec<Term>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub span: Span,
}

impl Term {
    pub fn new(kind: TermKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::new(TermKind::Variable(name.into()), span)
    }

    pub fn block(children: Vec<Term>, span: Span) -> Self {
        Self::new(TermKind::Block(children), span)
    }

    /// A 3-element `[lhs, op, rhs]` grouping, the shape every binary
    /// operator application takes once the parser has resolved precedence.
    pub fn binary(op: &str, lhs: Term, rhs: Term, span: Span) -> Self {
        Self::block(vec![lhs, Term::var(op, span), rhs], span)
    }

    pub fn unary(op: &str, operand: Term, span: Span) -> Self {
        Self::block(vec![Term::var(op, span), operand], span)
    }

    /// A reserved-marker special form: `[Variable(marker), ...rest]`.
    pub fn marker(marker: &str, rest: Vec<Term>, span: Span) -> Self {
        let mut children = vec![Term::var(marker, span)];
        children.extend(rest);
        Self::block(children, span)
    }
}
