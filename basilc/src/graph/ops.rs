//! The binary/unary operator families, flattened into two kind-tagged
//! enums rather than one node variant per operator.

use crate::meta::{ops as meta_ops, Meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Join,
    Cons,
    Range,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOpKind {
    Not,
    Reference,
    Print,
    Typeof,
}

impl BinOpKind {
    /// Compile-time evaluation table; `None` means "not foldable" (one or
    /// both operands aren't constants of compatible shape).
    pub fn eval_meta(self, lhs: &Meta, rhs: &Meta) -> Option<Meta> {
        match self {
            BinOpKind::Add => meta_ops::add(lhs, rhs),
            BinOpKind::Sub => meta_ops::sub(lhs, rhs),
            BinOpKind::Mul => meta_ops::mul(lhs, rhs),
            BinOpKind::Div => meta_ops::div(lhs, rhs),
            BinOpKind::Mod => meta_ops::rem(lhs, rhs),
            BinOpKind::And => meta_ops::bool_and(lhs, rhs),
            BinOpKind::Or => meta_ops::bool_or(lhs, rhs),
            BinOpKind::Xor => meta_ops::bool_xor(lhs, rhs),
            BinOpKind::Eq => meta_ops::cmp_eq(lhs, rhs),
            BinOpKind::Neq => meta_ops::cmp_eq(lhs, rhs).and_then(meta_ops::bool_not),
            BinOpKind::Lt => meta_ops::cmp_lt(lhs, rhs),
            BinOpKind::Le => meta_ops::cmp_le(lhs, rhs),
            BinOpKind::Gt => meta_ops::cmp_lt(rhs, lhs),
            BinOpKind::Ge => meta_ops::cmp_le(rhs, lhs),
            BinOpKind::Join => meta_ops::join(lhs, rhs),
            BinOpKind::Cons => Some(meta_ops::cons(lhs.clone(), rhs.clone())),
            BinOpKind::Range | BinOpKind::Repeat => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::And => "&&",
            BinOpKind::Or => "||",
            BinOpKind::Xor => "^",
            BinOpKind::Eq => "==",
            BinOpKind::Neq => "!=",
            BinOpKind::Lt => "<",
            BinOpKind::Le => "<=",
            BinOpKind::Gt => ">",
            BinOpKind::Ge => ">=",
            BinOpKind::Join => "&",
            BinOpKind::Cons => "::",
            BinOpKind::Range => "..",
            BinOpKind::Repeat => "**",
        }
    }
}

impl UnOpKind {
    pub fn eval_meta(self, operand: &Meta) -> Option<Meta> {
        match self {
            UnOpKind::Not => meta_ops::bool_not(operand.clone()),
            UnOpKind::Reference | UnOpKind::Print | UnOpKind::Typeof => None,
        }
    }
}
