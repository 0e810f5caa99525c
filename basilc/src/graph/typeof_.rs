//! `type_of(node)`: the static type of a graph node, memoized per-slot.

use super::ops::{BinOpKind, UnOpKind};
use super::{entry, is_lvalue, Node, NodeId};
use crate::error::{CompileError, Phase};
use crate::session::CompileSession;
use crate::types::{Constraint, Type, TypeId};
use basilc_syntax::TermKind;

/// Computes (and caches) the static type of `id` as evaluated in `scope`.
pub fn type_of(session: &mut CompileSession, scope: crate::env::StackId, id: NodeId) -> TypeId {
    if let Some(cached) = session.graph.get(id).ty_cache.get() {
        return cached;
    }
    let ty = compute(session, scope, id);
    session.graph.get(id).ty_cache.set(Some(ty));
    ty
}

fn compute(session: &mut CompileSession, scope: crate::env::StackId, id: NodeId) -> TypeId {
    let node = session.graph.node(id).clone();
    match node {
        Node::Void => session.void_type(),
        Node::Empty => session.empty_type(),
        Node::Int(_) => session.i64_type(),
        Node::Rational(_) => session.f64_type(),
        Node::Str(_) => session.string_type(),
        Node::CharLit(_) => session.char_type(),
        Node::BoolLit(_) => session.bool_type(),
        Node::TypeLit(_) => session.type_type(),
        Node::Var(_) => match entry(&session.graph, &session.stacks, scope, id) {
            Some((_, e)) => e.declared_type,
            None => {
                let slot = session.graph.get(id);
                let (line, col) = (slot.line, slot.col);
                session.errors.report(CompileError::new(Phase::Type, line, col, "undeclared variable"));
                session.error_type()
            }
        },
        Node::Quote(term) => term_shape_type(session, &term.kind),
        Node::Incomplete => session.error_type(),
        Node::Sequence(items) | Node::Program(items) => match items.last() {
            Some(&last) => type_of(session, scope, last),
            None => session.void_type(),
        },
        Node::Lambda { match_expr, body, arg_scope, .. } => {
            let arg_ty = type_of(session, arg_scope, match_expr);
            let constraint = match session.graph.node(match_expr) {
                Node::Define { .. } => Constraint::OfType(arg_ty),
                _ => Constraint::Unknown,
            };
            let ret_ty = match body {
                Some(b) => type_of(session, arg_scope, b),
                None => session.any_type(),
            };
            session.types.find(Type::Function { arg: arg_ty, ret: ret_ty, quoting: true, constraints: vec![constraint] })
        }
        Node::Intersect { members } => {
            let member_tys: std::collections::BTreeSet<TypeId> =
                members.iter().map(|&m| type_of(session, scope, m)).collect();
            session.types.find(Type::Intersection(member_tys))
        }
        Node::Call { callee, arg } => {
            let fn_ty = type_of(session, scope, callee);
            let arg_ty = type_of(session, scope, arg);
            match crate::env::try_apply(&session.types, fn_ty, arg_ty) {
                crate::env::ApplyResult::Resolved(resolved) => match session.types.get(resolved) {
                    Type::Function { ret, .. } => *ret,
                    _ => session.void_type(),
                },
                _ => {
                    let slot = session.graph.get(id);
                    let (line, col) = (slot.line, slot.col);
                    session.errors.report(CompileError::new(Phase::Type, line, col, "no matching overload"));
                    session.error_type()
                }
            }
        }
        Node::Define { ty, .. } => type_of(session, scope, ty),
        Node::Autodefine { src, .. } => type_of(session, scope, src),
        Node::Assign { src, .. } => type_of(session, scope, src),
        Node::If { body, scope: inner, .. } => type_of(session, inner, body),
        Node::While { .. } => session.void_type(),
        Node::Reference(inner) => {
            if !is_lvalue(&session.graph, inner) {
                let slot = session.graph.get(id);
                let (line, col) = (slot.line, slot.col);
                session.errors.report(CompileError::new(Phase::Type, line, col, "cannot take a reference to a non-lvalue"));
                return session.error_type();
            }
            let inner_ty = type_of(session, scope, inner);
            session.types.find(Type::Reference(inner_ty))
        }
        Node::Cons { head, .. } => {
            let head_ty = type_of(session, scope, head);
            session.types.find(Type::List(head_ty))
        }
        Node::Range { .. } => {
            let i64_ty = session.i64_type();
            session.types.find(Type::List(i64_ty))
        }
        Node::Repeat { value, count } => {
            let elem = type_of(session, scope, value);
            let count_hint = match session.graph.node(count) {
                Node::Int(n) => Some(*n as u32),
                _ => None,
            };
            session.types.find(Type::Array { elem, count: count_hint })
        }
        Node::Array(items) => {
            let mut elem = session.any_type();
            for (i, &item) in items.iter().enumerate() {
                let item_ty = type_of(session, scope, item);
                elem = if i == 0 { item_ty } else { session.types.join(elem, item_ty).unwrap_or(elem) };
            }
            session.types.find(Type::Array { elem, count: Some(items.len() as u32) })
        }
        Node::ArrayDef { .. } => session.type_type(),
        Node::Index { arr, .. } => {
            let arr_ty = type_of(session, scope, arr);
            let elem = match session.types.get(arr_ty) {
                Type::Array { elem, .. } => *elem,
                Type::Tuple(members) => members.first().copied().unwrap_or_else(|| session.any_type()),
                _ => session.any_type(),
            };
            session.types.find(Type::Reference(elem))
        }
        Node::Cast { dst_ty, .. } => type_of(session, scope, dst_ty),
        Node::Eval(inner) | Node::MetaEval(inner) | Node::Use(inner) => type_of(session, scope, inner),
        Node::Print(_) => session.void_type(),
        Node::Typeof(_) => session.type_type(),
        Node::BinOp { op, lhs, rhs } => binop_type(session, scope, op, lhs, rhs),
        Node::UnOp { op, operand } => unop_type(session, scope, op, operand),
    }
}

fn binop_type(session: &mut CompileSession, scope: crate::env::StackId, op: BinOpKind, lhs: NodeId, rhs: NodeId) -> TypeId {
    let lhs_ty = type_of(session, scope, lhs);
    let rhs_ty = type_of(session, scope, rhs);
    match op {
        BinOpKind::Add
        | BinOpKind::Sub
        | BinOpKind::Mul
        | BinOpKind::Div
        | BinOpKind::Mod => session.types.join(lhs_ty, rhs_ty).unwrap_or(lhs_ty),
        BinOpKind::And | BinOpKind::Or | BinOpKind::Xor => session.bool_type(),
        BinOpKind::Eq | BinOpKind::Neq | BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge => {
            session.bool_type()
        }
        BinOpKind::Join => session.types.find(Type::Tuple(vec![lhs_ty, rhs_ty])),
        BinOpKind::Cons => session.types.find(Type::List(lhs_ty)),
        BinOpKind::Range => {
            let i64_ty = session.i64_type();
            session.types.find(Type::List(i64_ty))
        }
        BinOpKind::Repeat => session.types.find(Type::Array { elem: lhs_ty, count: None }),
    }
}

fn unop_type(session: &mut CompileSession, scope: crate::env::StackId, op: UnOpKind, operand: NodeId) -> TypeId {
    match op {
        UnOpKind::Not => session.bool_type(),
        UnOpKind::Reference => {
            if !is_lvalue(&session.graph, operand) {
                let slot = session.graph.get(operand);
                let (line, col) = (slot.line, slot.col);
                session.errors.report(CompileError::new(Phase::Type, line, col, "cannot take a reference to a non-lvalue"));
                return session.error_type();
            }
            let inner = type_of(session, scope, operand);
            session.types.find(Type::Reference(inner))
        }
        UnOpKind::Print => session.void_type(),
        UnOpKind::Typeof => session.type_type(),
    }
}

/// A quote's type is computed from the shape of the raw term it wraps
/// (so a quoting macro can inspect the type of its unevaluated syntax
/// argument without evaluating it).
fn term_shape_type(session: &mut CompileSession, kind: &TermKind) -> TypeId {
    match kind {
        TermKind::Integer(_) => session.i64_type(),
        TermKind::Rational(_) => session.f64_type(),
        TermKind::String(_) => session.string_type(),
        TermKind::Char(_) => session.char_type(),
        TermKind::Bool(_) => session.bool_type(),
        TermKind::Void => session.void_type(),
        TermKind::Empty => session.empty_type(),
        TermKind::Variable(_) => session.symbol_type(),
        TermKind::Block(members) => {
            let member_tys: Vec<TypeId> = members.iter().map(|m| term_shape_type(session, &m.kind)).collect();
            session.types.find(Type::Block(member_tys))
        }
        TermKind::Program(_) => session.void_type(),
    }
}
