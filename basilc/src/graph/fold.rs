//! `fold(node)`: attempts to evaluate a node to a compile-time `Meta`.
//! `None` means "not a compile-time constant", never an error by itself.

use super::ops::{BinOpKind, UnOpKind};
use super::{entry, resolve_intersect_member, Node, NodeId};
use crate::env::{Entry, StackId, Storage};
use crate::meta::{ops, Meta};
use crate::session::CompileSession;
use std::cell::RefCell;
use std::rc::Rc;

const WHILE_ITERATION_LIMIT: u32 = 1 << 20;

pub fn fold(session: &mut CompileSession, scope: StackId, id: NodeId) -> Option<Meta> {
    let node = session.graph.node(id).clone();
    match node {
        Node::Void | Node::Empty => Some(Meta::Void),
        Node::Int(v) => Some(Meta::Int(v)),
        Node::Rational(v) => Some(Meta::Double(v)),
        Node::Str(s) => Some(Meta::String(Rc::new(RefCell::new(s)))),
        Node::CharLit(c) => Some(Meta::Int(c as i64)),
        Node::BoolLit(b) => Some(Meta::Bool(b)),
        Node::TypeLit(t) => Some(Meta::Type(t)),
        Node::Var(_) => entry(&session.graph, &session.stacks, scope, id).map(|(_, e)| e.value.clone()),
        Node::Quote(_) => None,
        Node::Incomplete => None,
        Node::Sequence(items) | Node::Program(items) => {
            let mut last = None;
            for item in items {
                last = fold(session, scope, item);
            }
            last
        }
        Node::Lambda { .. } => Some(Meta::Function { lambda: id, captures: None }),
        Node::Intersect { members } => Some(Meta::Intersection(Rc::new(RefCell::new(
            members.iter().map(|&m| Meta::Function { lambda: m, captures: None }).collect(),
        )))),
        Node::Call { callee, arg } => fold_call(session, scope, callee, arg),
        Node::Define { .. } => Some(Meta::Void),
        Node::Autodefine { dst, src } => fold_autodefine(session, scope, dst, src),
        Node::Assign { dst, src } => fold_assign(session, scope, dst, src),
        Node::If { cond, body, scope: inner } => {
            match fold(session, scope, cond)? {
                Meta::Bool(true) => fold(session, inner, body),
                Meta::Bool(false) => Some(Meta::Void),
                _ => None,
            }
        }
        Node::While { cond, body, scope: inner } => {
            let mut iterations = 0;
            loop {
                match fold(session, scope, cond) {
                    Some(Meta::Bool(true)) => {
                        fold(session, inner, body);
                    }
                    Some(Meta::Bool(false)) => return Some(Meta::Void),
                    _ => return None,
                }
                iterations += 1;
                if iterations > WHILE_ITERATION_LIMIT {
                    return None;
                }
            }
        }
        Node::Reference(_) => None,
        Node::Cons { head, tail } => {
            let h = fold(session, scope, head)?;
            let t = fold(session, scope, tail)?;
            Some(ops::cons(h, t))
        }
        Node::Range { lo, hi } => {
            let (Meta::Int(a), Meta::Int(b)) = (fold(session, scope, lo)?, fold(session, scope, hi)?) else {
                return None;
            };
            let items: Vec<Meta> = (a..=b).map(Meta::Int).collect();
            Some(Meta::Tuple(Rc::new(RefCell::new(items))))
        }
        Node::Repeat { value, count } => {
            let v = fold(session, scope, value)?;
            let Meta::Int(n) = fold(session, scope, count)? else { return None };
            if n < 0 {
                return None;
            }
            let items: Vec<Meta> = (0..n).map(|_| v.deep_clone()).collect();
            Some(Meta::Tuple(Rc::new(RefCell::new(items))))
        }
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(fold(session, scope, item)?);
            }
            Some(Meta::Array(Rc::new(RefCell::new(out))))
        }
        Node::ArrayDef { .. } => {
            let ty = super::type_of(session, scope, id);
            Some(Meta::Type(ty))
        }
        Node::Index { arr, idx } => {
            let container = fold(session, scope, arr)?;
            let Meta::Int(i) = fold(session, scope, idx)? else { return None };
            match container {
                Meta::Tuple(v) | Meta::Array(v) => v.borrow().get(i as usize).cloned(),
                _ => None,
            }
        }
        Node::Cast { dst_ty, src } => fold_cast(session, scope, dst_ty, src),
        Node::Eval(inner) | Node::MetaEval(inner) | Node::Use(inner) => fold(session, scope, inner),
        Node::Print(_) => None,
        Node::Typeof(operand) => Some(Meta::Type(super::type_of(session, scope, operand))),
        Node::BinOp { op, lhs, rhs } => fold_binop(session, scope, op, lhs, rhs),
        Node::UnOp { op, operand } => fold_unop(session, scope, op, operand),
    }
}

fn fold_call(session: &mut CompileSession, scope: StackId, callee: NodeId, arg: NodeId) -> Option<Meta> {
    let callee_meta = fold(session, scope, callee)?;
    let arg_meta = fold(session, scope, arg)?;
    let lambda_id = match callee_meta {
        Meta::Function { lambda, .. } => lambda,
        Meta::Intersection(members) => {
            let member_lambdas: Vec<NodeId> = members
                .borrow()
                .iter()
                .filter_map(|m| match m {
                    Meta::Function { lambda, .. } => Some(*lambda),
                    _ => None,
                })
                .collect();
            let arg_ty = super::type_of(session, scope, arg);
            resolve_intersect_member(session, scope, &member_lambdas, arg_ty)?
        }
        _ => return None,
    };
    let Node::Lambda { match_expr, body, arg_scope, .. } = session.graph.node(lambda_id).clone() else {
        return None;
    };
    let body = body?;
    if let Node::Define { name, .. } = session.graph.node(match_expr) {
        let name = *name;
        if session.stacks.lookup(arg_scope, name).is_some() {
            let param_ty = super::type_of(session, arg_scope, match_expr);
            session.stacks.bind(arg_scope, name, Entry::new(param_ty, arg_meta, Storage::Argument));
        }
    }
    fold(session, arg_scope, body)
}

fn fold_autodefine(session: &mut CompileSession, scope: StackId, dst: NodeId, src: NodeId) -> Option<Meta> {
    let value = fold(session, scope, src)?;
    bind_pattern(session, scope, dst, &value);
    Some(value)
}

fn bind_pattern(session: &mut CompileSession, scope: StackId, dst: NodeId, value: &Meta) {
    match session.graph.node(dst).clone() {
        Node::BinOp { op: BinOpKind::Join, lhs, rhs } => {
            if let Meta::Tuple(members) = value {
                let members = members.borrow();
                if members.len() == 2 {
                    bind_pattern(session, scope, lhs, &members[0]);
                    bind_pattern(session, scope, rhs, &members[1]);
                }
            }
        }
        Node::Var(sym) => {
            let ty = super::type_of(session, scope, dst);
            session.stacks.bind(scope, sym, Entry::new(ty, value.clone(), Storage::Local));
        }
        _ => {}
    }
}

fn fold_assign(session: &mut CompileSession, scope: StackId, dst: NodeId, src: NodeId) -> Option<Meta> {
    let value = fold(session, scope, src)?;
    if let Node::Var(sym) = session.graph.node(dst) {
        let sym = *sym;
        let rebind = session.stacks.lookup(scope, sym).map(|(found_at, existing)| {
            (found_at, existing.declared_type, existing.value.assign_in_place(&value))
        });
        if let Some((found_at, ty, updated_in_place)) = rebind {
            if !updated_in_place {
                session.stacks.bind(found_at, sym, Entry::new(ty, value.clone(), Storage::Local));
            }
            return Some(value);
        }
    }
    bind_pattern(session, scope, dst, &value);
    Some(value)
}

fn fold_cast(session: &mut CompileSession, scope: StackId, dst_ty: NodeId, src: NodeId) -> Option<Meta> {
    let target = super::type_of(session, scope, dst_ty);
    let value = fold(session, scope, src)?;
    match session.types.get(target) {
        crate::types::Type::Numeric { float: true, .. } => ops::to_float(&value),
        crate::types::Type::Numeric { float: false, .. } => ops::to_int(&value),
        crate::types::Type::Reference(_) => Some(value),
        _ => Some(value),
    }
}

fn fold_binop(session: &mut CompileSession, scope: StackId, op: BinOpKind, lhs: NodeId, rhs: NodeId) -> Option<Meta> {
    if op == BinOpKind::Join {
        let l = fold(session, scope, lhs)?;
        let r = fold(session, scope, rhs)?;
        return ops::join(&l, &r).or_else(|| Some(Meta::Tuple(Rc::new(RefCell::new(vec![l, r])))));
    }
    let l = fold(session, scope, lhs)?;
    let r = fold(session, scope, rhs)?;
    op.eval_meta(&l, &r)
}

fn fold_unop(session: &mut CompileSession, scope: StackId, op: UnOpKind, operand: NodeId) -> Option<Meta> {
    if matches!(op, UnOpKind::Reference | UnOpKind::Print) {
        return None;
    }
    let v = fold(session, scope, operand)?;
    op.eval_meta(&v)
}
