//! `gen(node)`: lowers a node into instructions appended to the current
//! function frame, returning the `LocationId` holding its result (`None`
//! for nodes that only produce a side effect, like `Print` or `While`).

use super::fold::fold;
use super::ops::{BinOpKind, UnOpKind};
use super::{entry, is_lvalue, resolve_intersect_member, Node, NodeId};
use crate::env::{Entry, StackId};
use crate::ir::{BoolOp, CodeGenerator, CompareOp, DataKind, Frame, Function, Insn, LocationId, MathOp};
use crate::meta::Meta;
use crate::session::CompileSession;
use std::cell::RefCell;
use std::rc::Rc;

pub fn gen(
    session: &mut CompileSession,
    module: &mut CodeGenerator,
    func: &mut Function,
    scope: StackId,
    id: NodeId,
) -> Option<LocationId> {
    let node = session.graph.node(id).clone();
    match node {
        Node::Void | Node::Empty | Node::Incomplete | Node::Quote(_) => None,
        Node::Int(_) | Node::Rational(_) | Node::Str(_) | Node::CharLit(_) | Node::BoolLit(_) | Node::TypeLit(_) => {
            let meta = fold(session, scope, id).unwrap_or(Meta::Void);
            Some(gen_constant(session, module, func, scope, id, &meta))
        }
        Node::Var(_) => entry(&session.graph, &session.stacks, scope, id).and_then(|(_, e)| e.location),
        Node::Sequence(items) | Node::Program(items) => {
            let mut last = None;
            for item in items {
                last = gen(session, module, func, scope, item);
            }
            last
        }
        Node::Lambda { .. } => None,
        Node::Intersect { .. } => None,
        Node::Call { callee, arg } => gen_call(session, module, func, scope, id, callee, arg),
        Node::Define { .. } => None,
        Node::Autodefine { dst, src } | Node::Assign { dst, src } => {
            if let Node::Var(sym) = session.graph.node(dst) {
                if matches!(session.graph.node(src), Node::Lambda { .. } | Node::Intersect { .. }) {
                    let sym = *sym;
                    bind_function_value(session, scope, sym, src);
                    return None;
                }
            }
            let src_loc = gen(session, module, func, scope, src)?;
            bind_location(session, scope, func, dst, src_loc);
            Some(src_loc)
        }
        Node::If { cond, body, scope: inner } => {
            let cond_loc = gen(session, module, func, scope, cond)?;
            let false_const = gen_bool_const(session, module, func, false);
            let end = func.label(&format!("if_end_{}", id.0));
            func.add(Insn::IfEqual { cond: cond_loc, value: false_const, label: end });
            gen(session, module, func, inner, body);
            func.add(Insn::Label(end));
            None
        }
        Node::While { cond, body, scope: inner } => {
            let start = func.label(&format!("while_start_{}", id.0));
            let end = func.label(&format!("while_end_{}", id.0));
            func.add(Insn::Label(start));
            let cond_loc = gen(session, module, func, scope, cond)?;
            let false_const = gen_bool_const(session, module, func, false);
            func.add(Insn::IfEqual { cond: cond_loc, value: false_const, label: end });
            gen(session, module, func, inner, body);
            func.add(Insn::Goto { label: start });
            func.add(Insn::Label(end));
            None
        }
        Node::Reference(inner) => {
            if !is_lvalue(&session.graph, inner) {
                return None;
            }
            let inner_loc = gen(session, module, func, scope, inner)?;
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            func.add(Insn::Lea { dest, src: inner_loc });
            Some(dest)
        }
        Node::Cons { head, tail } => {
            let h = gen(session, module, func, scope, head)?;
            let t = gen(session, module, func, scope, tail)?;
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            func.add(Insn::Join { dest, members: vec![h, t] });
            Some(dest)
        }
        // Compile-time-only constructs; unrolled by `fold`, never reach codegen directly.
        Node::Range { .. } | Node::Repeat { .. } => None,
        Node::Array(items) => {
            let locs: Vec<LocationId> =
                items.iter().filter_map(|&item| gen(session, module, func, scope, item)).collect();
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            func.add(Insn::Join { dest, members: locs });
            Some(dest)
        }
        Node::ArrayDef { .. } => None,
        Node::Index { arr, idx } => {
            let arr_loc = gen(session, module, func, scope, arr)?;
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            // A constant index becomes a direct field offset; a dynamic
            // index has no representation in this instruction set (no
            // register-indexed field access), the same front-end
            // coverage gap already accepted for `Range`/`Repeat`/`Cons`
            // surface syntax — such an index never reaches codegen
            // because the type checker requires a constant tuple index.
            let index = match fold(session, scope, idx) {
                Some(Meta::Int(i)) => i as u32,
                _ => return None,
            };
            func.add(Insn::Field { dest, src: arr_loc, index });
            Some(dest)
        }
        Node::Cast { dst_ty, src } => {
            let src_loc = gen(session, module, func, scope, src)?;
            let ty = super::type_of(session, scope, dst_ty);
            let dest = func.stack(ty);
            func.add(Insn::Cast { dest, src: src_loc });
            Some(dest)
        }
        Node::Eval(inner) | Node::MetaEval(inner) | Node::Use(inner) => gen(session, module, func, scope, inner),
        Node::Print(operand) => {
            if let Some(loc) = gen(session, module, func, scope, operand) {
                func.add(Insn::Print { value: loc });
            }
            None
        }
        Node::Typeof(operand) => {
            let ty = super::type_of(session, scope, operand);
            let meta = Meta::Type(ty);
            Some(gen_constant(session, module, func, scope, id, &meta))
        }
        Node::BinOp { op, lhs, rhs } => gen_binop(session, module, func, scope, id, op, lhs, rhs),
        Node::UnOp { op, operand } => gen_unop(session, module, func, scope, id, op, operand),
    }
}

fn gen_constant(
    session: &mut CompileSession,
    module: &mut CodeGenerator,
    func: &mut Function,
    scope: StackId,
    id: NodeId,
    meta: &Meta,
) -> LocationId {
    let ty = super::type_of(session, scope, id);
    let dest = func.stack(ty);
    let (kind, data_id) = match meta {
        Meta::Int(v) => (DataKind::Int, module.intern_int(*v)),
        Meta::UInt(v) => (DataKind::Int, module.intern_int(*v as i64)),
        Meta::Double(v) => (DataKind::Float, module.intern_float(*v)),
        Meta::String(s) => (DataKind::Str, module.intern_string(&s.borrow())),
        Meta::Bool(b) => (DataKind::Bool, module.intern_bool(*b)),
        _ => (DataKind::Int, module.intern_int(0)),
    };
    func.add(Insn::Data { kind, dest });
    func.location_mut(dest).imm = Some(data_id);
    dest
}

fn gen_bool_const(session: &mut CompileSession, module: &mut CodeGenerator, func: &mut Function, value: bool) -> LocationId {
    let ty = session.bool_type();
    let dest = func.stack(ty);
    func.add(Insn::Data { kind: DataKind::Bool, dest });
    func.location_mut(dest).imm = Some(module.intern_bool(value));
    dest
}

/// Records the Location a binding's value now lives in, so later `Var`
/// reads resolve to it. `func` supplies the already-known type of the
/// value at `loc` for a brand-new binding, rather than re-deriving it
/// from `dst` itself — `dst` is the variable being bound and isn't found
/// in `scope` yet, so routing through `type_of` here would recurse into
/// the same "undeclared variable" error this call is in the middle of
/// resolving.
fn bind_location(session: &mut CompileSession, scope: StackId, func: &Function, dst: NodeId, loc: LocationId) {
    let Node::Var(sym) = session.graph.node(dst) else { return };
    let sym = *sym;
    let existing = session.stacks.lookup(scope, sym).map(|(found_at, e)| (found_at, e.clone()));
    if let Some((found_at, mut entry)) = existing {
        entry.location = Some(loc);
        session.stacks.bind(found_at, sym, entry);
    } else {
        let ty = func.location(loc).ty;
        let mut entry = Entry::new(ty, Meta::Void, crate::env::Storage::Local);
        entry.location = Some(loc);
        session.stacks.bind(scope, sym, entry);
    }
}

/// Binds `sym` to the compile-time function value `src` (a `Lambda` or
/// `Intersect` node) evaluates to, the same `Meta` shape `fold` itself
/// builds for these two node kinds. A lambda binding has no runtime
/// Location of its own — a call site resolves the callee through this
/// `Meta`, not through `gen`/`Insn::Call`'s usual operand-Location path —
/// so this is the only thing `Node::Autodefine` needs to do for it.
fn bind_function_value(session: &mut CompileSession, scope: StackId, sym: crate::env::SymbolId, src: NodeId) {
    let node = session.graph.node(src).clone();
    let ty = super::type_of(session, scope, src);
    let meta = match node {
        Node::Intersect { members } => Meta::Intersection(Rc::new(RefCell::new(
            members.iter().map(|&m| Meta::Function { lambda: m, captures: None }).collect(),
        ))),
        _ => Meta::Function { lambda: src, captures: None },
    };
    session.stacks.bind(scope, sym, Entry::new(ty, meta, crate::env::Storage::Local));
}

/// Binds a lowered lambda's parameter variable directly to its Location,
/// for the fresh `Function`/`arg_scope` pair `lower_lambda` builds —
/// there's no existing entry to update, since `arg_scope` is table-
/// carrying and only ever populated by the lambda's own match pattern.
fn bind_param(session: &mut CompileSession, arg_scope: StackId, sym: crate::env::SymbolId, ty: crate::types::TypeId, loc: LocationId) {
    let mut entry = Entry::new(ty, Meta::Void, crate::env::Storage::Argument);
    entry.location = Some(loc);
    session.stacks.bind(arg_scope, sym, entry);
}

fn gen_call(
    session: &mut CompileSession,
    module: &mut CodeGenerator,
    func: &mut Function,
    scope: StackId,
    id: NodeId,
    callee: NodeId,
    arg: NodeId,
) -> Option<LocationId> {
    let arg_loc = gen(session, module, func, scope, arg)?;
    let callee_meta = fold(session, scope, callee)?;
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
    let symbol = lower_lambda(session, module, lambda_id)?;
    let ty = super::type_of(session, scope, id);
    let dest = func.stack(ty);
    func.add(Insn::Call { dest: Some(dest), symbol, args: vec![arg_loc] });
    Some(dest)
}

/// Lowers a `Lambda` node into its own pushed `Function`, memoized by
/// `NodeId` so a lambda called from more than one site (direct recursion
/// included) is only lowered once. The symbol is registered before the
/// body is generated, so a call to the lambda from within its own body
/// resolves to the same symbol instead of re-lowering forever.
fn lower_lambda(session: &mut CompileSession, module: &mut CodeGenerator, lambda_id: NodeId) -> Option<String> {
    if let Some(symbol) = module.lowered_lambdas.get(&lambda_id.0) {
        return Some(symbol.clone());
    }
    let Node::Lambda { match_expr, body, arg_scope, .. } = session.graph.node(lambda_id).clone() else {
        return None;
    };
    let body = body?;
    let symbol = format!("fn_{}", lambda_id.0);
    module.lowered_lambdas.insert(lambda_id.0, symbol.clone());

    let mut lowered = Function::new(symbol.clone());
    let Node::Define { name, ty } = session.graph.node(match_expr).clone() else {
        return None;
    };
    let param_ty = super::type_of(session, arg_scope, ty);
    let param_loc = lowered.stack(param_ty);
    lowered.param = Some(param_loc);
    bind_param(session, arg_scope, name, param_ty, param_loc);

    let result = gen(session, module, &mut lowered, arg_scope, body);
    lowered.add(Insn::Ret { value: result });
    module.push_function(lowered);
    Some(symbol)
}

fn gen_binop(
    session: &mut CompileSession,
    module: &mut CodeGenerator,
    func: &mut Function,
    scope: StackId,
    id: NodeId,
    op: BinOpKind,
    lhs: NodeId,
    rhs: NodeId,
) -> Option<LocationId> {
    let lhs_loc = gen(session, module, func, scope, lhs)?;
    let rhs_loc = gen(session, module, func, scope, rhs)?;
    let ty = super::type_of(session, scope, id);
    let dest = func.stack(ty);
    match op {
        BinOpKind::Add => func.add(Insn::BinMath { op: MathOp::Add, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Sub => func.add(Insn::BinMath { op: MathOp::Sub, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Mul => func.add(Insn::BinMath { op: MathOp::Mul, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Div => func.add(Insn::BinMath { op: MathOp::Div, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Mod => func.add(Insn::BinMath { op: MathOp::Mod, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::And => func.add(Insn::BoolOp { op: BoolOp::And, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Or => func.add(Insn::BoolOp { op: BoolOp::Or, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Xor => func.add(Insn::BoolOp { op: BoolOp::Xor, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Eq => func.add(Insn::Compare { op: CompareOp::Eq, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Neq => func.add(Insn::Compare { op: CompareOp::Neq, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Lt => func.add(Insn::Compare { op: CompareOp::Lt, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Le => func.add(Insn::Compare { op: CompareOp::Le, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Gt => func.add(Insn::Compare { op: CompareOp::Gt, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Ge => func.add(Insn::Compare { op: CompareOp::Ge, dest, lhs: lhs_loc, rhs: rhs_loc }),
        BinOpKind::Join | BinOpKind::Cons => func.add(Insn::Join { dest, members: vec![lhs_loc, rhs_loc] }),
        BinOpKind::Range | BinOpKind::Repeat => return None,
    }
    Some(dest)
}

fn gen_unop(
    session: &mut CompileSession,
    module: &mut CodeGenerator,
    func: &mut Function,
    scope: StackId,
    id: NodeId,
    op: UnOpKind,
    operand: NodeId,
) -> Option<LocationId> {
    match op {
        UnOpKind::Not => {
            let src = gen(session, module, func, scope, operand)?;
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            let zero = gen_bool_const(session, module, func, false);
            func.add(Insn::Compare { op: CompareOp::Eq, dest, lhs: src, rhs: zero });
            Some(dest)
        }
        UnOpKind::Reference => {
            if !is_lvalue(&session.graph, operand) {
                return None;
            }
            let src = gen(session, module, func, scope, operand)?;
            let ty = super::type_of(session, scope, id);
            let dest = func.stack(ty);
            func.add(Insn::Lea { dest, src });
            Some(dest)
        }
        UnOpKind::Print => {
            let src = gen(session, module, func, scope, operand)?;
            func.add(Insn::Print { value: src });
            None
        }
        UnOpKind::Typeof => {
            let ty = super::type_of(session, scope, operand);
            let meta = Meta::Type(ty);
            Some(gen_constant(session, module, func, scope, id, &meta))
        }
    }
}
