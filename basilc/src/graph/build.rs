//! Turns a `Term` syntax tree into `Node`s, implementing the
//! `eval(term, stack)` contract: push decisions are resolved structurally
//! from the shapes the front end already grouped (`[lhs, op, rhs]`,
//! `[Variable(marker), ...]`, `[callee, arg]`) rather than by replaying a
//! generic operand-stack interaction for every term, since this front end
//! hands the core already-disambiguated groupings instead of a flat token
//! stream.

use super::{BinOpKind, Node, NodeId, UnOpKind};
use crate::env::{Entry, Stack, StackId, Storage};
use crate::meta::Meta;
use crate::session::CompileSession;
use basilc_syntax::{Term, TermKind};

/// Evaluates one syntax term into a graph node within `scope`.
pub fn eval(term: &Term, session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    match &term.kind {
        TermKind::Integer(v) => session.graph.alloc(Node::Int(*v), line, col),
        TermKind::Rational(v) => session.graph.alloc(Node::Rational(*v), line, col),
        TermKind::String(s) => session.graph.alloc(Node::Str(s.clone()), line, col),
        TermKind::Char(c) => session.graph.alloc(Node::CharLit(*c), line, col),
        TermKind::Bool(b) => session.graph.alloc(Node::BoolLit(*b), line, col),
        TermKind::Void => session.graph.alloc(Node::Void, line, col),
        TermKind::Empty => session.graph.alloc(Node::Empty, line, col),
        TermKind::Variable(name) => {
            let sym = session.symbols.intern(name);
            session.graph.alloc(Node::Var(sym), line, col)
        }
        TermKind::Program(children) => {
            let ids: Vec<NodeId> = children.iter().map(|c| eval(c, session, scope)).collect();
            session.graph.alloc(Node::Program(ids), line, col)
        }
        TermKind::Block(members) => eval_block(term, members, session, scope),
    }
}

fn marker_name(members: &[Term]) -> Option<&str> {
    match members.first().map(|t| &t.kind) {
        Some(TermKind::Variable(name)) => Some(name.as_str()),
        _ => None,
    }
}

fn eval_block(term: &Term, members: &[Term], session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    match marker_name(members) {
        Some("let") => return eval_let(term, members, session, scope),
        Some("lambda") => return eval_lambda(term, members, session, scope),
        Some("if") => return eval_if(term, members, session, scope),
        Some("while") => return eval_while(term, members, session, scope),
        Some("print") => {
            let arg = eval(&members[1], session, scope);
            return session.graph.alloc(Node::Print(arg), line, col);
        }
        Some("array") => {
            let elems: Vec<NodeId> = members[1..].iter().map(|m| eval(m, session, scope)).collect();
            return session.graph.alloc(Node::Array(elems), line, col);
        }
        Some("index") => {
            let arr = eval(&members[1], session, scope);
            let idx = eval(&members[2], session, scope);
            return session.graph.alloc(Node::Index { arr, idx }, line, col);
        }
        Some("annotate") => {
            // A bare `name:Type` outside a lambda match position declares
            // `name` in the current scope without an initializer.
            let TermKind::Variable(name) = &members[1].kind else {
                return session.graph.alloc(Node::Incomplete, line, col);
            };
            let sym = session.symbols.intern(name);
            let ty_node = eval(&members[2], session, scope);
            return session.graph.alloc(Node::Define { ty: ty_node, name: sym }, line, col);
        }
        _ => {}
    }

    if members.len() == 3 {
        if let TermKind::Variable(op) = &members[1].kind {
            if let Some(kind) = binop_kind(op) {
                let lhs = eval(&members[0], session, scope);
                let rhs = eval(&members[2], session, scope);
                if kind == BinOpKind::Join {
                    if let Some(node) = try_build_intersect(session, lhs, rhs, line, col) {
                        return node;
                    }
                }
                return session.graph.alloc(Node::BinOp { op: kind, lhs, rhs }, line, col);
            }
        }
    }

    if members.len() == 2 {
        if let TermKind::Variable(op) = &members[0].kind {
            if let Some(node) = eval_unary(op, &members[1], session, scope, line, col) {
                return node;
            }
        }
        // `[callee, arg]`: the expression stack's push decision — a
        // declaration, a registered interaction method, or a plain call.
        let callee = eval(&members[0], session, scope);
        let arg = eval(&members[1], session, scope);
        return crate::env::push(session, scope, callee, arg);
    }

    // A lone variable-headed block that matched nothing above: treat as a
    // call chain left-folded over its members, each step running the same
    // push decision.
    let mut iter = members.iter();
    let mut acc = eval(iter.next().expect("non-empty block"), session, scope);
    for m in iter {
        let arg = eval(m, session, scope);
        acc = crate::env::push(session, scope, acc, arg);
    }
    acc
}

fn eval_unary(
    op: &str,
    operand_term: &Term,
    session: &mut CompileSession,
    scope: StackId,
    line: u32,
    col: u32,
) -> Option<NodeId> {
    match op {
        "-" => {
            let zero = session.graph.alloc(Node::Int(0), line, col);
            let rhs = eval(operand_term, session, scope);
            Some(session.graph.alloc(Node::BinOp { op: BinOpKind::Sub, lhs: zero, rhs }, line, col))
        }
        "!" => {
            let operand = eval(operand_term, session, scope);
            Some(session.graph.alloc(Node::UnOp { op: UnOpKind::Not, operand }, line, col))
        }
        "~" => {
            let operand = eval(operand_term, session, scope);
            Some(session.graph.alloc(Node::Reference(operand), line, col))
        }
        "'" => Some(session.graph.alloc(Node::Quote(Box::new(operand_term.clone())), line, col)),
        _ => None,
    }
}

fn binop_kind(op: &str) -> Option<BinOpKind> {
    Some(match op {
        "+" => BinOpKind::Add,
        "-" => BinOpKind::Sub,
        "*" => BinOpKind::Mul,
        "/" => BinOpKind::Div,
        "%" => BinOpKind::Mod,
        "&&" => BinOpKind::And,
        "||" => BinOpKind::Or,
        "^" => BinOpKind::Xor,
        "==" => BinOpKind::Eq,
        "!=" => BinOpKind::Neq,
        "<" => BinOpKind::Lt,
        "<=" => BinOpKind::Le,
        ">" => BinOpKind::Gt,
        ">=" => BinOpKind::Ge,
        "&" => BinOpKind::Join,
        _ => return None,
    })
}

/// `&` between two function-shaped nodes builds an intersection instead of
/// a tuple join, flattening nested intersections on either side.
fn try_build_intersect(
    session: &mut CompileSession,
    lhs: NodeId,
    rhs: NodeId,
    line: u32,
    col: u32,
) -> Option<NodeId> {
    let is_function_shaped = |s: &CompileSession, id: NodeId| {
        matches!(s.graph.node(id), Node::Lambda { .. } | Node::Intersect { .. })
    };
    if !is_function_shaped(session, lhs) && !is_function_shaped(session, rhs) {
        return None;
    }
    let mut members = Vec::new();
    flatten_intersect_member(session, lhs, &mut members);
    flatten_intersect_member(session, rhs, &mut members);
    Some(session.graph.alloc(Node::Intersect { members }, line, col))
}

fn flatten_intersect_member(session: &CompileSession, id: NodeId, out: &mut Vec<NodeId>) {
    match session.graph.node(id) {
        Node::Intersect { members } => out.extend(members.iter().copied()),
        _ => out.push(id),
    }
}

fn eval_let(term: &Term, members: &[Term], session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    let dst = eval(&members[1], session, scope);
    let src = eval(&members[2], session, scope);
    session.graph.alloc(Node::Autodefine { dst, src }, line, col)
}

fn eval_if(term: &Term, members: &[Term], session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    let cond = eval(&members[1], session, scope);
    let child = session.stacks.alloc(Stack::new_transparent(Some(scope)));
    let body = eval(&members[2], session, child);
    session.graph.alloc(Node::If { cond, body, scope: child }, line, col)
}

fn eval_while(term: &Term, members: &[Term], session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    let cond = eval(&members[1], session, scope);
    let child = session.stacks.alloc(Stack::new_transparent(Some(scope)));
    let body = eval(&members[2], session, child);
    session.graph.alloc(Node::While { cond, body, scope: child }, line, col)
}

fn eval_lambda(term: &Term, members: &[Term], session: &mut CompileSession, scope: StackId) -> NodeId {
    let (line, col) = (term.span.line, term.span.column);
    let arg_scope = session.stacks.alloc(Stack::new_table_carrying(Some(scope)));

    let match_expr = match &members[1].kind {
        TermKind::Variable(name) => {
            let sym = session.symbols.intern(name);
            let any_ty = session.any_type();
            session.stacks.bind(
                arg_scope,
                sym,
                Entry::new(any_ty, Meta::Void, Storage::Argument),
            );
            let ty_node = session.graph.alloc(Node::TypeLit(any_ty), line, col);
            session.graph.alloc(Node::Define { ty: ty_node, name: sym }, line, col)
        }
        TermKind::Block(annotate) if marker_name(annotate) == Some("annotate") => {
            let TermKind::Variable(name) = &annotate[1].kind else {
                return session.graph.alloc(Node::Incomplete, line, col);
            };
            let sym = session.symbols.intern(name);
            let ty_node = eval(&annotate[2], session, scope);
            let declared = resolve_builtin_type(session, &annotate[2]).unwrap_or_else(|| session.any_type());
            session.stacks.bind(arg_scope, sym, Entry::new(declared, Meta::Void, Storage::Argument));
            session.graph.alloc(Node::Define { ty: ty_node, name: sym }, line, col)
        }
        _ => {
            // A constant-expression pattern: a value-constraint parameter.
            eval(&members[1], session, scope)
        }
    };

    let body = eval(&members[2], session, arg_scope);
    let captures = collect_captures(session, body, arg_scope);

    session.graph.alloc(
        Node::Lambda { match_expr, body: Some(body), scope, arg_scope, captures, name: None },
        line,
        col,
    )
}

/// Resolves a type-position identifier (`i64`, `f64`, `bool`, ...) to the
/// builtin type bound for it in the root scope, if any.
fn resolve_builtin_type(session: &CompileSession, term: &Term) -> Option<crate::types::TypeId> {
    let TermKind::Variable(name) = &term.kind else { return None };
    let sym = session.symbols.get(name)?;
    let (_, entry) = session.stacks.lookup(session.root, sym)?;
    match entry.value {
        Meta::Type(id) => Some(id),
        _ => None,
    }
}

/// Free variables referenced in `body` but not bound within `arg_scope`
/// itself, deduplicated — the set `Lambda::complete`'s capture walk would
/// collect.
fn collect_captures(
    session: &CompileSession,
    body: NodeId,
    arg_scope: StackId,
) -> Vec<(crate::env::SymbolId, NodeId)> {
    let mut names = Vec::new();
    walk_vars(session, body, &mut names);
    let mut seen = std::collections::HashSet::new();
    let mut captures = Vec::new();
    for (sym, node_id) in names {
        if let Some((found_at, _)) = session.stacks.lookup(arg_scope, sym) {
            if found_at != arg_scope && seen.insert(sym) {
                captures.push((sym, node_id));
            }
        }
    }
    captures
}

fn walk_vars(session: &CompileSession, id: NodeId, out: &mut Vec<(crate::env::SymbolId, NodeId)>) {
    match session.graph.node(id) {
        Node::Var(sym) => out.push((*sym, id)),
        Node::Program(items) | Node::Sequence(items) | Node::Array(items) => {
            for item in items {
                walk_vars(session, *item, out);
            }
        }
        Node::BinOp { lhs, rhs, .. } => {
            walk_vars(session, *lhs, out);
            walk_vars(session, *rhs, out);
        }
        Node::UnOp { operand, .. }
        | Node::Reference(operand)
        | Node::Eval(operand)
        | Node::MetaEval(operand)
        | Node::Use(operand)
        | Node::Print(operand)
        | Node::Typeof(operand) => walk_vars(session, *operand, out),
        Node::Call { callee, arg } => {
            walk_vars(session, *callee, out);
            walk_vars(session, *arg, out);
        }
        Node::If { cond, body, .. } => {
            walk_vars(session, *cond, out);
            walk_vars(session, *body, out);
        }
        Node::While { cond, body, .. } => {
            walk_vars(session, *cond, out);
            walk_vars(session, *body, out);
        }
        Node::Index { arr, idx } => {
            walk_vars(session, *arr, out);
            walk_vars(session, *idx, out);
        }
        Node::Autodefine { dst, src } | Node::Assign { dst, src } => {
            walk_vars(session, *dst, out);
            walk_vars(session, *src, out);
        }
        Node::Cons { head, tail } => {
            walk_vars(session, *head, out);
            walk_vars(session, *tail, out);
        }
        Node::Lambda { body: Some(b), .. } => walk_vars(session, *b, out),
        _ => {}
    }
}

