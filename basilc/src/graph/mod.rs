//! The typed value graph: a closed, arena-allocated `Node` enum plus the
//! free functions (`type_of`, `fold`, `gen`, ...) that together play the
//! role `GraphOp` would as a trait, dispatched with one `match` per
//! operation instead of one virtual call per node.

mod build;
mod fold;
mod gen;
mod ops;
#[cfg(test)]
mod tests;
mod typeof_;

pub use build::eval;
pub use fold::fold;
pub use gen::gen;
pub use ops::{BinOpKind, UnOpKind};
pub use typeof_::type_of;

use crate::env::{ApplyResult, Entry, StackId, SymbolId};
use crate::session::CompileSession;
use crate::types::{Type, TypeId};
use std::cell::Cell;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltinId(pub u32);

/// A term string, still attached for quoting macros that inspect their
/// raw unevaluated argument.
pub type Term = basilc_syntax::Term;

#[derive(Debug, Clone)]
pub enum Node {
    Void,
    Empty,
    Int(i64),
    Rational(f64),
    Str(String),
    CharLit(char),
    BoolLit(bool),
    TypeLit(TypeId),
    Var(SymbolId),
    Quote(Box<Term>),
    Incomplete,
    Sequence(Vec<NodeId>),
    Program(Vec<NodeId>),
    Lambda {
        match_expr: NodeId,
        body: Option<NodeId>,
        scope: StackId,
        arg_scope: StackId,
        captures: Vec<(SymbolId, NodeId)>,
        name: Option<SymbolId>,
    },
    Intersect {
        members: Vec<NodeId>,
    },
    Call {
        callee: NodeId,
        arg: NodeId,
    },
    Define {
        ty: NodeId,
        name: SymbolId,
    },
    Autodefine {
        dst: NodeId,
        src: NodeId,
    },
    Assign {
        dst: NodeId,
        src: NodeId,
    },
    If {
        cond: NodeId,
        body: NodeId,
        scope: StackId,
    },
    While {
        cond: NodeId,
        body: NodeId,
        scope: StackId,
    },
    Reference(NodeId),
    Cons {
        head: NodeId,
        tail: NodeId,
    },
    Range {
        lo: NodeId,
        hi: NodeId,
    },
    Repeat {
        value: NodeId,
        count: NodeId,
    },
    Array(Vec<NodeId>),
    ArrayDef {
        elem: NodeId,
        dims: Vec<NodeId>,
    },
    Index {
        arr: NodeId,
        idx: NodeId,
    },
    Cast {
        dst_ty: NodeId,
        src: NodeId,
    },
    Eval(NodeId),
    MetaEval(NodeId),
    Use(NodeId),
    Print(NodeId),
    Typeof(NodeId),
    BinOp {
        op: BinOpKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnOp {
        op: UnOpKind,
        operand: NodeId,
    },
}

/// Every node's shared bookkeeping: source position and a memoized type.
#[derive(Debug)]
pub struct NodeSlot {
    pub node: Node,
    pub line: u32,
    pub col: u32,
    pub ty_cache: Cell<Option<TypeId>>,
}

/// Owns every `Node` in the compile session, indexed by `NodeId`.
#[derive(Debug, Default)]
pub struct GraphArena {
    slots: Vec<NodeSlot>,
}

impl GraphArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node, line: u32, col: u32) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(NodeSlot { node, line, col, ty_cache: Cell::new(None) });
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeSlot {
        &self.slots[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        &mut self.slots[id.0 as usize]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.get(id).node
    }
}

/// `entry(ctx)`: the binding a node refers to, if any — only `Var` and
/// things that resolve through one (`Define`, a `Reference` to a
/// variable) have an entry.
pub fn entry<'a>(
    arena: &GraphArena,
    stacks: &'a crate::env::StackArena,
    scope: StackId,
    id: NodeId,
) -> Option<(StackId, &'a Entry)> {
    match arena.node(id) {
        Node::Var(name) => stacks.lookup(scope, *name),
        Node::Define { name, .. } => stacks.lookup(scope, *name),
        Node::Reference(inner) => entry(arena, stacks, scope, *inner),
        _ => None,
    }
}

/// `lvalue(ctx)`: is this node assignable? Variables, defines, derefs of
/// a reference, and the structural `Cast` that's a pure reference-deref
/// all are.
pub fn is_lvalue(arena: &GraphArena, id: NodeId) -> bool {
    matches!(arena.node(id), Node::Var(_) | Node::Define { .. } | Node::Reference(_))
}

/// Picks the intersection member whose declared argument type resolves
/// against `arg_ty` per `env::apply::try_apply`'s exact/implicit/non-`Any`
/// precedence (spec's dispatcher: the overload filtering that `caseFor`
/// performs), shared by `fold_call` and `gen_call` so both phases agree
/// on which lambda a given call actually dispatches to.
pub fn resolve_intersect_member(
    session: &mut CompileSession,
    scope: StackId,
    members: &[NodeId],
    arg_ty: TypeId,
) -> Option<NodeId> {
    let member_tys: BTreeSet<TypeId> = members.iter().map(|&m| type_of(session, scope, m)).collect();
    let intersect_ty = session.types.find(Type::Intersection(member_tys));
    let resolved = match crate::env::try_apply(&session.types, intersect_ty, arg_ty) {
        ApplyResult::Resolved(r) => r,
        _ => return None,
    };
    members.iter().copied().find(|&m| type_of(session, scope, m) == resolved)
}
