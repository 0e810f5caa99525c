//! Lexical scopes, name bindings, and the interaction-based expression
//! stack that turns a sequence of pushed value-graph nodes into
//! declarations, binary method dispatch, or function application.

pub mod apply;
mod symbol;
#[cfg(test)]
mod tests;

pub use apply::{try_apply, ApplyResult};
pub use symbol::{SymbolId, SymbolTable};

use crate::graph::{self, Node, NodeId};
use crate::ir::LocationId;
use crate::meta::Meta;
use crate::session::CompileSession;
use crate::types::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Global,
    Local,
    Argument,
    Capture,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub declared_type: TypeId,
    pub value: Meta,
    pub node: Option<NodeId>,
    pub builtin: Option<crate::graph::BuiltinId>,
    pub location: Option<LocationId>,
    pub storage: Storage,
    pub reassigned: bool,
}

impl Entry {
    pub fn new(declared_type: TypeId, value: Meta, storage: Storage) -> Self {
        Self {
            declared_type,
            value,
            node: None,
            builtin: None,
            location: None,
            storage,
            reassigned: false,
        }
    }
}

/// One scope in the stack tree. `names`/`methods` are only present on
/// scopes that actually carry bindings (function bodies, the program
/// root); transparent scopes (an `if`/`while` body with no `let`) thread
/// lookups straight to their parent without allocating either map.
#[derive(Debug)]
pub struct Stack {
    pub parent: Option<StackId>,
    names: Option<HashMap<SymbolId, Entry>>,
    methods: Option<HashMap<(TypeId, TypeId), Entry>>,
    method_cache: RefCell<HashMap<(TypeId, TypeId), Option<Entry>>>,
    /// The operand/expression stack values are pushed onto during
    /// elaboration of one syntax `Block`.
    pub values: Vec<NodeId>,
}

impl Stack {
    pub fn new_table_carrying(parent: Option<StackId>) -> Self {
        Self {
            parent,
            names: Some(HashMap::new()),
            methods: Some(HashMap::new()),
            method_cache: RefCell::new(HashMap::new()),
            values: Vec::new(),
        }
    }

    pub fn new_transparent(parent: Option<StackId>) -> Self {
        Self {
            parent,
            names: None,
            methods: None,
            method_cache: RefCell::new(HashMap::new()),
            values: Vec::new(),
        }
    }

    pub fn carries_table(&self) -> bool {
        self.names.is_some()
    }

    fn bind_local(&mut self, name: SymbolId, entry: Entry) -> bool {
        match &mut self.names {
            Some(table) => {
                table.insert(name, entry);
                true
            }
            None => false,
        }
    }

    fn lookup_local(&self, name: SymbolId) -> Option<&Entry> {
        self.names.as_ref().and_then(|t| t.get(&name))
    }

    fn register_method_local(&mut self, key: (TypeId, TypeId), entry: Entry) -> bool {
        match &mut self.methods {
            Some(table) => {
                table.insert(key, entry);
                true
            }
            None => false,
        }
    }

    fn lookup_method_local(&self, key: (TypeId, TypeId)) -> Option<&Entry> {
        self.methods.as_ref().and_then(|t| t.get(&key))
    }
}

/// Owns every `Stack` node, arena-indexed rather than linked by
/// parent/child pointers.
#[derive(Debug, Default)]
pub struct StackArena {
    stacks: Vec<Stack>,
}

impl StackArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, stack: Stack) -> StackId {
        let id = StackId(self.stacks.len() as u32);
        self.stacks.push(stack);
        id
    }

    pub fn get(&self, id: StackId) -> &Stack {
        &self.stacks[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: StackId) -> &mut Stack {
        &mut self.stacks[id.0 as usize]
    }

    /// Walks to the nearest table-carrying ancestor (inclusive of `from`)
    /// and binds `name` there.
    pub fn bind(&mut self, from: StackId, name: SymbolId, entry: Entry) {
        let mut cur = from;
        loop {
            if self.get_mut(cur).bind_local(name, entry.clone()) {
                self.invalidate_method_caches_upward(cur);
                return;
            }
            match self.get(cur).parent {
                Some(p) => cur = p,
                None => unreachable!("root scope must carry a table"),
            }
        }
    }

    /// Walks the parent chain looking up `name`.
    pub fn lookup(&self, from: StackId, name: SymbolId) -> Option<(StackId, &Entry)> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            if let Some(entry) = self.get(id).lookup_local(name) {
                return Some((id, entry));
            }
            cur = self.get(id).parent;
        }
        None
    }

    pub fn register_method(&mut self, from: StackId, key: (TypeId, TypeId), entry: Entry) {
        let mut cur = from;
        loop {
            if self.get_mut(cur).register_method_local(key, entry.clone()) {
                self.invalidate_method_caches_upward(cur);
                return;
            }
            match self.get(cur).parent {
                Some(p) => cur = p,
                None => unreachable!("root scope must carry a table"),
            }
        }
    }

    /// Finds a binary interaction method for `key`, checked in either
    /// argument order by the caller, memoized per-scope and invalidated
    /// whenever a new method is bound anywhere in this scope's ancestry.
    pub fn find_method(&self, from: StackId, key: (TypeId, TypeId)) -> Option<Entry> {
        if let Some(cached) = self.get(from).method_cache.borrow().get(&key) {
            return cached.clone();
        }
        let mut cur = Some(from);
        let found = loop {
            let id = cur?;
            if let Some(entry) = self.get(id).lookup_method_local(key) {
                break Some(entry.clone());
            }
            cur = self.get(id).parent;
        };
        self.get(from).method_cache.borrow_mut().insert(key, found.clone());
        found
    }

    fn invalidate_method_caches_upward(&self, from: StackId) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            self.get(id).method_cache.borrow_mut().clear();
            cur = self.get(id).parent;
        }
    }
}

/// Pushing `v` onto a stack that already holds `top`: the four-way
/// decision a syntax block's elaboration runs on every adjacent pair of
/// values (declaration, interaction-method dispatch, application, or a
/// bare push with nothing to do yet).
///
/// 1. `top` folds to a bound `Type` and `v` is a fresh, unbound `Var`:
///    this is a declaration (`x: i64` read as "declare `x` of type
///    `i64`"), so build a `Define` instead of a `Call`.
/// 2. A binary interaction method is registered for `(type(top),
///    type(v))` or `(type(v), type(top))`: the registered lambda is
///    applied to both operands, in whichever order matched.
/// 3/4. Otherwise this is an ordinary application; `build_interaction_call`
///    left-folds it into nested `Call`s the same way a two-argument
///    interaction is applied, and `type_of`'s later resolution against
///    `try_apply` is what actually rejects a genuine mismatch.
pub fn push(session: &mut CompileSession, scope: StackId, top: NodeId, v: NodeId) -> NodeId {
    if let Some(Meta::Type(_)) = graph::fold(session, scope, top) {
        if let Node::Var(sym) = session.graph.node(v) {
            if session.stacks.lookup(scope, *sym).is_none() {
                let sym = *sym;
                let (line, col) = node_pos(session, v);
                return session.graph.alloc(Node::Define { ty: top, name: sym }, line, col);
            }
        }
    }

    let top_ty = graph::type_of(session, scope, top);
    let v_ty = graph::type_of(session, scope, v);

    if let Some(entry) = session.stacks.find_method(scope, (top_ty, v_ty)) {
        if let Some(lambda) = entry.node {
            return build_interaction_call(session, lambda, top, v);
        }
    }
    if let Some(entry) = session.stacks.find_method(scope, (v_ty, top_ty)) {
        if let Some(lambda) = entry.node {
            return build_interaction_call(session, lambda, v, top);
        }
    }

    let (line, col) = node_pos(session, top);
    session.graph.alloc(Node::Call { callee: top, arg: v }, line, col)
}

fn build_interaction_call(session: &mut CompileSession, lambda: NodeId, first: NodeId, second: NodeId) -> NodeId {
    let (line, col) = node_pos(session, first);
    let applied_first = session.graph.alloc(Node::Call { callee: lambda, arg: first }, line, col);
    session.graph.alloc(Node::Call { callee: applied_first, arg: second }, line, col)
}

fn node_pos(session: &CompileSession, id: NodeId) -> (u32, u32) {
    let slot = session.graph.get(id);
    (slot.line, slot.col)
}
