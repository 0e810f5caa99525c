//! Typed, reference-counted compile-time values produced by folding.

pub mod ops;
#[cfg(test)]
mod tests;

use crate::env::SymbolId;
use crate::graph::NodeId;
use crate::types::TypeId;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Captured free variables bound into a lambda/macro closure at
/// `Lambda::complete` time.
#[derive(Debug, Clone, PartialEq)]
pub struct Captures(pub Vec<(SymbolId, Meta)>);

/// A tagged union of every foldable compile-time value. Scalar arms are
/// inline; everything that needs shared, mutable identity (so an
/// assignment through one alias is observed by every alias) is boxed in
/// an `Rc<RefCell<_>>` — `.clone()` is therefore always a cheap refcount
/// bump, never a structural copy. Use `deep_clone` for the structural
/// copy the language's own `clone()` performs on mutable containers.
#[derive(Debug, Clone)]
pub enum Meta {
    Void,
    Int(i64),
    UInt(u64),
    Double(f64),
    Type(TypeId),
    Bool(bool),
    Symbol(SymbolId),
    Ref(Box<Meta>),
    String(Rc<RefCell<String>>),
    Cons { head: Box<Meta>, tail: Box<Meta> },
    Tuple(Rc<RefCell<Vec<Meta>>>),
    Array(Rc<RefCell<Vec<Meta>>>),
    Block(Rc<RefCell<Vec<Meta>>>),
    Union { active: usize, value: Box<Meta> },
    Intersection(Rc<RefCell<Vec<Meta>>>),
    Function { lambda: NodeId, captures: Option<Rc<Captures>> },
    Macro { lambda: NodeId, captures: Option<Rc<Captures>> },
}

impl Meta {
    /// The pooled type this value's tag corresponds to, when that's
    /// knowable without a type pool (scalars and `Type` carry their id
    /// directly; containers need `graph::type_of` on their owning node and
    /// are not covered here).
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Meta::Type(id) => Some(*id),
            _ => None,
        }
    }

    /// Structural copy: containers get a fresh, independently-mutable
    /// backing store; scalars are already value types so this is
    /// identical to `clone()` for them.
    pub fn deep_clone(&self) -> Meta {
        match self {
            Meta::String(s) => Meta::String(Rc::new(RefCell::new(s.borrow().clone()))),
            Meta::Tuple(v) => Meta::Tuple(Rc::new(RefCell::new(
                v.borrow().iter().map(Meta::deep_clone).collect(),
            ))),
            Meta::Array(v) => Meta::Array(Rc::new(RefCell::new(
                v.borrow().iter().map(Meta::deep_clone).collect(),
            ))),
            Meta::Block(v) => Meta::Block(Rc::new(RefCell::new(
                v.borrow().iter().map(Meta::deep_clone).collect(),
            ))),
            Meta::Intersection(v) => Meta::Intersection(Rc::new(RefCell::new(
                v.borrow().iter().map(Meta::deep_clone).collect(),
            ))),
            Meta::Cons { head, tail } => {
                Meta::Cons { head: Box::new(head.deep_clone()), tail: Box::new(tail.deep_clone()) }
            }
            Meta::Union { active, value } => {
                Meta::Union { active: *active, value: Box::new(value.deep_clone()) }
            }
            Meta::Ref(inner) => Meta::Ref(Box::new(inner.deep_clone())),
            other => other.clone(),
        }
    }

    /// Overwrites the value behind this handle in place so aliases observe
    /// the update, matching the identity-preserving `assign` semantics.
    /// Returns `false` if `self` isn't an assignable container handle of
    /// the same shape as `new_value` (the caller falls back to rebinding).
    pub fn assign_in_place(&self, new_value: &Meta) -> bool {
        match (self, new_value) {
            (Meta::String(slot), Meta::String(src)) => {
                *slot.borrow_mut() = src.borrow().clone();
                true
            }
            (Meta::Tuple(slot), Meta::Tuple(src))
            | (Meta::Array(slot), Meta::Array(src))
            | (Meta::Block(slot), Meta::Block(src))
            | (Meta::Intersection(slot), Meta::Intersection(src)) => {
                *slot.borrow_mut() = src.borrow().clone();
                true
            }
            _ => false,
        }
    }
}

impl PartialEq for Meta {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Meta::Void, Meta::Void) => true,
            (Meta::Int(a), Meta::Int(b)) => a == b,
            (Meta::UInt(a), Meta::UInt(b)) => a == b,
            // Compared (and hashed, see below) by bit pattern rather than
            // IEEE `==` so NaN payloads are reflexively equal to
            // themselves and hash/eq stay in agreement; this departs from
            // IEEE total order deliberately, not by oversight.
            (Meta::Double(a), Meta::Double(b)) => a.to_bits() == b.to_bits(),
            (Meta::Type(a), Meta::Type(b)) => a == b,
            (Meta::Bool(a), Meta::Bool(b)) => a == b,
            (Meta::Symbol(a), Meta::Symbol(b)) => a == b,
            (Meta::Ref(a), Meta::Ref(b)) => a == b,
            (Meta::String(a), Meta::String(b)) => *a.borrow() == *b.borrow(),
            (Meta::Cons { head: h1, tail: t1 }, Meta::Cons { head: h2, tail: t2 }) => {
                h1 == h2 && t1 == t2
            }
            (Meta::Tuple(a), Meta::Tuple(b))
            | (Meta::Array(a), Meta::Array(b))
            | (Meta::Block(a), Meta::Block(b))
            | (Meta::Intersection(a), Meta::Intersection(b)) => *a.borrow() == *b.borrow(),
            (Meta::Union { active: a1, value: v1 }, Meta::Union { active: a2, value: v2 }) => {
                a1 == a2 && v1 == v2
            }
            (Meta::Function { lambda: l1, .. }, Meta::Function { lambda: l2, .. }) => l1 == l2,
            (Meta::Macro { lambda: l1, .. }, Meta::Macro { lambda: l2, .. }) => l1 == l2,
            _ => false,
        }
    }
}

// See the PartialEq impl: floats hash by bit pattern, which is the only
// representation consistent with our `==`.
impl Eq for Meta {}

impl Hash for Meta {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Meta::Void => {}
            Meta::Int(v) => v.hash(state),
            Meta::UInt(v) => v.hash(state),
            Meta::Double(v) => v.to_bits().hash(state),
            Meta::Type(v) => v.hash(state),
            Meta::Bool(v) => v.hash(state),
            Meta::Symbol(v) => v.hash(state),
            Meta::Ref(v) => v.hash(state),
            Meta::String(v) => v.borrow().hash(state),
            Meta::Cons { head, tail } => {
                head.hash(state);
                tail.hash(state);
            }
            Meta::Tuple(v) | Meta::Array(v) | Meta::Block(v) | Meta::Intersection(v) => {
                v.borrow().hash(state)
            }
            Meta::Union { active, value } => {
                active.hash(state);
                value.hash(state);
            }
            Meta::Function { lambda, .. } | Meta::Macro { lambda, .. } => lambda.hash(state),
        }
    }
}
