//! Interned type algebra: structural keys, conversion relations, and the
//! value-level constraints attached to function/macro parameters.

mod constraint;
#[cfg(test)]
mod tests;

pub use constraint::Constraint;

use std::collections::{BTreeSet, HashMap};

/// A pooled, stable type handle. Two `TypePool::find` calls built from the
/// same structural key always return the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// The type algebra. Closed and small enough that conversion relations are
/// plain `match`es over this enum rather than a trait per variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Numeric { width: u8, signed: bool, float: bool },
    Tuple(Vec<TypeId>),
    Block(Vec<TypeId>),
    Array { elem: TypeId, count: Option<u32> },
    Union(BTreeSet<TypeId>),
    Intersection(BTreeSet<TypeId>),
    List(TypeId),
    Reference(TypeId),
    Function { arg: TypeId, ret: TypeId, quoting: bool, constraints: Vec<Constraint> },
    Macro { arg: TypeId, quoting: bool, constraints: Vec<Constraint> },
    Empty,
    Void,
    Bool,
    TypeType,
    Symbol,
    String,
    Char,
    Any,
    Error,
}

impl Type {
    /// Byte size of a value of this type; `None` for sizes that only make
    /// sense relative to a pool (tuples/arrays need member sizes).
    pub fn size(&self, pool: &TypePool) -> u32 {
        match self {
            Type::Numeric { width, .. } => *width as u32,
            Type::Tuple(members) => members.iter().map(|t| pool.get(*t).size(pool)).sum(),
            Type::Block(_) => 0,
            Type::Array { elem, count } => pool.get(*elem).size(pool) * count.unwrap_or(0),
            Type::Union(members) => {
                members.iter().map(|t| pool.get(*t).size(pool)).max().unwrap_or(0)
            }
            Type::Intersection(members) => {
                if members.iter().all(|t| matches!(pool.get(*t), Type::Function { .. })) {
                    8
                } else {
                    members.iter().map(|t| pool.get(*t).size(pool)).sum()
                }
            }
            Type::List(_) | Type::Reference(_) => 8,
            Type::Function { .. } | Type::Macro { .. } => 8,
            Type::Empty | Type::Void => 0,
            Type::Bool | Type::Char => 1,
            Type::TypeType | Type::Symbol | Type::String | Type::Any | Type::Error => 8,
        }
    }

    fn structural_key(&self, pool: &TypePool) -> String {
        match self {
            Type::Numeric { width, signed, float } => {
                format!("n{}{}{}", width, if *signed { 's' } else { 'u' }, if *float { 'f' } else { 'i' })
            }
            Type::Tuple(members) => key_list('t', members, pool),
            Type::Block(members) => key_list('k', members, pool),
            Type::Array { elem, count } => {
                format!("a{}[{}]", pool.key_of(*elem), count.map_or("_".into(), |c| c.to_string()))
            }
            Type::Union(members) => key_set('u', members, pool),
            Type::Intersection(members) => key_set('x', members, pool),
            Type::List(elem) => format!("l{}", pool.key_of(*elem)),
            Type::Reference(elem) => format!("r{}", pool.key_of(*elem)),
            Type::Function { arg, ret, quoting, constraints } => format!(
                "f{}->{}{}{:?}",
                pool.key_of(*arg),
                pool.key_of(*ret),
                if *quoting { "!" } else { "" },
                constraints
            ),
            Type::Macro { arg, quoting, constraints } => {
                format!("m{}{}{:?}", pool.key_of(*arg), if *quoting { "!" } else { "" }, constraints)
            }
            Type::Empty => "empty".into(),
            Type::Void => "void".into(),
            Type::Bool => "bool".into(),
            Type::TypeType => "type".into(),
            Type::Symbol => "symbol".into(),
            Type::String => "string".into(),
            Type::Char => "char".into(),
            Type::Any => "any".into(),
            Type::Error => "error".into(),
        }
    }

    /// Safe coercion: e.g. integer widening within the same signedness,
    /// member-wise tuple coercion, reference auto-deref.
    pub fn implicitly(&self, target: TypeId, pool: &TypePool) -> bool {
        if let Some(self_id) = pool.id_of(self) {
            if self_id == target {
                return true;
            }
        }
        let target_ty = pool.get(target);
        match (self, target_ty) {
            (Type::Any, _) | (_, Type::Any) => matches!(target_ty, Type::Any),
            (
                Type::Numeric { width: w1, signed: s1, float: f1 },
                Type::Numeric { width: w2, signed: s2, float: f2 },
            ) => f1 == f2 && s1 == s2 && w1 <= w2,
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| pool.get(*x).implicitly(*y, pool))
            }
            (Type::Array { elem: e1, count: c1 }, Type::Array { elem: e2, count: c2 }) => {
                c1 == c2 && pool.get(*e1).implicitly(*e2, pool)
            }
            (Type::Array { elem, count: Some(n) }, Type::Tuple(members)) => {
                members.len() as u32 == *n && members.iter().all(|m| pool.get(*elem).implicitly(*m, pool))
            }
            (Type::List(a), Type::List(b)) => a == b,
            (Type::Reference(a), _) => *a == target || pool.get(*a).implicitly(target, pool),
            (
                Type::Function { arg: a1, ret: r1, quoting: q1, constraints: c1 },
                Type::Function { arg: a2, ret: r2, quoting: q2, constraints: c2 },
            ) => {
                a1 == a2
                    && r1 == r2
                    && q1 == q2
                    && c1 == c2
                    && c2.len() == 1
                    && c2[0] == Constraint::Unknown
            }
            _ => false,
        }
    }

    /// User-requested conversion: `implicitly` plus explicit numeric
    /// round-trips, reification of tuples/intersections/unions-of-types
    /// into `Type`, and typed-function `EqualsValue(Type)` reification.
    pub fn explicitly(&self, target: TypeId, pool: &TypePool) -> bool {
        if self.implicitly(target, pool) {
            return true;
        }
        let target_ty = pool.get(target);
        match (self, target_ty) {
            (Type::Numeric { .. }, Type::Numeric { .. }) => true,
            (Type::Tuple(_), Type::TypeType) => true,
            (Type::Union(members), Type::TypeType) => !members.is_empty(),
            (Type::Intersection(members), Type::TypeType) => !members.is_empty(),
            (Type::Function { ret, constraints, .. }, Type::TypeType) => {
                *ret == pool.type_type_id()
                    && constraints.iter().any(|c| matches!(c, Constraint::EqualsValue(_)))
            }
            _ => false,
        }
    }

    /// Used when building intersections: do two candidate members of the
    /// same intersection conflict?
    pub fn conflicts_with(&self, other: &Type, pool: &TypePool) -> bool {
        match (self, other) {
            (
                Type::Function { arg: a1, constraints: c1, .. },
                Type::Function { arg: a2, constraints: c2, .. },
            ) => {
                a1 == a2
                    && c1.iter().zip(c2).any(|(x, y)| x.conflicts_with(y))
            }
            (Type::Macro { .. }, Type::Function { .. }) | (Type::Function { .. }, Type::Macro { .. }) => true,
            _ => self == other && !matches!(self, Type::Any | Type::Error)
        }
    }
}

fn key_list(tag: char, members: &[TypeId], pool: &TypePool) -> String {
    let parts: Vec<_> = members.iter().map(|t| pool.key_of(*t)).collect();
    format!("{tag}({})", parts.join(","))
}

fn key_set(tag: char, members: &BTreeSet<TypeId>, pool: &TypePool) -> String {
    let parts: Vec<_> = members.iter().map(|t| pool.key_of(*t)).collect();
    format!("{tag}{{{}}}", parts.join(","))
}

/// Owns every interned `Type`, addressed by stable `TypeId`.
#[derive(Debug, Default)]
pub struct TypePool {
    types: Vec<Type>,
    by_key: HashMap<String, TypeId>,
}

impl TypePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    fn id_of(&self, ty: &Type) -> Option<TypeId> {
        // structural_key needs self-reference for compound types already in
        // the pool; computing it here would require a chicken/egg pool
        // lookup, so this fast path only covers already-interned atoms.
        self.by_key.get(&ty.structural_key(self)).copied()
    }

    fn key_of(&self, id: TypeId) -> String {
        self.get(id).structural_key(self)
    }

    /// Canonicalizes `ty` and returns its pooled, stable id.
    pub fn find(&mut self, ty: Type) -> TypeId {
        let key = ty.structural_key(self);
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        self.by_key.insert(key, id);
        id
    }

    pub fn type_type_id(&self) -> TypeId {
        // The pool is seeded with the atom types in a fixed order by
        // `CompileSession::new`; `TypeType` is always index 3 (see
        // `session::seed_atoms`). Kept as a lookup rather than a hardcoded
        // index so a reordering of the seed list can't silently break this.
        self.by_key
            .get(&Type::TypeType.structural_key(self))
            .copied()
            .expect("TypeType must be seeded before use")
    }

    /// Smallest common target under the implicit rules, or `a`'s explicit
    /// target `b` (checked symmetrically), else `None`.
    pub fn join(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        if self.get(a).implicitly(b, self) {
            return Some(b);
        }
        if self.get(b).implicitly(a, self) {
            return Some(a);
        }
        if self.get(a).explicitly(b, self) {
            return Some(b);
        }
        if self.get(b).explicitly(a, self) {
            return Some(a);
        }
        None
    }
}
