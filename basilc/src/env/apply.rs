//! Function-application resolution shared between the expression stack's
//! push decision and `Call`'s own resolution.

use crate::types::{Type, TypeId, TypePool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// `arg_type` does not apply to `fn_type` at all.
    NoMatch,
    /// Resolved to exactly one candidate function type.
    Resolved(TypeId),
    /// More than one candidate remained after filtering; these are the
    /// tied candidates, for the caller to report.
    Ambiguous(Vec<TypeId>),
}

/// `tryApply(fn_type, arg_type)`: is `fn_type` callable with an argument of
/// `arg_type`? For a plain function this is a yes/no explicit-convertible
/// check; for an intersection this filters candidates by (a) exact match,
/// else (b) implicit match, else (c) any non-`Any` candidate, and an
/// `Any`-typed member is only ever a last-resort wildcard.
pub fn try_apply(pool: &TypePool, fn_type: TypeId, arg_type: TypeId) -> ApplyResult {
    match pool.get(fn_type) {
        Type::Function { arg, .. } | Type::Macro { arg, .. } => {
            if pool.get(arg_type).explicitly(*arg, pool) {
                ApplyResult::Resolved(fn_type)
            } else {
                ApplyResult::NoMatch
            }
        }
        Type::Intersection(members) => {
            let candidates: Vec<TypeId> = members.iter().copied().collect();
            let exact: Vec<TypeId> = candidates
                .iter()
                .copied()
                .filter(|&m| matches!(function_arg(pool, m), Some(a) if a == arg_type))
                .collect();
            if !exact.is_empty() {
                return resolve_set(exact);
            }
            let implicit: Vec<TypeId> = candidates
                .iter()
                .copied()
                .filter(|&m| {
                    function_arg(pool, m)
                        .map(|a| pool.get(arg_type).implicitly(a, pool))
                        .unwrap_or(false)
                })
                .collect();
            if !implicit.is_empty() {
                return resolve_set(implicit);
            }
            let concrete: Vec<TypeId> = candidates
                .iter()
                .copied()
                .filter(|&m| {
                    function_arg(pool, m)
                        .map(|a| !matches!(pool.get(a), Type::Any))
                        .unwrap_or(false)
                })
                .collect();
            if !concrete.is_empty() {
                return resolve_set(concrete);
            }
            let wildcard: Vec<TypeId> = candidates
                .iter()
                .copied()
                .filter(|&m| matches!(function_arg(pool, m), Some(a) if matches!(pool.get(a), Type::Any)))
                .collect();
            resolve_set(wildcard)
        }
        _ => ApplyResult::NoMatch,
    }
}

fn function_arg(pool: &TypePool, candidate: TypeId) -> Option<TypeId> {
    match pool.get(candidate) {
        Type::Function { arg, .. } | Type::Macro { arg, .. } => Some(*arg),
        _ => None,
    }
}

fn resolve_set(mut candidates: Vec<TypeId>) -> ApplyResult {
    match candidates.len() {
        0 => ApplyResult::NoMatch,
        1 => ApplyResult::Resolved(candidates.remove(0)),
        _ => ApplyResult::Ambiguous(candidates),
    }
}
