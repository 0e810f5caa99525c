use super::TypeId;
use crate::meta::Meta;

/// Attached to function/macro types to express overload selection for a
/// single argument position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Wildcard: matches anything, weakest in `precedes`.
    Unknown,
    /// Matches any value whose type coerces to `TypeId`.
    OfType(TypeId),
    /// Matches only a value structurally equal to this compile-time Meta.
    EqualsValue(Meta),
    /// Sentinel for "no constraint recorded" (distinct from `Unknown`,
    /// which is a deliberately-placed wildcard case).
    Null,
}

impl Constraint {
    /// `EqualsValue` > `OfType` > `Unknown`, used to break ties when more
    /// than one case in an intersection matches an argument.
    pub fn precedes(&self, other: &Constraint) -> bool {
        rank(self) > rank(other)
    }

    pub fn matches(&self, meta: &Meta) -> bool {
        match self {
            Constraint::Unknown | Constraint::Null => true,
            Constraint::OfType(expected) => meta.type_id() == Some(*expected),
            Constraint::EqualsValue(value) => value == meta,
        }
    }

    /// Two equal-value constraints on the same type don't conflict with
    /// each other; anything else sharing a rank is treated as ambiguous.
    pub fn conflicts_with(&self, other: &Constraint) -> bool {
        match (self, other) {
            (Constraint::EqualsValue(a), Constraint::EqualsValue(b)) => a != b,
            (Constraint::Unknown, Constraint::Unknown) => true,
            (Constraint::OfType(a), Constraint::OfType(b)) => a == b,
            _ => false,
        }
    }
}

fn rank(c: &Constraint) -> u8 {
    match c {
        Constraint::Null => 0,
        Constraint::Unknown => 1,
        Constraint::OfType(_) => 2,
        Constraint::EqualsValue(_) => 3,
    }
}
