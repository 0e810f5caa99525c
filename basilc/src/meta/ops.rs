//! Compile-time arithmetic/comparison/collection operations over `Meta`.
//! Every operation returns `Option<Meta>`; `None` means "not foldable",
//! which `fold` surfaces as "this expression is not a compile-time
//! constant" rather than an error.

use super::Meta;
use std::cell::RefCell;
use std::rc::Rc;

macro_rules! numeric_binop {
    ($name:ident, $int_op:tt, $float_op:tt) => {
        pub fn $name(a: &Meta, b: &Meta) -> Option<Meta> {
            match (a, b) {
                (Meta::Int(x), Meta::Int(y)) => Some(Meta::Int(x $int_op y)),
                (Meta::UInt(x), Meta::UInt(y)) => Some(Meta::UInt(x $int_op y)),
                (Meta::Double(x), Meta::Double(y)) => Some(Meta::Double(x $float_op y)),
                (Meta::Int(x), Meta::Double(y)) => Some(Meta::Double(*x as f64 $float_op y)),
                (Meta::Double(x), Meta::Int(y)) => Some(Meta::Double(x $float_op *y as f64)),
                _ => None,
            }
        }
    };
}

numeric_binop!(add, +, +);
numeric_binop!(sub, -, -);
numeric_binop!(mul, *, *);

pub fn div(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Int(_), Meta::Int(0)) => None,
        (Meta::Int(x), Meta::Int(y)) => Some(Meta::Int(x / y)),
        (Meta::UInt(_), Meta::UInt(0)) => None,
        (Meta::UInt(x), Meta::UInt(y)) => Some(Meta::UInt(x / y)),
        (Meta::Double(x), Meta::Double(y)) => Some(Meta::Double(x / y)),
        (Meta::Int(x), Meta::Double(y)) => Some(Meta::Double(*x as f64 / y)),
        (Meta::Double(x), Meta::Int(y)) => Some(Meta::Double(x / *y as f64)),
        _ => None,
    }
}

pub fn rem(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Int(_), Meta::Int(0)) => None,
        (Meta::Int(x), Meta::Int(y)) => Some(Meta::Int(x % y)),
        (Meta::UInt(_), Meta::UInt(0)) => None,
        (Meta::UInt(x), Meta::UInt(y)) => Some(Meta::UInt(x % y)),
        _ => None,
    }
}

pub fn bool_and(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Bool(x), Meta::Bool(y)) => Some(Meta::Bool(*x && *y)),
        _ => None,
    }
}

pub fn bool_or(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Bool(x), Meta::Bool(y)) => Some(Meta::Bool(*x || *y)),
        _ => None,
    }
}

pub fn bool_xor(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Bool(x), Meta::Bool(y)) => Some(Meta::Bool(*x ^ *y)),
        _ => None,
    }
}

pub fn bool_not(v: Meta) -> Option<Meta> {
    match v {
        Meta::Bool(x) => Some(Meta::Bool(!x)),
        _ => None,
    }
}

pub fn cmp_eq(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Int(_) | Meta::UInt(_) | Meta::Double(_), Meta::Int(_) | Meta::UInt(_) | Meta::Double(_)) => {
            Some(Meta::Bool(numeric_cmp(a, b)? == std::cmp::Ordering::Equal))
        }
        (Meta::Bool(x), Meta::Bool(y)) => Some(Meta::Bool(x == y)),
        (Meta::String(x), Meta::String(y)) => Some(Meta::Bool(*x.borrow() == *y.borrow())),
        _ => None,
    }
}

pub fn cmp_lt(a: &Meta, b: &Meta) -> Option<Meta> {
    Some(Meta::Bool(numeric_cmp(a, b)? == std::cmp::Ordering::Less))
}

pub fn cmp_le(a: &Meta, b: &Meta) -> Option<Meta> {
    Some(Meta::Bool(numeric_cmp(a, b)? != std::cmp::Ordering::Greater))
}

fn numeric_cmp(a: &Meta, b: &Meta) -> Option<std::cmp::Ordering> {
    let (x, y) = (as_f64(a)?, as_f64(b)?);
    x.partial_cmp(&y)
}

fn as_f64(m: &Meta) -> Option<f64> {
    match m {
        Meta::Int(x) => Some(*x as f64),
        Meta::UInt(x) => Some(*x as f64),
        Meta::Double(x) => Some(*x),
        _ => None,
    }
}

/// Cons: an element prepended to a list (another `Cons` or `Void` acting
/// as the empty-list sentinel).
pub fn cons(head: Meta, tail: Meta) -> Meta {
    Meta::Cons { head: Box::new(head), tail: Box::new(tail) }
}

/// Joins two tuples/blocks member-wise into one, or two scalars into a
/// 2-tuple; used by both the `&` operator and tuple-literal construction.
pub fn join(a: &Meta, b: &Meta) -> Option<Meta> {
    match (a, b) {
        (Meta::Tuple(x), Meta::Tuple(y)) => {
            let mut merged = x.borrow().clone();
            merged.extend(y.borrow().iter().cloned());
            Some(Meta::Tuple(Rc::new(RefCell::new(merged))))
        }
        _ => None,
    }
}

/// Truncates an integer Meta to `width` bytes on assignment to a
/// narrower integer type; no-op for already-narrow or non-integer values.
pub fn truncate_to_width(value: &Meta, width: u8, signed: bool) -> Meta {
    match value {
        Meta::Int(v) if signed => Meta::Int(match width {
            1 => *v as i8 as i64,
            2 => *v as i16 as i64,
            4 => *v as i32 as i64,
            _ => *v,
        }),
        Meta::Int(v) if !signed => Meta::UInt(match width {
            1 => *v as u8 as u64,
            2 => *v as u16 as u64,
            4 => *v as u32 as u64,
            _ => *v as u64,
        }),
        other => other.clone(),
    }
}

pub fn to_int(value: &Meta) -> Option<Meta> {
    match value {
        Meta::Int(_) => Some(value.clone()),
        Meta::UInt(v) => Some(Meta::Int(*v as i64)),
        Meta::Double(v) => Some(Meta::Int(*v as i64)),
        Meta::Bool(v) => Some(Meta::Int(*v as i64)),
        _ => None,
    }
}

pub fn to_float(value: &Meta) -> Option<Meta> {
    match value {
        Meta::Double(_) => Some(value.clone()),
        Meta::Int(v) => Some(Meta::Double(*v as f64)),
        Meta::UInt(v) => Some(Meta::Double(*v as f64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_by_zero_is_not_foldable() {
        assert_eq!(div(&Meta::Int(4), &Meta::Int(0)), None);
    }

    #[test]
    fn mixed_int_float_add_promotes_to_float() {
        assert_eq!(add(&Meta::Int(2), &Meta::Double(0.5)), Some(Meta::Double(2.5)));
    }

    #[test]
    fn truncation_wraps_like_a_narrower_integer() {
        assert_eq!(truncate_to_width(&Meta::Int(300), 1, true), Meta::Int(300i64 as i8 as i64));
    }

    #[test]
    fn join_concatenates_tuples() {
        let a = Meta::Tuple(Rc::new(RefCell::new(vec![Meta::Int(1)])));
        let b = Meta::Tuple(Rc::new(RefCell::new(vec![Meta::Int(2)])));
        let joined = join(&a, &b).unwrap();
        assert_eq!(joined, Meta::Tuple(Rc::new(RefCell::new(vec![Meta::Int(1), Meta::Int(2)]))));
    }
}
