use super::*;

fn i64_ty() -> Type {
    Type::Numeric { width: 8, signed: true, float: false }
}

fn i32_ty() -> Type {
    Type::Numeric { width: 4, signed: true, float: false }
}

#[test]
fn interning_is_idempotent() {
    let mut pool = TypePool::new();
    let a = pool.find(i64_ty());
    let b = pool.find(i64_ty());
    assert_eq!(a, b);
}

#[test]
fn distinct_structural_shapes_get_distinct_ids() {
    let mut pool = TypePool::new();
    let a = pool.find(i64_ty());
    let b = pool.find(i32_ty());
    assert_ne!(a, b);
}

#[test]
fn narrower_int_implicitly_converts_to_wider_same_signedness() {
    let mut pool = TypePool::new();
    let narrow = pool.find(i32_ty());
    let wide = pool.find(i64_ty());
    assert!(pool.get(narrow).implicitly(wide, &pool));
    assert!(!pool.get(wide).implicitly(narrow, &pool));
}

#[test]
fn any_only_implicitly_converts_to_any() {
    let mut pool = TypePool::new();
    let any = pool.find(Type::Any);
    let i64_id = pool.find(i64_ty());
    assert!(pool.get(i64_id).implicitly(any, &pool));
    assert!(!pool.get(any).implicitly(i64_id, &pool));
}

#[test]
fn join_prefers_the_narrower_types_wider_common_target() {
    let mut pool = TypePool::new();
    let narrow = pool.find(i32_ty());
    let wide = pool.find(i64_ty());
    assert_eq!(pool.join(narrow, wide), Some(wide));
    assert_eq!(pool.join(wide, narrow), Some(wide));
}

#[test]
fn unrelated_types_do_not_join() {
    let mut pool = TypePool::new();
    let i64_id = pool.find(i64_ty());
    let sym = pool.find(Type::Symbol);
    assert_eq!(pool.join(i64_id, sym), None);
}

#[test]
fn identical_concrete_members_conflict_but_any_never_does() {
    let pool = TypePool::new();
    assert!(i64_ty().conflicts_with(&i64_ty(), &pool));
    assert!(!Type::Any.conflicts_with(&Type::Any, &pool));
}

#[test]
fn function_and_macro_with_the_same_argument_always_conflict() {
    let mut pool = TypePool::new();
    let i64_id = pool.find(i64_ty());
    let ret = pool.find(Type::Void);
    let func = Type::Function { arg: i64_id, ret, quoting: false, constraints: vec![Constraint::Unknown] };
    let mac = Type::Macro { arg: i64_id, quoting: false, constraints: vec![Constraint::Unknown] };
    assert!(func.conflicts_with(&mac, &pool));
}
