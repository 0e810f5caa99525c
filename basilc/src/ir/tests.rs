use super::*;
use crate::types::{Type, TypePool};

#[test]
fn location_equality_ignores_name_and_type() {
    let mut types = TypePool::new();
    let i64_ty = types.find(Type::Numeric { width: 8, signed: true, float: false });
    let f64_ty = types.find(Type::Numeric { width: 8, signed: false, float: true });
    let a = Location { segment: Segment::Register, offset: 0, reg: Some(PhysReg::Rcx), ty: i64_ty, imm: None, base: None, name: "a".into() };
    let b = Location { segment: Segment::Register, offset: 0, reg: Some(PhysReg::Rcx), ty: f64_ty, imm: None, base: None, name: "b".into() };
    assert_eq!(a, b);
}

#[test]
fn frame_label_interning_is_idempotent() {
    let mut f = Function::new("main");
    let a = f.label("loop_start");
    let b = f.label("loop_start");
    assert_eq!(a, b);
}

#[test]
fn code_generator_dedups_constants() {
    let mut gen = CodeGenerator::new();
    let a = gen.intern_int(42);
    let b = gen.intern_int(42);
    let c = gen.intern_int(7);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn stack_slots_grow_by_frame_requests() {
    let mut f = Function::new("main");
    let ty = TypePool::new().find(Type::Void);
    let first = f.slot(ty);
    let second = f.slot(ty);
    assert!(second > first);
}
