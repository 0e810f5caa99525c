use super::*;
use crate::ir::{DataKind, Insn, Location, Segment};

fn i64_ty(pool: &mut TypePool) -> crate::types::TypeId {
    pool.find(Type::Numeric { width: 8, signed: true, float: false })
}

#[test]
fn mov_with_identical_source_and_destination_emits_nothing() {
    let mut types = TypePool::new();
    let ty = i64_ty(&mut types);
    let mut func = Function::new("f");
    let loc = func.alloc_location(Location { segment: Segment::Register, offset: 0, reg: Some(PhysReg::Rcx), ty, imm: None, base: None, name: String::new() });
    let mut p = Printer::new();
    p.mov(&func, loc, loc, OperandSize::Qword);
    assert!(p.text.is_empty());
}

#[test]
fn imul_into_a_stack_destination_stages_through_rax() {
    let mut types = TypePool::new();
    let ty = i64_ty(&mut types);
    let mut func = Function::new("f");
    let dest = func.alloc_location(Location { segment: Segment::Stack, offset: 0, reg: None, ty, imm: None, base: None, name: String::new() });
    let src = func.alloc_location(Location { segment: Segment::Register, offset: 0, reg: Some(PhysReg::Rcx), ty, imm: None, base: None, name: String::new() });
    let mut p = Printer::new();
    p.imul(&func, dest, src, OperandSize::Qword);
    assert_eq!(p.text.matches("%rax").count(), 3);
}

#[test]
fn data_kind_suffix_matches_width() {
    let mut types = TypePool::new();
    let f32_ty = types.find(Type::Numeric { width: 4, signed: false, float: true });
    let f64_ty = types.find(Type::Numeric { width: 8, signed: false, float: true });
    assert_eq!(size_of(f32_ty, &types), OperandSize::Single);
    assert_eq!(size_of(f64_ty, &types), OperandSize::Double);
}

#[test]
fn emitting_a_module_twice_produces_identical_text() {
    let mut types = TypePool::new();
    let ty = i64_ty(&mut types);
    let mut module = CodeGenerator::new();
    let mut func = Function::new("main");
    let a = func.alloc_location(Location { segment: Segment::Register, offset: 0, reg: Some(PhysReg::Rcx), ty, imm: None, base: None, name: String::new() });
    let data_id = module.intern_int(42);
    func.location_mut(a).imm = Some(data_id);
    func.add(Insn::Data { kind: DataKind::Int, dest: a });
    func.add(Insn::Ret { value: Some(a) });
    module.push_function(func);

    let out1 = Printer::new().emit(&module, &types);
    let out2 = Printer::new().emit(&module, &types);
    assert_eq!(out1, out2);
}

#[test]
fn emitted_assembly_contains_the_function_label_and_prelude() {
    let types = TypePool::new();
    let mut module = CodeGenerator::new();
    let func = Function::new("main");
    module.push_function(func);
    let out = Printer::new().emit(&module, &types);
    assert!(out.contains("_start"));
    assert!(out.contains("main:"));
}
