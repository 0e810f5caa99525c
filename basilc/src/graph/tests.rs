use super::*;
use crate::ir::{CodeGenerator, Function};
use crate::meta::Meta;
use crate::session::CompileSession;
use basilc_syntax::{Span, Term, TermKind};

fn int(v: i64) -> Term {
    Term::new(TermKind::Integer(v), Span::start())
}

fn var(name: &str) -> Term {
    Term::var(name, Span::start())
}

#[test]
fn arithmetic_folds_to_a_constant_and_types_as_the_joined_numeric_type() {
    let mut session = CompileSession::new();
    let root = session.root;
    let term = Term::binary("+", int(2), int(3), Span::start());
    let id = eval(&term, &mut session, root);

    assert_eq!(fold(&mut session, root, id), Some(Meta::Int(5)));
    let ty = type_of(&mut session, root, id);
    assert_eq!(ty, session.i64_type());
}

#[test]
fn let_binding_is_visible_to_a_later_reference_in_the_same_scope() {
    let mut session = CompileSession::new();
    let root = session.root;
    let let_term = Term::marker("let", vec![var("x"), int(41)], Span::start());
    let let_id = eval(&let_term, &mut session, root);
    fold(&mut session, root, let_id);

    let use_term = var("x");
    let use_id = eval(&use_term, &mut session, root);
    assert_eq!(fold(&mut session, root, use_id), Some(Meta::Int(41)));
}

#[test]
fn if_with_a_false_constant_condition_folds_to_void_without_evaluating_the_body() {
    let mut session = CompileSession::new();
    let root = session.root;
    let cond = Term::new(TermKind::Bool(false), Span::start());
    // A body that would fail to fold if ever evaluated (undeclared variable).
    let body = var("never_bound");
    let if_term = Term::marker("if", vec![cond, body], Span::start());
    let id = eval(&if_term, &mut session, root);

    assert_eq!(fold(&mut session, root, id), Some(Meta::Void));
}

#[test]
fn unary_minus_lowers_to_a_subtraction_from_zero() {
    let mut session = CompileSession::new();
    let root = session.root;
    let term = Term::unary("-", int(7), Span::start());
    let id = eval(&term, &mut session, root);
    assert_eq!(fold(&mut session, root, id), Some(Meta::Int(-7)));
}

#[test]
fn gen_emits_one_data_instruction_per_constant_and_a_math_instruction_for_the_sum() {
    let mut session = CompileSession::new();
    let root = session.root;
    let term = Term::binary("+", int(2), int(3), Span::start());
    let id = eval(&term, &mut session, root);

    let mut module = CodeGenerator::new();
    let mut func = Function::new("main");
    let dest = gen::gen(&mut session, &mut module, &mut func, root, id);

    assert!(dest.is_some());
    let data_count = func.insns.iter().filter(|i| matches!(i, crate::ir::Insn::Data { .. })).count();
    assert_eq!(data_count, 2);
    let math_count = func.insns.iter().filter(|i| matches!(i, crate::ir::Insn::BinMath { .. })).count();
    assert_eq!(math_count, 1);
}

#[test]
fn an_autodefine_binds_the_generated_location_for_a_later_read() {
    let mut session = CompileSession::new();
    let root = session.root;
    let let_term = Term::marker("let", vec![var("x"), int(9)], Span::start());
    let let_id = eval(&let_term, &mut session, root);

    let mut module = CodeGenerator::new();
    let mut func = Function::new("main");
    gen::gen(&mut session, &mut module, &mut func, root, let_id);

    let use_term = var("x");
    let use_id = eval(&use_term, &mut session, root);
    let loc = gen::gen(&mut session, &mut module, &mut func, root, use_id);
    assert!(loc.is_some());
}

#[test]
fn a_lambda_call_is_inlined_at_fold_time() {
    let mut session = CompileSession::new();
    let root = session.root;
    let lambda_term = Term::marker(
        "lambda",
        vec![var("n"), Term::binary("+", var("n"), int(1), Span::start())],
        Span::start(),
    );
    let call_term = Term::block(vec![lambda_term, int(10)], Span::start());
    let id = eval(&call_term, &mut session, root);
    assert_eq!(fold(&mut session, root, id), Some(Meta::Int(11)));
}

fn typed_param(name: &str, ty: &str) -> Term {
    Term::marker("annotate", vec![var(name), var(ty)], Span::start())
}

#[test]
fn a_named_lambda_bound_by_let_lowers_to_a_called_function_at_gen_time() {
    let mut session = CompileSession::new();
    let root = session.root;
    let lambda_term = Term::marker(
        "lambda",
        vec![typed_param("x", "i64"), Term::binary("*", var("x"), var("x"), Span::start())],
        Span::start(),
    );
    let let_term = Term::marker("let", vec![var("f"), lambda_term], Span::start());
    let let_id = eval(&let_term, &mut session, root);

    let mut module = CodeGenerator::new();
    let mut func = Function::new("main");
    gen::gen(&mut session, &mut module, &mut func, root, let_id);

    let call_term = Term::block(vec![var("f"), int(9)], Span::start());
    let call_id = eval(&call_term, &mut session, root);
    let dest = gen::gen(&mut session, &mut module, &mut func, root, call_id);

    assert!(dest.is_some());
    assert_eq!(module.functions.len(), 1);
    let call_count =
        func.insns.iter().filter(|i| matches!(i, crate::ir::Insn::Call { .. })).count();
    assert_eq!(call_count, 1);
}

#[test]
fn an_intersection_call_dispatches_to_the_member_matching_the_argument_type() {
    let mut session = CompileSession::new();
    let root = session.root;
    let int_branch = Term::marker(
        "lambda",
        vec![typed_param("x", "i64"), Term::binary("+", var("x"), int(1), Span::start())],
        Span::start(),
    );
    let float_branch = Term::marker(
        "lambda",
        vec![
            typed_param("x", "f64"),
            Term::binary("+", var("x"), Term::new(TermKind::Rational(1.0), Span::start()), Span::start()),
        ],
        Span::start(),
    );
    let intersect_term = Term::binary("&", int_branch, float_branch, Span::start());
    let let_term = Term::marker("let", vec![var("g"), intersect_term], Span::start());
    let let_id = eval(&let_term, &mut session, root);

    let mut module = CodeGenerator::new();
    let mut func = Function::new("main");
    gen::gen(&mut session, &mut module, &mut func, root, let_id);

    let call_int = Term::block(vec![var("g"), int(2)], Span::start());
    let call_int_id = eval(&call_int, &mut session, root);
    assert!(gen::gen(&mut session, &mut module, &mut func, root, call_int_id).is_some());

    let call_float =
        Term::block(vec![var("g"), Term::new(TermKind::Rational(2.5), Span::start())], Span::start());
    let call_float_id = eval(&call_float, &mut session, root);
    assert!(gen::gen(&mut session, &mut module, &mut func, root, call_float_id).is_some());

    assert_eq!(module.functions.len(), 2);
}

#[test]
fn referencing_a_non_lvalue_is_rejected_at_type_time() {
    let mut session = CompileSession::new();
    let root = session.root;
    let sum = Term::binary("+", int(1), int(2), Span::start());
    let term = Term::unary("~", sum, Span::start());
    let id = eval(&term, &mut session, root);

    let before = session.errors.count();
    let ty = type_of(&mut session, root, id);
    assert!(session.errors.count() > before);
    assert_eq!(ty, session.error_type());
}
