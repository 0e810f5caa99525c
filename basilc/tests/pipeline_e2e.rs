//! End-to-end tests driving source text all the way through to assembly.

use basilc::pipeline;
use basilc::CompileSession;
use basilc_syntax::parse;

fn compile_source(source: &str) -> (usize, String) {
    let term = parse(source).unwrap_or_else(|e| panic!("parse error: {e}"));
    let mut session = CompileSession::new();
    let output = pipeline::run(&term, &mut session);
    (output.error_count, output.assembly)
}

#[test]
fn an_arithmetic_literal_compiles_with_no_errors() {
    let (errors, assembly) = compile_source("1 + 2 * 3");
    assert_eq!(errors, 0);
    assert!(assembly.contains("main:"));
    assert!(assembly.contains("_start:"));
}

#[test]
fn a_let_binding_followed_by_a_reference_compiles_with_no_errors() {
    let (errors, assembly) = compile_source("let x = 10; x + 1");
    assert_eq!(errors, 0);
    assert!(!assembly.is_empty());
}

#[test]
fn an_if_expression_over_a_constant_condition_compiles_with_no_errors() {
    let (errors, _assembly) = compile_source("if true: 1");
    assert_eq!(errors, 0);
}

#[test]
fn referencing_an_unbound_name_is_reported_but_still_produces_assembly() {
    let (errors, assembly) = compile_source("totally_unbound_name");
    assert!(errors > 0);
    assert!(!assembly.is_empty());
}

#[test]
fn the_same_source_compiles_to_identical_assembly_twice() {
    let source = "let a = 2; let b = 3; a * b";
    let (_, first) = compile_source(source);
    let (_, second) = compile_source(source);
    assert_eq!(first, second);
}

#[test]
fn a_lambda_call_compiles_with_no_errors_and_emits_a_called_function() {
    let (errors, assembly) = compile_source("let f = x:i64 -> x * x; print f 9");
    assert_eq!(errors, 0);
    assert!(assembly.contains("call "));
    let called = assembly
        .lines()
        .find_map(|l| l.trim().strip_prefix("call "))
        .expect("at least one call instruction");
    assert!(assembly.contains(&format!("{called}:")));
}

#[test]
fn an_intersection_call_compiles_with_no_errors_and_emits_two_functions() {
    let (errors, assembly) =
        compile_source("let g = (x:i64 -> x + 1) & (x:f64 -> x + 1.0); print g 2; print g 2.5");
    assert_eq!(errors, 0);
    let label_lines = assembly.lines().filter(|l| l.ends_with(':')).count();
    assert!(label_lines >= 2);
}

#[test]
fn a_recursive_factorial_compiles_with_no_errors() {
    let (errors, assembly) =
        compile_source("let fact = n:i64 -> if n == 0: 1; n * fact(n - 1); print fact 5");
    assert_eq!(errors, 0);
    assert!(!assembly.is_empty());
}

#[test]
fn referencing_a_non_lvalue_is_reported_as_an_error() {
    let (errors, _assembly) = compile_source("~(1 + 2)");
    assert!(errors > 0);
}
