use super::parse;
use crate::term::TermKind;

fn program_stmts(src: &str) -> Vec<TermKind> {
    match parse(src).unwrap_or_else(|e| panic!("{src:?} failed to parse: {e}")).kind {
        TermKind::Program(stmts) => stmts.into_iter().map(|t| t.kind).collect(),
        other => vec![other],
    }
}

#[test]
fn print_respects_arithmetic_precedence() {
    let stmts = program_stmts("print 1 + 2 * 3");
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        TermKind::Block(members) => {
            assert_eq!(members.len(), 2);
            assert_eq!(members[0].kind, TermKind::Variable("print".into()));
            // 1 + (2 * 3): the '+' block's rhs must itself be a '*' block.
            match &members[1].kind {
                TermKind::Block(add) => match &add[1].kind {
                    TermKind::Variable(op) => assert_eq!(op, "+"),
                    _ => panic!("expected '+' operator term"),
                },
                _ => panic!("expected a binary op block"),
            }
        }
        other => panic!("expected print application, got {other:?}"),
    }
}

#[test]
fn simple_lambda_and_call() {
    let stmts = program_stmts("let f = x:i64 -> x * x; print f 9");
    assert_eq!(stmts.len(), 2);
}

#[test]
fn intersection_of_two_lambdas() {
    let stmts = program_stmts(
        "let g = (x:i64 -> x + 1) & (x:f64 -> x + 1.0); print g 2; print g 2.5",
    );
    assert_eq!(stmts.len(), 3);
}

#[test]
fn recursive_factorial_guard_and_fallthrough_share_one_body() {
    let stmts = program_stmts(
        "let fact = n:i64 -> if n == 0: 1; n * fact(n - 1); print fact 5",
    );
    // exactly two top-level statements: the binding, then the print.
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        TermKind::Block(members) => {
            assert_eq!(members[0].kind, TermKind::Variable("let".into()));
            match &members[2].kind {
                TermKind::Block(lambda) => match &lambda[2].kind {
                    TermKind::Program(body) => assert_eq!(body.len(), 2),
                    other => panic!("expected a two-statement lambda body, got {other:?}"),
                },
                other => panic!("expected a lambda block, got {other:?}"),
            }
        }
        other => panic!("expected a let block, got {other:?}"),
    }
}

#[test]
fn string_concatenation() {
    let stmts = program_stmts(r#"let s = "hi" + " there"; print s"#);
    assert_eq!(stmts.len(), 2);
}

#[test]
fn array_literal_and_index() {
    let stmts = program_stmts("let a = [1,2,3]; print a[1]");
    assert_eq!(stmts.len(), 2);
    match &stmts[1] {
        TermKind::Block(members) => match &members[1].kind {
            TermKind::Block(index) => {
                assert_eq!(index[0].kind, TermKind::Variable("index".into()))
            }
            other => panic!("expected index block, got {other:?}"),
        },
        other => panic!("expected print application, got {other:?}"),
    }
}
