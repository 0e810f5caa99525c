//! Drives one program `Term` through every phase: graph construction,
//! folding, instruction generation, liveness/allocation, and x86-64
//! emission, returning both the assembly text and whatever errors were
//! collected along the way.

use crate::graph::{self, NodeId};
use crate::ir::{self, CodeGenerator, Frame, Function};
use crate::session::CompileSession;
use crate::x64::Printer;
use basilc_syntax::Term;

#[derive(Debug)]
pub struct PipelineOutput {
    pub root: NodeId,
    pub assembly: String,
    pub error_count: usize,
}

/// Runs the full pipeline over `term` inside `session`, building one
/// `main` function body from the program's top-level sequence.
pub fn run(term: &Term, session: &mut CompileSession) -> PipelineOutput {
    let root = graph::eval(term, session, session.root);
    graph::type_of(session, session.root, root);

    let mut module = CodeGenerator::new();
    let mut main = Function::new("main");
    let result = graph::gen(session, &mut module, &mut main, session.root, root);
    if let Some(loc) = result {
        main.add(ir::Insn::Ret { value: Some(loc) });
    } else {
        main.add(ir::Insn::Ret { value: None });
    }
    module.push_function(main);
    module.finalize();

    for func in &mut module.functions {
        let sets = ir::analyze_liveness(func);
        ir::allocate(func, &sets, &session.types);
    }

    let assembly = Printer::new().emit(&module, &session.types);

    PipelineOutput { root, assembly, error_count: session.errors.count() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basilc_syntax::Span;

    #[test]
    fn a_program_with_no_errors_emits_assembly_containing_main() {
        let mut session = CompileSession::new();
        let term = Term::new(basilc_syntax::TermKind::Integer(42), Span::start());
        let out = run(&term, &mut session);
        assert_eq!(out.error_count, 0);
        assert!(out.assembly.contains("main:"));
    }

    #[test]
    fn an_undeclared_variable_is_reported_but_the_pipeline_still_completes() {
        let mut session = CompileSession::new();
        let term = Term::var("never_bound", Span::start());
        let out = run(&term, &mut session);
        assert!(out.error_count > 0);
        assert!(!out.assembly.is_empty());
    }
}
