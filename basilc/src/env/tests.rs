use super::*;
use crate::meta::Meta;
use crate::types::{Type, TypePool};

fn sample_entry(pool: &mut TypePool) -> Entry {
    let ty = pool.find(Type::Numeric { width: 8, signed: true, float: false });
    Entry::new(ty, Meta::Int(0), Storage::Local)
}

#[test]
fn lookup_walks_the_parent_chain() {
    let mut pool = TypePool::new();
    let mut arena = StackArena::new();
    let mut symbols = SymbolTable::new();
    let root = arena.alloc(Stack::new_table_carrying(None));
    let child = arena.alloc(Stack::new_transparent(Some(root)));

    let x = symbols.intern("x");
    arena.bind(root, x, sample_entry(&mut pool));

    assert!(arena.lookup(child, x).is_some());
    let y = symbols.intern("y");
    assert!(arena.lookup(child, y).is_none());
}

#[test]
fn binding_on_a_transparent_scope_reaches_its_table_carrying_ancestor() {
    let mut pool = TypePool::new();
    let mut arena = StackArena::new();
    let mut symbols = SymbolTable::new();
    let root = arena.alloc(Stack::new_table_carrying(None));
    let child = arena.alloc(Stack::new_transparent(Some(root)));

    let x = symbols.intern("x");
    arena.bind(child, x, sample_entry(&mut pool));

    assert!(arena.get(root).lookup_local(x).is_some());
}

#[test]
fn method_cache_invalidates_on_new_registration() {
    let mut pool = TypePool::new();
    let mut arena = StackArena::new();
    let root = arena.alloc(Stack::new_table_carrying(None));
    let a = pool.find(Type::Bool);
    let b = pool.find(Type::Char);

    assert!(arena.find_method(root, (a, b)).is_none());
    arena.register_method(root, (a, b), sample_entry(&mut pool));
    assert!(arena.find_method(root, (a, b)).is_some());
}

mod push {
    use crate::graph::{eval, Node};
    use crate::session::CompileSession;
    use basilc_syntax::{Span, Term, TermKind};

    fn var(name: &str) -> Term {
        Term::var(name, Span::start())
    }

    fn int(v: i64) -> Term {
        Term::new(TermKind::Integer(v), Span::start())
    }

    #[test]
    fn pushing_an_unbound_var_onto_a_type_declares_it() {
        let mut session = CompileSession::new();
        let root = session.root;
        let ty = session.i64_type();
        let ty_node = session.graph.alloc(Node::TypeLit(ty), 0, 0);
        let v = eval(&var("x"), &mut session, root);

        let result = super::super::push(&mut session, root, ty_node, v);
        assert!(matches!(session.graph.node(result), Node::Define { .. }));
    }

    #[test]
    fn pushing_an_already_bound_var_onto_a_type_falls_back_to_a_call() {
        let mut session = CompileSession::new();
        let root = session.root;
        let sym = session.symbols.intern("x");
        let ty = session.i64_type();
        session.stacks.bind(
            root,
            sym,
            crate::env::Entry::new(ty, crate::meta::Meta::Int(0), crate::env::Storage::Local),
        );

        let ty_node = session.graph.alloc(Node::TypeLit(ty), 0, 0);
        let v = eval(&var("x"), &mut session, root);

        let result = super::super::push(&mut session, root, ty_node, v);
        assert!(matches!(session.graph.node(result), Node::Call { .. }));
    }

    #[test]
    fn pushing_a_plain_value_onto_another_plain_value_falls_back_to_a_call() {
        let mut session = CompileSession::new();
        let root = session.root;
        let top = eval(&int(1), &mut session, root);
        let v = eval(&int(2), &mut session, root);

        let result = super::super::push(&mut session, root, top, v);
        assert!(matches!(session.graph.node(result), Node::Call { callee, arg } if *callee == top && *arg == v));
    }
}
