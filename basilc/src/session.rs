//! Owns every shared, program-order-accessed resource: the interned type
//! pool, the symbol table, the value-graph arena, the scope arena, and
//! the error reporter.

use crate::env::{Entry, Storage, Stack, StackArena, StackId, SymbolTable};
use crate::graph::GraphArena;
use crate::meta::Meta;
use crate::types::{Type, TypeId, TypePool};
use crate::ErrorReporter;

#[derive(Debug)]
pub struct CompileSession {
    pub types: TypePool,
    pub symbols: SymbolTable,
    pub graph: GraphArena,
    pub stacks: StackArena,
    pub errors: ErrorReporter,
    pub root: StackId,
    atoms: Atoms,
}

/// The fixed-order atom seeding this session's `TypePool` always performs
/// first, so well-known ids (`TypeType`, `Bool`, ...) are cheap to look up
/// without re-deriving a structural key every time.
#[derive(Debug, Clone, Copy)]
struct Atoms {
    pub empty: TypeId,
    pub void: TypeId,
    pub bool_: TypeId,
    pub type_type: TypeId,
    pub symbol: TypeId,
    pub string: TypeId,
    pub char_: TypeId,
    pub any: TypeId,
    pub error: TypeId,
    pub i64: TypeId,
    pub f64: TypeId,
}

impl CompileSession {
    pub fn new() -> Self {
        let mut types = TypePool::new();
        let atoms = Atoms {
            empty: types.find(Type::Empty),
            void: types.find(Type::Void),
            bool_: types.find(Type::Bool),
            type_type: types.find(Type::TypeType),
            symbol: types.find(Type::Symbol),
            string: types.find(Type::String),
            char_: types.find(Type::Char),
            any: types.find(Type::Any),
            error: types.find(Type::Error),
            i64: types.find(Type::Numeric { width: 8, signed: true, float: false }),
            f64: types.find(Type::Numeric { width: 8, signed: false, float: true }),
        };
        let mut stacks = StackArena::new();
        let root = stacks.alloc(Stack::new_table_carrying(None));
        Self {
            types,
            symbols: SymbolTable::new(),
            graph: GraphArena::new(),
            stacks,
            errors: ErrorReporter::new(),
            root,
            atoms,
        }
    }

    pub fn empty_type(&self) -> TypeId {
        self.atoms.empty
    }
    pub fn void_type(&self) -> TypeId {
        self.atoms.void
    }
    pub fn bool_type(&self) -> TypeId {
        self.atoms.bool_
    }
    pub fn type_type(&self) -> TypeId {
        self.atoms.type_type
    }
    pub fn symbol_type(&self) -> TypeId {
        self.atoms.symbol
    }
    pub fn string_type(&self) -> TypeId {
        self.atoms.string
    }
    pub fn char_type(&self) -> TypeId {
        self.atoms.char_
    }
    pub fn any_type(&self) -> TypeId {
        self.atoms.any
    }
    pub fn error_type(&self) -> TypeId {
        self.atoms.error
    }
    pub fn i64_type(&self) -> TypeId {
        self.atoms.i64
    }
    pub fn f64_type(&self) -> TypeId {
        self.atoms.f64
    }

    pub fn bind(&mut self, scope: StackId, name: &str, ty: TypeId, value: Meta, storage: Storage) {
        let sym = self.symbols.intern(name);
        self.stacks.bind(scope, sym, Entry::new(ty, value, storage));
    }
}

impl Default for CompileSession {
    fn default() -> Self {
        Self::new()
    }
}
