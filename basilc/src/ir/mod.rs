//! The linear intermediate representation: storage locations,
//! instructions, and the per-function/per-module frames that own them.
//! `finalize`, liveness, and register allocation live in `liveness.rs`
//! and `alloc.rs`; this module defines the data they operate on.

mod alloc;
mod liveness;
#[cfg(test)]
mod tests;

pub use alloc::allocate;
pub use liveness::{analyze_liveness, LiveSets};

use crate::types::TypeId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Invalid,
    Unassigned,
    Stack,
    Data,
    Register,
    RegisterRelative,
    Immediate,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysReg {
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
}

impl PhysReg {
    pub fn is_xmm(self) -> bool {
        matches!(
            self,
            PhysReg::Xmm0
                | PhysReg::Xmm1
                | PhysReg::Xmm2
                | PhysReg::Xmm3
                | PhysReg::Xmm4
                | PhysReg::Xmm5
                | PhysReg::Xmm6
                | PhysReg::Xmm7
        )
    }

    /// AT&T-syntax register name, used verbatim by `x64::Printer`.
    pub fn name(self) -> &'static str {
        match self {
            PhysReg::Rax => "rax",
            PhysReg::Rcx => "rcx",
            PhysReg::Rdx => "rdx",
            PhysReg::Rbx => "rbx",
            PhysReg::Rsp => "rsp",
            PhysReg::Rbp => "rbp",
            PhysReg::Rsi => "rsi",
            PhysReg::Rdi => "rdi",
            PhysReg::R8 => "r8",
            PhysReg::R9 => "r9",
            PhysReg::R10 => "r10",
            PhysReg::R11 => "r11",
            PhysReg::R12 => "r12",
            PhysReg::R13 => "r13",
            PhysReg::R14 => "r14",
            PhysReg::R15 => "r15",
            PhysReg::Xmm0 => "xmm0",
            PhysReg::Xmm1 => "xmm1",
            PhysReg::Xmm2 => "xmm2",
            PhysReg::Xmm3 => "xmm3",
            PhysReg::Xmm4 => "xmm4",
            PhysReg::Xmm5 => "xmm5",
            PhysReg::Xmm6 => "xmm6",
            PhysReg::Xmm7 => "xmm7",
        }
    }
}

/// Caller-saved integer pool the allocator hands out: excludes `Rax`
/// (the emitter's scratch register), `Rsp`/`Rbp` (frame pointers), and
/// `Rdi`/`Rsi`/`Rdx` (the first three System V argument registers used
/// by `CCall` marshalling).
pub const INT_POOL: &[PhysReg] = &[
    PhysReg::Rcx,
    PhysReg::Rbx,
    PhysReg::R8,
    PhysReg::R9,
    PhysReg::R10,
    PhysReg::R11,
    PhysReg::R12,
    PhysReg::R13,
    PhysReg::R14,
    PhysReg::R15,
];

/// XMM pool the allocator hands out: excludes `Xmm7`, the emitter's
/// float scratch register.
pub const XMM_POOL: &[PhysReg] =
    &[PhysReg::Xmm0, PhysReg::Xmm1, PhysReg::Xmm2, PhysReg::Xmm3, PhysReg::Xmm4, PhysReg::Xmm5, PhysReg::Xmm6];

/// A storage location a value lives in, identity-compared on the fields
/// that actually determine aliasing; `name`/`ty` are bookkeeping only.
#[derive(Debug, Clone)]
pub struct Location {
    pub segment: Segment,
    pub offset: i64,
    pub reg: Option<PhysReg>,
    pub ty: TypeId,
    pub imm: Option<DataId>,
    pub base: Option<LocationId>,
    pub name: String,
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.segment == other.segment
            && self.offset == other.offset
            && self.reg == other.reg
            && self.base == other.base
    }
}
impl Eq for Location {}

impl Location {
    pub fn unassigned(ty: TypeId) -> Self {
        Self { segment: Segment::Unassigned, offset: 0, reg: None, ty, imm: None, base: None, name: String::new() }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.segment, Segment::Stack | Segment::Data | Segment::RegisterRelative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Int,
    Float,
    Str,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Xor,
}

/// One instruction in a function's flat body. Control flow is
/// label-addressed rather than basic-block-addressed, matching the
/// original compiler's flat instruction stream (no SSA phi nodes; a
/// variable's Location is reassigned in place instead).
#[derive(Debug, Clone)]
pub enum Insn {
    Data { kind: DataKind, dest: LocationId },
    BinMath { op: MathOp, dest: LocationId, lhs: LocationId, rhs: LocationId },
    Compare { op: CompareOp, dest: LocationId, lhs: LocationId, rhs: LocationId },
    BoolOp { op: BoolOp, dest: LocationId, lhs: LocationId, rhs: LocationId },
    Join { dest: LocationId, members: Vec<LocationId> },
    Field { dest: LocationId, src: LocationId, index: u32 },
    Cast { dest: LocationId, src: LocationId },
    Sizeof { dest: LocationId, ty: TypeId },
    Alloca { dest: LocationId, ty: TypeId },
    Memcpy { dst: LocationId, src: LocationId, len: u32 },
    Goto { label: LabelId },
    IfEqual { cond: LocationId, value: LocationId, label: LabelId },
    Call { dest: Option<LocationId>, symbol: String, args: Vec<LocationId> },
    CCall { dest: Option<LocationId>, symbol: String, args: Vec<LocationId> },
    Ret { value: Option<LocationId> },
    Mov { dest: LocationId, src: LocationId },
    Lea { dest: LocationId, src: LocationId },
    Print { value: LocationId },
    Label(LabelId),
}

impl Insn {
    /// The Location this instruction defines, if any (used by liveness).
    pub fn defines(&self) -> Option<LocationId> {
        match self {
            Insn::Data { dest, .. }
            | Insn::BinMath { dest, .. }
            | Insn::Compare { dest, .. }
            | Insn::BoolOp { dest, .. }
            | Insn::Join { dest, .. }
            | Insn::Field { dest, .. }
            | Insn::Cast { dest, .. }
            | Insn::Sizeof { dest, .. }
            | Insn::Alloca { dest, .. }
            | Insn::Mov { dest, .. }
            | Insn::Lea { dest, .. } => Some(*dest),
            Insn::Call { dest, .. } | Insn::CCall { dest, .. } => *dest,
            _ => None,
        }
    }

    /// The Locations this instruction reads.
    pub fn uses(&self) -> Vec<LocationId> {
        match self {
            Insn::BinMath { lhs, rhs, .. } | Insn::Compare { lhs, rhs, .. } | Insn::BoolOp { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            Insn::Join { members, .. } => members.clone(),
            Insn::Field { src, .. } | Insn::Cast { src, .. } | Insn::Mov { src, .. } | Insn::Lea { src, .. } => {
                vec![*src]
            }
            Insn::Memcpy { dst, src, .. } => vec![*dst, *src],
            Insn::IfEqual { cond, value, .. } => vec![*cond, *value],
            Insn::Call { args, .. } | Insn::CCall { args, .. } => args.clone(),
            Insn::Ret { value } => value.iter().copied().collect(),
            Insn::Print { value } => vec![*value],
            _ => Vec::new(),
        }
    }

    /// Labels a control-transfer instruction targets; drives the
    /// `Goto`/`IfEqual` liveness fixpoint.
    pub fn targets(&self) -> Vec<LabelId> {
        match self {
            Insn::Goto { label } | Insn::IfEqual { label, .. } => vec![*label],
            _ => Vec::new(),
        }
    }

    pub fn is_control_transfer(&self) -> bool {
        matches!(self, Insn::Goto { .. } | Insn::IfEqual { .. })
    }
}

/// Implemented by both a per-function frame and the top-level module
/// frame; the allocation/codegen shape they share.
pub trait Frame {
    fn stack(&mut self, ty: TypeId) -> LocationId;
    fn slot(&mut self, ty: TypeId) -> u32;
    fn add(&mut self, insn: Insn);
    fn label(&mut self, name: &str) -> LabelId;
    fn size(&self) -> u32;
}

/// One compiled function's body: its own instruction stream, stack
/// slots, labels, and the backup slots spilling uses across call sites.
#[derive(Debug, Default)]
pub struct Function {
    pub name: String,
    pub insns: Vec<Insn>,
    pub stack_slots: u32,
    pub labels: HashMap<String, LabelId>,
    pub backup_slots: Vec<LocationId>,
    pub needs_stack: bool,
    /// The single Location this function's lambda parameter lives in,
    /// populated outside the instruction stream by the calling
    /// convention rather than defined by any `Insn`.
    pub param: Option<LocationId>,
    locations: Vec<Location>,
    next_label: u32,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn alloc_location(&mut self, loc: Location) -> LocationId {
        let id = LocationId(self.locations.len() as u32);
        self.locations.push(loc);
        id
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0 as usize]
    }

    pub fn location_mut(&mut self, id: LocationId) -> &mut Location {
        &mut self.locations[id.0 as usize]
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }
}

impl Frame for Function {
    fn stack(&mut self, ty: TypeId) -> LocationId {
        let offset = self.stack_slots as i64;
        self.needs_stack = true;
        self.alloc_location(Location {
            segment: Segment::Stack,
            offset,
            reg: None,
            ty,
            imm: None,
            base: None,
            name: String::new(),
        })
    }

    fn slot(&mut self, ty: TypeId) -> u32 {
        let size = 8; // every slot is pointer/qword-sized; narrower types are sub-addressed.
        let _ = ty;
        let slot = self.stack_slots;
        self.stack_slots += size;
        slot
    }

    fn add(&mut self, insn: Insn) {
        self.insns.push(insn);
    }

    fn label(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.labels.get(name) {
            return id;
        }
        let id = LabelId(self.next_label);
        self.next_label += 1;
        self.labels.insert(name.to_string(), id);
        id
    }

    fn size(&self) -> u32 {
        self.stack_slots
    }
}

/// Owns every compiled `Function`, plus the deduplicated data-constant
/// pools shared across the whole module and the top-level frame that
/// holds module-init code (global `let`s, top-level `print`s) outside
/// any function body.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    pub functions: Vec<Function>,
    pub int_consts: HashMap<i64, DataId>,
    pub float_consts: HashMap<u64, DataId>,
    pub string_consts: HashMap<String, DataId>,
    pub bool_consts: HashMap<bool, DataId>,
    /// Maps a source `Lambda` node (by its `NodeId.0`) to the assembly
    /// symbol it was already lowered to, so a lambda reachable from more
    /// than one call site is only lowered into a `Function` once.
    pub lowered_lambdas: HashMap<u32, String>,
    top_level: Function,
    next_data: u32,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self { top_level: Function::new("__init"), ..Self::default() }
    }

    pub fn top_level(&self) -> &Function {
        &self.top_level
    }

    pub fn top_level_mut(&mut self) -> &mut Function {
        &mut self.top_level
    }

    pub fn push_function(&mut self, f: Function) -> usize {
        self.functions.push(f);
        self.functions.len() - 1
    }

    pub fn intern_int(&mut self, v: i64) -> DataId {
        *self.int_consts.entry(v).or_insert_with(|| next_data_id(&mut self.next_data))
    }

    pub fn intern_float(&mut self, v: f64) -> DataId {
        *self.float_consts.entry(v.to_bits()).or_insert_with(|| next_data_id(&mut self.next_data))
    }

    pub fn intern_string(&mut self, v: &str) -> DataId {
        *self
            .string_consts
            .entry(v.to_string())
            .or_insert_with(|| next_data_id(&mut self.next_data))
    }

    pub fn intern_bool(&mut self, v: bool) -> DataId {
        *self.bool_consts.entry(v).or_insert_with(|| next_data_id(&mut self.next_data))
    }

    /// Re-evaluates every function's instruction stream twice so any
    /// constant/temporary registered lazily during the first pass is
    /// visible to the second; a fixpoint over two passes is sufficient
    /// because no instruction's lazy registration depends on a third
    /// pass's output (each insn only ever looks at its own operands).
    pub fn finalize(&mut self) {
        for _ in 0..2 {
            for func in &mut self.functions {
                // Constants are registered at `gen` time already; this pass
                // exists for parity with instructions that only discover
                // their operand Locations once prior instructions have run,
                // which in this flat (non-deferred) builder never happens,
                // but the two-pass shape is kept so adding such an
                // instruction later doesn't require touching this driver.
                let _ = func.insns.len();
            }
        }
    }
}

/// Delegates to the top-level frame so module-init code can be built
/// with the same `Frame` calls a function body uses.
impl Frame for CodeGenerator {
    fn stack(&mut self, ty: TypeId) -> LocationId {
        self.top_level.stack(ty)
    }

    fn slot(&mut self, ty: TypeId) -> u32 {
        self.top_level.slot(ty)
    }

    fn add(&mut self, insn: Insn) {
        self.top_level.add(insn);
    }

    fn label(&mut self, name: &str) -> LabelId {
        self.top_level.label(name)
    }

    fn size(&self) -> u32 {
        self.top_level.size()
    }
}

fn next_data_id(counter: &mut u32) -> DataId {
    let id = DataId(*counter);
    *counter += 1;
    id
}
