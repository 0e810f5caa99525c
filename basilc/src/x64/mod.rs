//! AT&T-syntax x86-64 text emission. `Printer` mirrors the dual
//! text/data buffer shape of a Rust-source code generator, but speaks
//! assembly mnemonics instead of Rust statements: two `String` buffers
//! (`text`, `data`), `write_line`/`indent`/`dedent` bookkeeping, and one
//! method per instruction family.

#[cfg(test)]
mod tests;

use crate::ir::{
    BoolOp, CompareOp, DataId, Frame, Insn, LabelId, Location, LocationId, MathOp, PhysReg, Segment,
};
use crate::ir::{CodeGenerator, Function};
use crate::types::{Type, TypePool};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSize {
    Byte,
    Word,
    Dword,
    Qword,
    Single,
    Double,
}

impl OperandSize {
    fn suffix(self) -> &'static str {
        match self {
            OperandSize::Byte => "b",
            OperandSize::Word => "w",
            OperandSize::Dword => "l",
            OperandSize::Qword => "q",
            OperandSize::Single => "ss",
            OperandSize::Double => "sd",
        }
    }
}

/// Derives the AT&T mnemonic size suffix for a value of type `ty`.
pub fn size_of(ty: crate::types::TypeId, pool: &TypePool) -> OperandSize {
    match pool.get(ty) {
        Type::Numeric { width: 4, float: true, .. } => OperandSize::Single,
        Type::Numeric { float: true, .. } => OperandSize::Double,
        Type::Numeric { width: 1, .. } => OperandSize::Byte,
        Type::Numeric { width: 2, .. } => OperandSize::Word,
        Type::Numeric { width: 4, .. } => OperandSize::Dword,
        Type::Bool | Type::Char => OperandSize::Byte,
        _ => OperandSize::Qword,
    }
}

/// The fixed preamble every emitted module carries once: a `_start`
/// entry trampoline and the `_memreturn`/`_memcpy` runtime helpers every
/// compiled program can call into, analogous to one fixed module
/// preamble emitted before any function body.
const PRELUDE: &str = r#".text
.globl _start
_start:
    call main
    mov %rax, %rdi
    mov $60, %rax
    syscall

_memcpy:
    xor %rcx, %rcx
.Lmemcpy_loop:
    cmp %rdx, %rcx
    je .Lmemcpy_done
    movb (%rsi, %rcx), %al
    movb %al, (%rdi, %rcx)
    inc %rcx
    jmp .Lmemcpy_loop
.Lmemcpy_done:
    ret

_memreturn:
    mov %rdi, %rax
    ret
"#;

/// Wraps the text and data sections being assembled, with the operand
/// formatting and §4.6 guard-clause rules factored into one method per
/// instruction.
#[derive(Debug, Default)]
pub struct Printer {
    text: String,
    data: String,
    indent_level: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent_level {
            self.text.push_str("    ");
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn operand(&self, func: &Function, loc: LocationId) -> String {
        let l = func.location(loc);
        match l.segment {
            Segment::Register => format!("%{}", l.reg.expect("register location carries a reg").name()),
            Segment::Stack => format!("{}(%rbp)", -(l.offset + 8)),
            Segment::Data => format!("{}(%rip)", data_label(l)),
            Segment::Immediate => format!("${}", l.offset),
            Segment::RegisterRelative => {
                format!("{}(%{})", l.offset, l.base.map(|b| func.location(b).reg.unwrap().name()).unwrap_or("rip"))
            }
            Segment::Relative => format!("{}(%rip)", data_label(l)),
            Segment::Invalid | Segment::Unassigned => "<unassigned>".to_string(),
        }
    }

    pub fn label(&mut self, section: &str, name: &str, global: bool) {
        if global {
            self.write_line(&format!(".globl {name}"));
        }
        let _ = section;
        self.text.push_str(name);
        self.text.push_str(":\n");
    }

    // --- data movement ---

    pub fn mov(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        if dest == src {
            return;
        }
        self.write_line(&format!("mov{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn lea(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("lea {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    // --- arithmetic ---

    pub fn add(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("add{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn sub(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("sub{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    /// `imul`'s two-operand form can't target memory directly; a memory
    /// destination is staged through `rax` first and moved back after.
    pub fn imul(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        if func.location(dest).is_memory() {
            self.write_line(&format!("mov{} {}, %rax", size.suffix(), self.operand(func, dest)));
            self.write_line(&format!("imul{} {}, %rax", size.suffix(), self.operand(func, src)));
            self.write_line(&format!("mov{} %rax, {}", size.suffix(), self.operand(func, dest)));
        } else {
            self.write_line(&format!("imul{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
        }
    }

    pub fn mul(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.imul(func, dest, src, size);
    }

    /// Signed division always runs through `rax`/`rdx`, so a memory
    /// destination must be staged the same way `imul` stages one.
    pub fn idiv(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("mov{} {}, %rax", size.suffix(), self.operand(func, dest)));
        self.cdq();
        self.write_line(&format!("idiv{} {}", size.suffix(), self.operand(func, src)));
        self.write_line(&format!("mov{} %rax, {}", size.suffix(), self.operand(func, dest)));
    }

    pub fn div(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.idiv(func, dest, src, size);
    }

    pub fn fdiv(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("div{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cdq(&mut self) {
        self.write_line("cdq");
    }

    // --- comparison / bitwise ---

    pub fn cmp(&mut self, func: &Function, lhs: LocationId, rhs: LocationId, size: OperandSize) {
        self.write_line(&format!("cmp{} {}, {}", size.suffix(), self.operand(func, rhs), self.operand(func, lhs)));
    }

    pub fn and_(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("and{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn or_(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("or{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn xor_(&mut self, func: &Function, dest: LocationId, src: LocationId, size: OperandSize) {
        self.write_line(&format!("xor{} {}, {}", size.suffix(), self.operand(func, src), self.operand(func, dest)));
    }

    pub fn not_(&mut self, func: &Function, dest: LocationId, size: OperandSize) {
        self.write_line(&format!("not{} {}", size.suffix(), self.operand(func, dest)));
    }

    pub fn setcc(&mut self, func: &Function, op: CompareOp, dest: LocationId) {
        self.write_line(&format!("set{} {}", cc_suffix(op), self.operand(func, dest)));
    }

    // --- sign/zero extension & float conversion ---

    pub fn movsx(&mut self, func: &Function, dest: LocationId, src: LocationId, from: OperandSize, to: OperandSize) {
        self.write_line(&format!(
            "movs{}{} {}, {}",
            from.suffix(),
            to.suffix(),
            self.operand(func, src),
            self.operand(func, dest)
        ));
    }

    pub fn movzx(&mut self, func: &Function, dest: LocationId, src: LocationId, from: OperandSize, to: OperandSize) {
        self.write_line(&format!(
            "movz{}{} {}, {}",
            from.suffix(),
            to.suffix(),
            self.operand(func, src),
            self.operand(func, dest)
        ));
    }

    pub fn cvttsd2si(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvttsd2si {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cvttss2si(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvttss2si {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cvtsd2ss(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvtsd2ss {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cvtss2sd(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvtss2sd {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cvtsi2sd(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvtsi2sd {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    pub fn cvtsi2ss(&mut self, func: &Function, dest: LocationId, src: LocationId) {
        self.write_line(&format!("cvtsi2ss {}, {}", self.operand(func, src), self.operand(func, dest)));
    }

    // --- control flow ---

    pub fn jmp(&mut self, name: &str) {
        self.write_line(&format!("jmp {name}"));
    }

    pub fn jcc(&mut self, op: CompareOp, name: &str) {
        self.write_line(&format!("j{} {name}", cc_suffix(op)));
    }

    pub fn call(&mut self, name: &str) {
        self.write_line(&format!("call {name}"));
    }

    pub fn ret(&mut self) {
        self.write_line("ret");
    }

    pub fn syscall(&mut self) {
        self.write_line("syscall");
    }

    pub fn push(&mut self, reg: PhysReg) {
        self.write_line(&format!("push %{}", reg.name()));
    }

    pub fn pop(&mut self, reg: PhysReg) {
        self.write_line(&format!("pop %{}", reg.name()));
    }

    // --- constant pool ---

    pub fn intconst(&mut self, id: DataId, v: i64) {
        self.data.push_str(&format!("{}:\n    .quad {}\n", data_id_label(id), v));
    }

    pub fn fconst(&mut self, id: DataId, v: f64) {
        self.data.push_str(&format!("{}:\n    .quad {}\n", data_id_label(id), v.to_bits()));
    }

    pub fn strconst(&mut self, id: DataId, v: &str) {
        self.data.push_str(&format!(
            "{}:\n    .quad {}\n    .ascii \"{}\"\n",
            data_id_label(id),
            v.len(),
            escape(v)
        ));
    }

    // --- per-instruction dispatch ---

    fn emit_insn(&mut self, func: &Function, insn: &Insn, types: &TypePool, labels: &HashMap<LabelId, String>) {
        match insn {
            Insn::Data { dest, .. } => {
                // The value already lives at `dest.imm`'s data label; a
                // load from the constant pool into the assigned location.
                if let Some(data_id) = func.location(*dest).imm {
                    let size = size_of(func.location(*dest).ty, types);
                    self.write_line(&format!(
                        "mov{} {}(%rip), {}",
                        size.suffix(),
                        data_id_label(data_id),
                        self.operand(func, *dest)
                    ));
                }
            }
            Insn::BinMath { op, dest, lhs, rhs } => {
                let size = size_of(func.location(*dest).ty, types);
                self.mov(func, *dest, *lhs, size);
                match op {
                    MathOp::Add => self.add(func, *dest, *rhs, size),
                    MathOp::Sub => self.sub(func, *dest, *rhs, size),
                    MathOp::Mul => self.imul(func, *dest, *rhs, size),
                    MathOp::Div => self.idiv(func, *dest, *rhs, size),
                    MathOp::Mod => {
                        self.write_line(&format!("mov{} {}, %rax", size.suffix(), self.operand(func, *dest)));
                        self.cdq();
                        self.write_line(&format!("idiv{} {}", size.suffix(), self.operand(func, *rhs)));
                        self.write_line(&format!("mov{} %rdx, {}", size.suffix(), self.operand(func, *dest)));
                    }
                }
            }
            Insn::Compare { op, dest, lhs, rhs } => {
                let size = size_of(func.location(*lhs).ty, types);
                self.cmp(func, *lhs, *rhs, size);
                self.setcc(func, *op, *dest);
            }
            Insn::BoolOp { op, dest, lhs, rhs } => {
                self.mov(func, *dest, *lhs, OperandSize::Byte);
                match op {
                    BoolOp::And => self.and_(func, *dest, *rhs, OperandSize::Byte),
                    BoolOp::Or => self.or_(func, *dest, *rhs, OperandSize::Byte),
                    BoolOp::Xor => self.xor_(func, *dest, *rhs, OperandSize::Byte),
                }
            }
            Insn::Join { dest, members } => {
                for (i, m) in members.iter().enumerate() {
                    self.write_line(&format!("# join member {i} into {}", self.operand(func, *dest)));
                    self.mov(func, *dest, *m, OperandSize::Qword);
                }
            }
            Insn::Field { dest, src, index } => {
                self.write_line(&format!(
                    "mov {}({}), {}",
                    index * 8,
                    self.operand(func, *src),
                    self.operand(func, *dest)
                ));
            }
            Insn::Cast { dest, src } => self.mov(func, *dest, *src, OperandSize::Qword),
            Insn::Sizeof { dest, ty } => {
                let size = types.get(*ty).size(types);
                self.write_line(&format!("mov ${size}, {}", self.operand(func, *dest)));
            }
            Insn::Alloca { dest, .. } => {
                self.write_line(&format!("lea -8(%rsp), {}", self.operand(func, *dest)));
            }
            Insn::Memcpy { dst, src, len } => {
                self.write_line(&format!("lea {}, %rdi", self.operand(func, *dst)));
                self.write_line(&format!("lea {}, %rsi", self.operand(func, *src)));
                self.write_line(&format!("mov ${len}, %rdx"));
                self.call("_memcpy");
            }
            Insn::Goto { label } => self.jmp(labels.get(label).map(String::as_str).unwrap_or("?")),
            Insn::IfEqual { cond, value, label } => {
                self.cmp(func, *cond, *value, OperandSize::Byte);
                self.jcc(CompareOp::Eq, labels.get(label).map(String::as_str).unwrap_or("?"));
            }
            Insn::Call { dest, symbol, args } => {
                if let Some(&first) = args.first() {
                    self.mov_arg_out(func, first);
                }
                self.call(symbol);
                if let Some(d) = dest {
                    self.mov_from_rax(func, *d);
                }
            }
            Insn::CCall { dest, symbol, args } => {
                if let Some(&first) = args.first() {
                    self.mov_arg_out(func, first);
                }
                self.call(symbol);
                if let Some(d) = dest {
                    self.mov_from_rax(func, *d);
                }
            }
            Insn::Ret { value } => {
                if let Some(v) = value {
                    self.write_line(&format!("mov {}, %rax", self.operand(func, *v)));
                }
                self.ret();
            }
            Insn::Mov { dest, src } => self.mov(func, *dest, *src, OperandSize::Qword),
            Insn::Lea { dest, src } => self.lea(func, *dest, *src),
            Insn::Print { value } => {
                self.write_line(&format!("lea {}, %rdi", self.operand(func, *value)));
                self.call("print");
            }
            Insn::Label(id) => {
                if let Some(name) = labels.get(id) {
                    self.text.push_str(name);
                    self.text.push_str(":\n");
                }
            }
        }
    }

    fn mov_from_rax(&mut self, func: &Function, dest: LocationId) {
        if func.location(dest).reg != Some(PhysReg::Rax) {
            self.write_line(&format!("mov %rax, {}", self.operand(func, dest)));
        }
    }

    /// Moves a call's (sole, by this backend's one-parameter-per-lambda
    /// convention) argument into `%rdi` ahead of the `call`. `movq` reads
    /// both GPR and XMM operands in AT&T syntax, so this needs no
    /// `size_of` branch the way `mov` does.
    fn mov_arg_out(&mut self, func: &Function, src: LocationId) {
        self.write_line(&format!("movq {}, %rdi", self.operand(func, src)));
    }

    /// Moves `%rdi` into a function's own parameter Location, in the
    /// prologue, mirroring `mov_arg_out` on the caller side.
    fn mov_arg_in(&mut self, func: &Function, dest: LocationId) {
        self.write_line(&format!("movq %rdi, {}", self.operand(func, dest)));
    }

    fn emit_function(&mut self, func: &Function, types: &TypePool) {
        let labels: HashMap<LabelId, String> =
            func.labels.iter().map(|(name, id)| (*id, format!(".L{}_{}", func.name, name))).collect();
        self.write_line(&format!(".globl {}", func.name));
        self.text.push_str(&func.name);
        self.text.push_str(":\n");
        self.indent();
        self.push(PhysReg::Rbp);
        self.write_line("mov %rsp, %rbp");
        if func.needs_stack {
            self.write_line(&format!("sub ${}, %rsp", func.stack_slots));
        }
        if let Some(param) = func.param {
            self.mov_arg_in(func, param);
        }
        for insn in &func.insns {
            self.emit_insn(func, insn, types, &labels);
        }
        self.write_line("mov %rbp, %rsp");
        self.pop(PhysReg::Rbp);
        self.ret();
        self.dedent();
    }

    /// Assembles `module`'s top-level init code and every function body
    /// into one deterministic text. Constant pools are drained into a
    /// `Vec` sorted by `DataId` first so emission order never depends on
    /// `HashMap` iteration order.
    pub fn emit(mut self, module: &CodeGenerator, types: &TypePool) -> String {
        self.text.push_str(PRELUDE);
        self.text.push('\n');
        self.emit_function(module.top_level(), types);
        for func in &module.functions {
            self.emit_function(func, types);
        }

        let mut consts: Vec<(u32, String)> = Vec::new();
        for (&v, id) in &module.int_consts {
            consts.push((id.0, format!("{}:\n    .quad {}\n", data_id_label(*id), v)));
        }
        for (&bits, id) in &module.float_consts {
            consts.push((id.0, format!("{}:\n    .quad {}\n", data_id_label(*id), bits)));
        }
        for (s, id) in &module.string_consts {
            consts.push((id.0, format!("{}:\n    .quad {}\n    .ascii \"{}\"\n", data_id_label(*id), s.len(), escape(s))));
        }
        for (&b, id) in &module.bool_consts {
            consts.push((id.0, format!("{}:\n    .byte {}\n", data_id_label(*id), b as u8)));
        }
        consts.sort_by_key(|(id, _)| *id);

        let mut out = self.text;
        out.push_str(".data\n");
        for (_, line) in consts {
            out.push_str(&line);
        }
        out.push_str(&self.data);
        out
    }
}

fn cc_suffix(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "e",
        CompareOp::Neq => "ne",
        CompareOp::Lt => "l",
        CompareOp::Le => "le",
        CompareOp::Gt => "g",
        CompareOp::Ge => "ge",
    }
}

fn data_id_label(id: DataId) -> String {
    format!(".Ldata{}", id.0)
}

fn data_label(loc: &Location) -> String {
    loc.imm.map(data_id_label).unwrap_or_else(|| ".Ldata_unknown".to_string())
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}
