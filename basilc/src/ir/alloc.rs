//! Linear-scan register allocation over the intervals implied by
//! `liveness::analyze_liveness`'s in/out sets.

use super::{Function, LiveSets, Location, LocationId, PhysReg, Segment, INT_POOL, XMM_POOL};
use crate::types::{Type, TypePool};
use std::collections::HashMap;

/// Assigns a `PhysReg` or a spill-to-stack `Location` to every Location
/// defined in `func`, driven by where each one first becomes live
/// (`allocations[i]`) and where it's last live (`frees[i]`). Also grows
/// `func.backup_slots` to the max count of registers simultaneously
/// clobbered across any one call site.
pub fn allocate(func: &mut Function, sets: &LiveSets, types: &TypePool) {
    let n = func.insns.len();
    let mut allocations: Vec<Vec<LocationId>> = vec![Vec::new(); n];
    let mut frees: Vec<Vec<LocationId>> = vec![Vec::new(); n];

    let mut first_live: HashMap<LocationId, usize> = HashMap::new();
    let mut last_live: HashMap<LocationId, usize> = HashMap::new();
    for i in 0..n {
        for loc in sets.live_in[i].iter().chain(sets.live_out[i].iter()) {
            first_live.entry(*loc).or_insert(i);
            last_live.insert(*loc, i);
        }
    }
    for (loc, i) in first_live {
        allocations[i].push(loc);
    }
    for (loc, i) in last_live {
        frees[i].push(loc);
    }

    let mut free_int: Vec<PhysReg> = INT_POOL.to_vec();
    let mut free_xmm: Vec<PhysReg> = XMM_POOL.to_vec();
    let mut assigned: HashMap<LocationId, PhysReg> = HashMap::new();
    let mut max_clobbered = 0usize;

    for i in 0..n {
        for loc in &frees[i] {
            if let Some(reg) = assigned.remove(loc) {
                release(reg, &mut free_int, &mut free_xmm);
            }
        }
        for loc in allocations[i].clone() {
            let is_float = matches!(types.get(func.location(loc).ty), Type::Numeric { float: true, .. });
            let pool = if is_float { &mut free_xmm } else { &mut free_int };
            if let Some(reg) = pool.pop() {
                assigned.insert(loc, reg);
                func.location_mut(loc).segment = Segment::Register;
                func.location_mut(loc).reg = Some(reg);
            } else {
                let ty = func.location(loc).ty;
                let offset = func.stack_slots as i64;
                func.stack_slots += 8;
                func.needs_stack = true;
                let slot = Location {
                    segment: Segment::Stack,
                    offset,
                    reg: None,
                    ty,
                    imm: None,
                    base: None,
                    name: String::new(),
                };
                *func.location_mut(loc) = slot;
            }
        }
        if is_call(&func.insns[i]) {
            max_clobbered = max_clobbered.max(assigned.len());
        }
    }

    func.backup_slots.clear();
    for _ in 0..max_clobbered {
        let id = func.alloc_location(Location::unassigned(func.locations()[0].ty));
        func.backup_slots.push(id);
    }
}

fn release(reg: PhysReg, free_int: &mut Vec<PhysReg>, free_xmm: &mut Vec<PhysReg>) {
    if reg.is_xmm() {
        free_xmm.push(reg);
    } else {
        free_int.push(reg);
    }
}

fn is_call(insn: &super::Insn) -> bool {
    matches!(insn, super::Insn::Call { .. } | super::Insn::CCall { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{analyze_liveness, DataKind, Frame, Insn};

    #[test]
    fn no_two_simultaneously_live_locations_share_a_register() {
        let mut types = TypePool::new();
        let i64_ty = types.find(Type::Numeric { width: 8, signed: true, float: false });

        let mut f = Function::new("t");
        let locs: Vec<_> = (0..12)
            .map(|_| f.alloc_location(Location::unassigned(i64_ty)))
            .collect();
        for &loc in &locs {
            f.add(Insn::Data { kind: DataKind::Int, dest: loc });
        }
        // Keep every value live simultaneously by reading them all at the end.
        let sum = f.alloc_location(Location::unassigned(i64_ty));
        let mut acc = locs[0];
        for &loc in &locs[1..] {
            f.add(Insn::BinMath { op: crate::ir::MathOp::Add, dest: sum, lhs: acc, rhs: loc });
            acc = sum;
        }

        let sets = analyze_liveness(&f);
        allocate(&mut f, &sets, &types);

        let mut by_reg: HashMap<PhysReg, Vec<LocationId>> = HashMap::new();
        for (idx, loc) in f.locations().iter().enumerate() {
            if let Some(reg) = loc.reg {
                by_reg.entry(reg).or_default().push(LocationId(idx as u32));
            }
        }
        for ids in by_reg.values() {
            for a in ids {
                for b in ids {
                    if a != b {
                        let overlap = (0..f.insns.len())
                            .any(|i| sets.live_out[i].contains(a) && sets.live_out[i].contains(b));
                        assert!(!overlap, "locations {:?} and {:?} share a register while both live", a, b);
                    }
                }
            }
        }
    }
}
