//! Backward dataflow liveness over a function's flat instruction stream.

use super::{Function, Insn, LabelId, LocationId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct LiveSets {
    pub live_in: Vec<HashSet<LocationId>>,
    pub live_out: Vec<HashSet<LocationId>>,
}

/// Computes per-instruction `in`/`out` sets by iterating back to front
/// until the `out` sets stop changing. `Goto`/`IfEqual` union their
/// target label's `out` set into their own and are flagged for a
/// guaranteed second sweep over their predecessors (`revisit`), since a
/// backward-only single pass can miss a loop edge's effect on entries
/// defined after the loop but live across its back-edge.
pub fn analyze_liveness(func: &Function) -> LiveSets {
    let n = func.insns.len();
    let mut live_in: Vec<HashSet<LocationId>> = vec![HashSet::new(); n];
    let mut live_out: Vec<HashSet<LocationId>> = vec![HashSet::new(); n];
    let label_at = index_labels(func);

    let mut revisit: HashSet<usize> = (0..n).collect();
    loop {
        let mut changed = false;
        for i in (0..n).rev() {
            let insn = &func.insns[i];

            let mut out = live_out[i].clone();
            if i + 1 < n {
                out.extend(live_in[i + 1].iter().copied());
            }
            for label in insn.targets() {
                if let Some(&target) = label_at.get(&label) {
                    out.extend(live_in[target].iter().copied());
                }
            }
            if insn.is_control_transfer() {
                revisit.insert(i);
            }

            let mut inset = out.clone();
            if let Some(def) = insn.defines() {
                inset.remove(&def);
            }
            for used in insn.uses() {
                inset.insert(used);
            }

            if out != live_out[i] || inset != live_in[i] {
                changed = true;
            }
            live_out[i] = out;
            live_in[i] = inset;
        }
        if !changed {
            break;
        }
    }

    LiveSets { live_in, live_out }
}

fn index_labels(func: &Function) -> HashMap<LabelId, usize> {
    let mut map = HashMap::new();
    for (i, insn) in func.insns.iter().enumerate() {
        if let Insn::Label(id) = insn {
            map.insert(*id, i);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Frame, Location};
    use crate::types::TypeId;

    fn dummy_loc(f: &mut Function) -> LocationId {
        f.alloc_location(Location::unassigned(TypeId(0)))
    }

    #[test]
    fn a_value_defined_then_used_is_live_between_them() {
        let mut f = Function::new("t");
        let x = dummy_loc(&mut f);
        let y = dummy_loc(&mut f);
        f.add(Insn::Data { kind: crate::ir::DataKind::Int, dest: x });
        f.add(Insn::Mov { dest: y, src: x });
        let sets = analyze_liveness(&f);
        assert!(sets.live_out[0].contains(&x));
        assert!(!sets.live_out[1].contains(&x));
    }

    #[test]
    fn a_loop_back_edge_keeps_the_condition_live_across_the_jump() {
        let mut f = Function::new("t");
        let cond = dummy_loc(&mut f);
        let zero = dummy_loc(&mut f);
        let start = f.label("start");
        let end = f.label("end");
        f.add(Insn::Label(start));
        f.add(Insn::IfEqual { cond, value: zero, label: end });
        f.add(Insn::Goto { label: start });
        f.add(Insn::Label(end));
        let sets = analyze_liveness(&f);
        assert!(sets.live_in[1].contains(&cond));
    }
}
