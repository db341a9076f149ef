//! Folding of copy chains through synthetic temporaries.
//!
//! Needs its own pass (rather than happening during the walk) because a
//! nested assignment can change a name mid-expression:
//! `a.foo(a = "2", if c then a = true else a = nil end)` — the receiver
//! temp must keep the pre-assignment value while later reads see the
//! reassignments. Substitution is restricted to synthetic temporaries,
//! which are single-assignment by construction.
//!
//! One sweep suffices: aliases propagate against control flow, and the
//! backward topological order visits every block after its successors.

use std::collections::HashMap;

use crate::context::{GlobalState, SymbolId};
use crate::entity::EntityRef;

use super::{Cfg, Instruction};

fn maybe_dealias(
    gs: &GlobalState,
    what: SymbolId,
    aliases: &HashMap<SymbolId, SymbolId>,
) -> SymbolId {
    if gs.symbol(what).is_synthetic_temporary {
        aliases.get(&what).copied().unwrap_or(what)
    } else {
        what
    }
}

pub(crate) fn dealias(gs: &GlobalState, cfg: &mut Cfg) {
    let mut out_aliases: Vec<HashMap<SymbolId, SymbolId>> =
        vec![HashMap::new(); cfg.basic_blocks.len()];

    let order = cfg.backwards_topo_sort.clone();
    let dead = cfg.dead_block();
    for bb in order {
        if bb == dead {
            continue;
        }

        // Seed from the first predecessor's exit state, then drop every
        // entry some other predecessor binds to a different symbol. Keys a
        // predecessor has no opinion on survive — a loop header's in-loop
        // predecessor has not been visited yet and must not clear the map.
        let parents = cfg.basic_blocks[bb].back_edges.clone();
        let mut current: HashMap<SymbolId, SymbolId> = match parents.first() {
            Some(&first) => out_aliases[first.index() as usize].clone(),
            None => HashMap::new(),
        };
        for &parent in &parents {
            let other = &out_aliases[parent.index() as usize];
            current.retain(|key, value| match other.get(key) {
                Some(other_value) => other_value == value,
                None => true,
            });
        }

        for binding in cfg.basic_blocks[bb].exprs.iter_mut() {
            if let Instruction::Ident { what } = &mut binding.value {
                *what = maybe_dealias(gs, *what, &current);
            }
            // This write makes earlier aliases pointing at `bind` stale.
            current.retain(|_, value| *value != binding.bind);

            match &mut binding.value {
                Instruction::Ident { what } => {
                    *what = maybe_dealias(gs, *what, &current);
                }
                Instruction::Send { recv, args, .. } => {
                    *recv = maybe_dealias(gs, *recv, &current);
                    for arg in args {
                        *arg = maybe_dealias(gs, *arg, &current);
                    }
                }
                Instruction::Super { args } => {
                    for arg in args {
                        *arg = maybe_dealias(gs, *arg, &current);
                    }
                }
                Instruction::Return { what } => {
                    *what = maybe_dealias(gs, *what, &current);
                }
                Instruction::NamedArg { value, .. } => {
                    *value = maybe_dealias(gs, *value, &current);
                }
                _ => {}
            }

            if let Instruction::Ident { what } = &binding.value {
                current.insert(binding.bind, *what);
            }
        }

        out_aliases[bb.index() as usize] = current;
    }
}
