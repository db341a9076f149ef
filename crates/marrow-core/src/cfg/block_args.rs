//! Block-argument inference, dead-store removal, and `min_loops`
//! lower-bounding.
//!
//! Block arguments come from two cheap over-approximations instead of a
//! full liveness analysis:
//!
//! - `upper_bounds1[b]` — everything some path *from* `b` could still read,
//!   accumulated over the forward order;
//! - `upper_bounds2[b]` — everything some path *to* `b` could have written,
//!   accumulated over the backward order.
//!
//! A block's argument list is the intersection of the two, sorted by
//! symbol id. Cost is `(|blocks| + |symbols|) * |cycles| + |answer|`;
//! anything quadratic here would show up on large methods.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::context::{GlobalState, SymbolId};
use crate::entity::EntityRef;

use super::{BlockId, Cfg, Instruction};

pub(crate) fn fill_in_block_arguments(gs: &mut GlobalState, cfg: &mut Cfg) {
    let mut reads: HashMap<SymbolId, HashSet<BlockId>> = HashMap::new();
    let mut writes: HashMap<SymbolId, HashSet<BlockId>> = HashMap::new();

    for (bb, block) in cfg.basic_blocks.iter() {
        for binding in &block.exprs {
            writes.entry(binding.bind).or_default().insert(bb);
            match &binding.value {
                Instruction::Ident { what } => {
                    reads.entry(*what).or_default().insert(bb);
                }
                Instruction::Send { recv, args, .. } => {
                    reads.entry(*recv).or_default().insert(bb);
                    for arg in args {
                        reads.entry(*arg).or_default().insert(bb);
                    }
                }
                Instruction::Super { args } => {
                    for arg in args {
                        reads.entry(*arg).or_default().insert(bb);
                    }
                }
                Instruction::Return { what } => {
                    reads.entry(*what).or_default().insert(bb);
                }
                Instruction::NamedArg { value, .. } => {
                    reads.entry(*value).or_default().insert(bb);
                }
                Instruction::LoadArg { receiver, .. } => {
                    reads.entry(*receiver).or_default().insert(bb);
                }
                _ => {}
            }
        }
        // A real conditional reads its condition; the sentinels do not.
        if let Some(cond) = block.bexit.cond {
            if cond != gs.defn_cfg_never() && cond != gs.defn_cfg_always() {
                reads.entry(cond).or_default().insert(bb);
            }
        }
    }

    // Lower-bound each local's min_loops over every block that touches it.
    for (what, blocks) in reads.iter().chain(writes.iter()) {
        if !gs.symbol(*what).is_local_variable() {
            continue;
        }
        let mut min = gs.symbol(*what).min_loops;
        for &bb in blocks {
            min = min.min(cfg.basic_blocks[bb].outer_loops);
        }
        gs.symbol_mut(*what).min_loops = min;
    }

    // Remove dead stores. Only value-producing kinds may go; anything that
    // could observe the world stays even when its result is unread.
    for block in cfg.basic_blocks.values_mut() {
        block.exprs.retain(|binding| {
            reads.contains_key(&binding.bind) || !binding.value.is_side_effect_free()
        });
    }

    // A symbol read and written in the same single block never escapes it;
    // a symbol nobody writes (or nobody reads) cannot cross an edge either.
    let block_count = cfg.basic_blocks.len();
    let mut reads_by_block: Vec<HashSet<SymbolId>> = vec![HashSet::new(); block_count];
    let mut writes_by_block: Vec<HashSet<SymbolId>> = vec![HashSet::new(); block_count];

    for (sym, rds) in reads.iter_mut() {
        let wts = writes.entry(*sym).or_default();
        if rds.len() == 1 && wts.len() == 1 && rds.iter().next() == wts.iter().next() {
            wts.clear();
            rds.clear();
        } else if wts.is_empty() {
            rds.clear();
        }
    }
    for (sym, wts) in writes.iter_mut() {
        let rds = reads.entry(*sym).or_default();
        if rds.is_empty() {
            wts.clear();
        }
        for &bb in rds.iter() {
            reads_by_block[bb.index() as usize].insert(*sym);
        }
        for &bb in wts.iter() {
            writes_by_block[bb.index() as usize].insert(*sym);
        }
    }

    let dead = cfg.dead_block();

    // What could still be read on some path from each block.
    let mut upper_bounds1: Vec<HashSet<SymbolId>> = vec![HashSet::new(); block_count];
    let mut changed = true;
    while changed {
        changed = false;
        for &bb in &cfg.forwards_topo_sort {
            let id = bb.index() as usize;
            let before = upper_bounds1[id].len();
            let mut acc = std::mem::take(&mut upper_bounds1[id]);
            acc.extend(reads_by_block[id].iter().copied());
            let exit = &cfg.basic_blocks[bb].bexit;
            let (thenb, elseb) = (exit.thenb, exit.elseb);
            if thenb != dead {
                acc.extend(upper_bounds1[thenb.index() as usize].iter().copied());
            }
            if elseb != dead {
                acc.extend(upper_bounds1[elseb.index() as usize].iter().copied());
            }
            changed = changed || acc.len() != before;
            upper_bounds1[id] = acc;
        }
    }

    // What could have been written on some path into each block.
    let mut upper_bounds2: Vec<HashSet<SymbolId>> = vec![HashSet::new(); block_count];
    changed = true;
    while changed {
        changed = false;
        for &bb in &cfg.backwards_topo_sort {
            let id = bb.index() as usize;
            let before = upper_bounds2[id].len();
            let mut acc = std::mem::take(&mut upper_bounds2[id]);
            acc.extend(writes_by_block[id].iter().copied());
            for &edge in &cfg.basic_blocks[bb].back_edges {
                if edge != dead {
                    acc.extend(upper_bounds2[edge.index() as usize].iter().copied());
                }
            }
            changed = changed || acc.len() != before;
            upper_bounds2[id] = acc;
        }
    }

    for (bb, block) in cfg.basic_blocks.iter_mut() {
        let id = bb.index() as usize;
        let needed = &upper_bounds1[id];
        let written = &upper_bounds2[id];
        let mut args: Vec<SymbolId> = needed
            .iter()
            .copied()
            .filter(|sym| written.contains(sym))
            .collect();
        args.sort();
        block.args = args;
    }

    trace!(
        "block arguments inferred for {} blocks of {}",
        block_count,
        gs.full_name(cfg.symbol)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::test_helpers::*;
    use crate::cfg::{builder, topo, Binding, Cfg};
    use crate::context::Loc;

    fn run_on_entry(fx: &mut Fixture, exprs: Vec<Binding>) -> Cfg {
        let mut cfg = Cfg::new(fx.method_sym, fx.gs.defn_cfg_never());
        let entry = cfg.entry();
        cfg.basic_blocks[entry].exprs = exprs;
        builder::jump_to_dead(&mut cfg, &fx.gs, entry).expect("entry already terminated");
        topo::fill_in_topo_sorts(&mut cfg);
        fill_in_block_arguments(&mut fx.gs, &mut cfg);
        cfg
    }

    #[test]
    fn dead_pure_bindings_are_removed_dead_effects_kept() {
        let mut fx = Fixture::new("f", &["x"]);
        let x = fx.params[0];
        let fun = fx.name("poke");
        let t = fx.gs.new_temporary(fx.gs.well_known.stat_temp, fx.method_sym);
        let n = fx.gs.new_temporary(fx.gs.well_known.stat_temp, fx.method_sym);
        let s = fx.gs.new_temporary(fx.gs.well_known.stat_temp, fx.method_sym);

        let cfg = run_on_entry(
            &mut fx,
            vec![
                // Unread literal: deleted.
                Binding::new(t, Loc::NONE, Instruction::IntLit { value: 7 }),
                // Unread nil: retained (not in the pure set).
                Binding::new(n, Loc::NONE, Instruction::Nil),
                // Unread send: retained, calls observe the world.
                Binding::new(
                    s,
                    Loc::NONE,
                    Instruction::Send {
                        recv: x,
                        fun,
                        args: vec![],
                    },
                ),
            ],
        );

        let exprs = &cfg.basic_blocks[cfg.entry()].exprs;
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].value, Instruction::Nil);
        assert!(matches!(exprs[1].value, Instruction::Send { .. }));
    }

    #[test]
    fn symbols_confined_to_one_block_produce_no_args() {
        let mut fx = Fixture::new("f", &["x"]);
        let x = fx.params[0];
        let r = fx.gs.new_temporary(fx.gs.well_known.return_temp, fx.method_sym);

        let cfg = run_on_entry(
            &mut fx,
            vec![
                Binding::new(x, Loc::NONE, Instruction::IntLit { value: 1 }),
                Binding::new(r, Loc::NONE, Instruction::Return { what: x }),
            ],
        );

        for block in cfg.basic_blocks.values() {
            assert!(block.args.is_empty());
        }
    }

    #[test]
    fn min_loops_reflects_deepest_use_of_each_local() {
        // while true; x = 1; end
        let mut fx = Fixture::new("h", &[]);
        let x = fx.local("x");
        let method = fx.method(while_(
            boolean(true, loc(6, 10)),
            assign(ident(x, loc(12, 13)), int(1, loc(16, 17))),
        ));
        fx.build(&method);

        // x lives only inside the loop.
        assert_eq!(fx.gs.symbol(x).min_loops, 1);
    }

    #[test]
    fn args_are_sorted_and_deduplicated() {
        // if c then x = 1; y = 2 else x = 3; y = 4 end; x.plus(y)
        let mut fx = Fixture::new("m", &["c"]);
        let c = fx.params[0];
        let x = fx.local("x");
        let y = fx.local("y");
        let plus = fx.name("plus");
        let body = seq(
            vec![if_(
                ident(c, loc(3, 4)),
                seq(
                    vec![assign(ident(x, loc(10, 11)), int(1, loc(14, 15)))],
                    assign(ident(y, loc(17, 18)), int(2, loc(21, 22))),
                ),
                seq(
                    vec![assign(ident(x, loc(28, 29)), int(3, loc(32, 33)))],
                    assign(ident(y, loc(35, 36)), int(4, loc(39, 40))),
                ),
            )],
            send(
                ident(x, loc(44, 45)),
                plus,
                vec![ident(y, loc(51, 52))],
                None,
            ),
        );
        let method = fx.method(body);
        let cfg = fx.build(&method);

        for block in cfg.basic_blocks.values() {
            let mut sorted = block.args.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(block.args, sorted);
        }
        // The merge block needs both locals.
        let merge = cfg
            .basic_blocks
            .values()
            .find(|b| b.args.contains(&x) && b.args.contains(&y))
            .expect("no block carries both x and y");
        assert!(x < y);
        assert_eq!(merge.args, vec![x, y]);
    }
}
