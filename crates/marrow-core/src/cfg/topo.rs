//! Whole-graph orderings over an inherently cyclic graph.
//!
//! The forward order is a plain depth-first post-order from the entry and
//! suffices for data-flow that moves with control flow. The backward order
//! starts at the dead block and walks predecessors, with one twist: a loop
//! header is emitted before the predecessors that live inside its loop.
//! That is the only order in which the dealias pass and block-argument
//! inference converge in a bounded number of whole-graph sweeps.

use crate::entity::EntityRef;

use super::{BasicBlock, BlockId, Cfg};

pub(crate) fn fill_in_topo_sorts(cfg: &mut Cfg) {
    // Loop headers are recognized by scanning predecessors in ascending
    // loop depth, so pre-sort every back-edge list. The sort is stable:
    // same-depth predecessors keep insertion order.
    let depths: Vec<i32> = cfg.basic_blocks.values().map(|b| b.outer_loops).collect();
    for block in cfg.basic_blocks.values_mut() {
        block
            .back_edges
            .sort_by_key(|&pred| depths[pred.index() as usize]);
    }

    let entry = cfg.entry();
    let mut forwards = Vec::with_capacity(cfg.basic_blocks.len());
    topo_sort_fwd(cfg, &mut forwards, entry);
    cfg.forwards_topo_sort = forwards;

    let dead = cfg.dead_block();
    let mut backwards = Vec::with_capacity(cfg.basic_blocks.len());
    topo_sort_bwd(cfg, &mut backwards, dead);
    cfg.backwards_topo_sort = backwards;
}

fn topo_sort_fwd(cfg: &mut Cfg, target: &mut Vec<BlockId>, current: BlockId) {
    if cfg.basic_blocks[current].flags & BasicBlock::FORWARD_TOPO_SORT_VISITED != 0 {
        return;
    }
    cfg.basic_blocks[current].flags |= BasicBlock::FORWARD_TOPO_SORT_VISITED;
    let (thenb, elseb) = {
        let exit = &cfg.basic_blocks[current].bexit;
        (exit.thenb, exit.elseb)
    };
    topo_sort_fwd(cfg, target, thenb);
    topo_sort_fwd(cfg, target, elseb);
    target.push(current);
}

fn topo_sort_bwd(cfg: &mut Cfg, target: &mut Vec<BlockId>, current: BlockId) {
    if cfg.basic_blocks[current].flags & BasicBlock::BACKWARD_TOPO_SORT_VISITED != 0 {
        return;
    }
    cfg.basic_blocks[current].flags |= BasicBlock::BACKWARD_TOPO_SORT_VISITED;

    let preds = cfg.basic_blocks[current].back_edges.clone();
    let depth = cfg.basic_blocks[current].outer_loops;

    // Predecessors at a strictly shallower depth come from outside the
    // loop this block heads (if any); visit those first.
    let mut i = 0;
    while i < preds.len() && depth > cfg.basic_blocks[preds[i]].outer_loops {
        topo_sort_bwd(cfg, target, preds[i]);
        i += 1;
    }
    if i > 0 {
        // Loop header: emit it now, before its in-loop predecessors.
        target.push(current);
        while i < preds.len() {
            topo_sort_bwd(cfg, target, preds[i]);
            i += 1;
        }
    } else {
        while i < preds.len() {
            topo_sort_bwd(cfg, target, preds[i]);
            i += 1;
        }
        target.push(current);
    }
}
