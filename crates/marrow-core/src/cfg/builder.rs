//! Lowering of a method AST into a [`Cfg`].
//!
//! The walk is structurally recursive: every case either chains bindings
//! onto the block it was handed and returns it, or closes that block with a
//! terminator and returns the block where evaluation continues. Returning
//! the dead block signals that control cannot fall through; later
//! statements then accumulate in the dead block as dead code.

use std::collections::HashMap;

use log::debug;

use crate::ast::{Expr, MethodDef};
use crate::context::{GlobalState, SymbolId};
use crate::error::CfgError;

use super::{block_args, dealias, topo, Binding, BlockId, Cfg, Instruction};

/// Build the CFG for one method and run the whole refinement pipeline on
/// it: topological sorts, dealiasing, block-argument inference.
pub fn build_for(gs: &mut GlobalState, md: &MethodDef) -> Result<Cfg, CfgError> {
    let mut cfg = Cfg::new(md.symbol, gs.defn_cfg_never());
    let ret_sym = gs.new_temporary(gs.well_known.return_method_temp, md.symbol);
    let self_sym = gs.new_temporary(gs.well_known.self_method_temp, md.symbol);

    let entry = cfg.entry();
    let owner = gs.symbol(md.symbol).owner;
    cfg.basic_blocks[entry].exprs.push(Binding::new(
        self_sym,
        md.loc,
        Instruction::SelfRef { claz: owner },
    ));

    let method_name = gs.symbol(md.symbol).name;
    let arguments = gs.symbol(md.symbol).arguments.clone();
    for (index, arg_sym) in arguments.into_iter().enumerate() {
        let loc = gs.symbol(arg_sym).definition_loc;
        cfg.basic_blocks[entry].exprs.push(Binding::new(
            arg_sym,
            loc,
            Instruction::LoadArg {
                receiver: self_sym,
                method: method_name,
                index,
            },
        ));
    }

    let mut aliases: HashMap<SymbolId, SymbolId> = HashMap::new();
    let cont = walk(gs, &md.rhs, entry, &mut cfg, ret_sym, 0, &mut aliases)?;
    let ret_sym1 = gs.new_temporary(gs.well_known.return_method_temp, md.symbol);
    // Dead assign: the return's own binding target is never read.
    cfg.basic_blocks[cont].exprs.push(Binding::new(
        ret_sym1,
        md.loc,
        Instruction::Return { what: ret_sym },
    ));
    jump_to_dead(&mut cfg, gs, cont)?;

    // Materialize every non-local name touched by the body as an `Alias`
    // binding at the top of the entry block, in symbol-id order.
    let method_loc = gs.symbol(md.symbol).definition_loc;
    let mut prefix: Vec<Binding> = Vec::with_capacity(aliases.len());
    for (&global, &local) in &aliases {
        gs.symbol_mut(local).min_loops = -1;
        prefix.push(Binding::new(
            local,
            method_loc,
            Instruction::Alias { what: global },
        ));
    }
    prefix.sort_by_key(|binding| binding.bind);
    cfg.basic_blocks[entry].exprs.splice(0..0, prefix);

    topo::fill_in_topo_sorts(&mut cfg);
    dealias::dealias(gs, &mut cfg);
    block_args::fill_in_block_arguments(gs, &mut cfg);

    debug!(
        "lowered {} into {} basic blocks",
        gs.full_name(md.symbol),
        cfg.basic_blocks.len()
    );
    Ok(cfg)
}

/// Install a conditional terminator on `from`. No-op when `from` is the
/// dead block; a second terminator on any other block is a programmer
/// error.
pub(crate) fn conditional_jump(
    cfg: &mut Cfg,
    from: BlockId,
    cond: SymbolId,
    thenb: BlockId,
    elseb: BlockId,
) -> Result<(), CfgError> {
    if from == cfg.dead_block() {
        return Ok(());
    }
    let exit = &mut cfg.basic_blocks[from].bexit;
    if exit.cond.is_some() {
        return Err(CfgError::TerminatorOverwritten { block: from });
    }
    exit.cond = Some(cond);
    exit.thenb = thenb;
    exit.elseb = elseb;
    cfg.basic_blocks[thenb].back_edges.push(from);
    cfg.basic_blocks[elseb].back_edges.push(from);
    Ok(())
}

/// Install an unconditional terminator: both successors point at `to`.
pub(crate) fn unconditional_jump(
    cfg: &mut Cfg,
    gs: &GlobalState,
    from: BlockId,
    to: BlockId,
) -> Result<(), CfgError> {
    if from == cfg.dead_block() {
        return Ok(());
    }
    let exit = &mut cfg.basic_blocks[from].bexit;
    if exit.cond.is_some() {
        return Err(CfgError::TerminatorOverwritten { block: from });
    }
    exit.cond = Some(gs.defn_cfg_always());
    exit.thenb = to;
    exit.elseb = to;
    cfg.basic_blocks[to].back_edges.push(from);
    Ok(())
}

/// Close `from` with a never-taken exit into the dead block.
pub(crate) fn jump_to_dead(cfg: &mut Cfg, gs: &GlobalState, from: BlockId) -> Result<(), CfgError> {
    let dead = cfg.dead_block();
    if from == dead {
        return Ok(());
    }
    let exit = &mut cfg.basic_blocks[from].bexit;
    if exit.cond.is_some() {
        return Err(CfgError::TerminatorOverwritten { block: from });
    }
    exit.cond = Some(gs.defn_cfg_never());
    exit.thenb = dead;
    exit.elseb = dead;
    cfg.basic_blocks[dead].back_edges.push(from);
    Ok(())
}

/// Resolve a name to the local the method body uses for it. Non-local
/// symbols get a synthetic local of the same name, allocated once per
/// method and recorded for the alias prefix.
fn global_to_local(
    gs: &mut GlobalState,
    what: SymbolId,
    method: SymbolId,
    aliases: &mut HashMap<SymbolId, SymbolId>,
) -> SymbolId {
    if gs.symbol(what).is_local_variable() {
        return what;
    }
    if let Some(&local) = aliases.get(&what) {
        return local;
    }
    let name = gs.symbol(what).name;
    let local = gs.new_temporary(name, method);
    aliases.insert(what, local);
    local
}

/// Lower `what` starting in `current`, storing its value into `target`.
/// Returns the block where evaluation proceeds.
fn walk(
    gs: &mut GlobalState,
    what: &Expr,
    current: BlockId,
    cfg: &mut Cfg,
    target: SymbolId,
    loops: i32,
    aliases: &mut HashMap<SymbolId, SymbolId>,
) -> Result<BlockId, CfgError> {
    // The dead block is exempt: statements after control has died keep
    // appending there, everything else must still be open.
    if current != cfg.dead_block() && cfg.basic_blocks[current].bexit.cond.is_some() {
        return Err(CfgError::TerminatorOverwritten { block: current });
    }

    match what {
        Expr::While { loc, cond, body } => {
            let header = cfg.fresh_block(loops + 1);
            unconditional_jump(cfg, gs, current, header)?;

            let cond_sym = gs.new_temporary(gs.well_known.while_temp, cfg.symbol);
            let header_end = walk(gs, cond, header, cfg, cond_sym, loops + 1, aliases)?;
            let body_block = cfg.fresh_block(loops + 1);
            let continue_block = cfg.fresh_block(loops);
            conditional_jump(cfg, header_end, cond_sym, body_block, continue_block)?;

            let body_sym = gs.new_temporary(gs.well_known.stat_temp, cfg.symbol);
            let body_end = walk(gs, body, body_block, cfg, body_sym, loops + 1, aliases)?;
            unconditional_jump(cfg, gs, body_end, header)?;

            // A while expression evaluates to nil.
            cfg.basic_blocks[continue_block]
                .exprs
                .push(Binding::new(target, *loc, Instruction::Nil));
            Ok(continue_block)
        }
        Expr::Return { loc, expr } => {
            let ret_sym = gs.new_temporary(gs.well_known.return_temp, cfg.symbol);
            let cont = walk(gs, expr, current, cfg, ret_sym, loops, aliases)?;
            // Dead assign.
            cfg.basic_blocks[cont].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::Return { what: ret_sym },
            ));
            jump_to_dead(cfg, gs, cont)?;
            Ok(cfg.dead_block())
        }
        Expr::If {
            cond,
            thenp,
            elsep,
            ..
        } => {
            let if_sym = gs.new_temporary(gs.well_known.if_temp, cfg.symbol);
            let then_block = cfg.fresh_block(loops);
            let else_block = cfg.fresh_block(loops);
            let cont = walk(gs, cond, current, cfg, if_sym, loops, aliases)?;
            conditional_jump(cfg, cont, if_sym, then_block, else_block)?;

            let then_end = walk(gs, thenp, then_block, cfg, target, loops, aliases)?;
            let else_end = walk(gs, elsep, else_block, cfg, target, loops, aliases)?;
            let dead = cfg.dead_block();
            if then_end == dead && else_end == dead {
                Ok(dead)
            } else if then_end == dead {
                Ok(else_end)
            } else if else_end == dead {
                Ok(then_end)
            } else {
                let merge = cfg.fresh_block(loops);
                unconditional_jump(cfg, gs, then_end, merge)?;
                unconditional_jump(cfg, gs, else_end, merge)?;
                Ok(merge)
            }
        }
        Expr::IntLit { loc, value } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::IntLit { value: *value },
            ));
            Ok(current)
        }
        Expr::FloatLit { loc, value } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::FloatLit { value: *value },
            ));
            Ok(current)
        }
        Expr::StringLit { loc, value } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::StringLit { value: *value },
            ));
            Ok(current)
        }
        Expr::BoolLit { loc, value } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::BoolLit { value: *value },
            ));
            Ok(current)
        }
        Expr::ConstantLit { loc, .. } => Err(CfgError::UnresolvedConstant { loc: *loc }),
        Expr::Ident { loc, symbol } => {
            let local = global_to_local(gs, *symbol, cfg.symbol, aliases);
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::Ident { what: local },
            ));
            Ok(current)
        }
        Expr::SelfRef { loc, claz } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::SelfRef { claz: *claz },
            ));
            Ok(current)
        }
        Expr::Assign { loc, lhs, rhs } => {
            let lhs_sym = match lhs.as_ref() {
                Expr::Ident { symbol, .. } => global_to_local(gs, *symbol, cfg.symbol, aliases),
                // TODO(namer): reject once every assignable resolves to an Ident.
                _ => gs.defn_todo(),
            };
            let cont = walk(gs, rhs, current, cfg, lhs_sym, loops, aliases)?;
            cfg.basic_blocks[cont].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::Ident { what: lhs_sym },
            ));
            Ok(cont)
        }
        Expr::InsSeq { stats, expr, .. } => {
            let mut current = current;
            for stat in stats {
                let temp = gs.new_temporary(gs.well_known.stat_temp, cfg.symbol);
                current = walk(gs, stat, current, cfg, temp, loops, aliases)?;
            }
            walk(gs, expr, current, cfg, target, loops, aliases)
        }
        Expr::Send {
            loc,
            recv,
            fun,
            args,
            block,
        } => {
            let recv_sym = gs.new_temporary(gs.well_known.stat_temp, cfg.symbol);
            let mut current = walk(gs, recv, current, cfg, recv_sym, loops, aliases)?;

            let mut arg_syms = Vec::with_capacity(args.len());
            for arg in args {
                let temp = gs.new_temporary(gs.well_known.stat_temp, cfg.symbol);
                current = walk(gs, arg, current, cfg, temp, loops, aliases)?;
                arg_syms.push(temp);
            }

            if let Some(block) = block {
                let header = cfg.fresh_block(loops + 1);
                let post = cfg.fresh_block(loops);
                let body = cfg.fresh_block(loops + 1);

                for (index, formal) in block.args.iter().enumerate() {
                    if let Expr::Ident { loc, symbol } = formal {
                        cfg.basic_blocks[body].exprs.push(Binding::new(
                            *symbol,
                            *loc,
                            Instruction::LoadArg {
                                receiver: recv_sym,
                                method: *fun,
                                index,
                            },
                        ));
                    }
                    // TODO(namer): non-Ident formals are dropped until the
                    // namer rewrites destructuring into idents.
                }

                // Whether the callee yields is unknowable here; both edges
                // carry the same sentinel and downstream typing handles both.
                conditional_jump(cfg, header, gs.defn_cfg_block_call(), body, post)?;
                unconditional_jump(cfg, gs, current, header)?;

                let block_rv = gs.new_temporary(gs.well_known.block_return_temp, cfg.symbol);
                let block_last = walk(gs, &block.body, body, cfg, block_rv, loops + 1, aliases)?;
                unconditional_jump(cfg, gs, block_last, header)?;

                current = post;
            }

            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::Send {
                    recv: recv_sym,
                    fun: *fun,
                    args: arg_syms,
                },
            ));
            Ok(current)
        }
        Expr::Block(block) => Err(CfgError::BareBlock { loc: block.loc }),
        Expr::Array { loc, .. } | Expr::Next { loc } => {
            cfg.basic_blocks[current].exprs.push(Binding::new(
                target,
                *loc,
                Instruction::NotSupported { why: String::new() },
            ));
            Ok(current)
        }
    }
}
