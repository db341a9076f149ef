//! DOT rendering of a built graph.
//!
//! One `subgraph cluster` per method: the entry block is drawn as an
//! `invhouse`, the dead block as a `parallelogram`. A `then` edge is drawn
//! for every block; an `else` edge only when the terminator is a real
//! conditional. Binding lines inside a node label are separated with
//! literal `\n` so graphviz does the interpolation.

use std::fmt;

use crate::context::{GlobalState, SymbolId};
use crate::entity::EntityRef;

use super::{BasicBlock, Cfg, Instruction};

/// Render `cfg` as a DOT subgraph cluster.
pub fn to_dot(cfg: &Cfg, gs: &GlobalState) -> String {
    DotGraph { cfg, gs }.to_string()
}

struct DotGraph<'a> {
    cfg: &'a Cfg,
    gs: &'a GlobalState,
}

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.cfg;
        let gs = self.gs;
        let full_name = gs.full_name(cfg.symbol);
        let sym = cfg.symbol.index();

        writeln!(f, "subgraph \"cluster_{full_name}\" {{")?;
        writeln!(f, "    label = \"{full_name}\";")?;
        writeln!(f, "    color = blue;")?;
        writeln!(f, "    bb{sym}_0 [shape = invhouse];")?;
        writeln!(f, "    bb{sym}_1 [shape = parallelogram];")?;
        writeln!(f)?;

        for (id, block) in cfg.basic_blocks.iter() {
            let i = id.index();
            write!(f, "    bb{sym}_{i} [label = \"")?;
            fmt_block(block, gs, f)?;
            writeln!(f, "\"];")?;

            writeln!(f, "    bb{sym}_{i} -> bb{sym}_{};", block.bexit.thenb.index())?;
            let real_conditional = block
                .bexit
                .cond
                .is_some_and(|cond| cond != gs.defn_cfg_always() && cond != gs.defn_cfg_never());
            if real_conditional {
                writeln!(f, "    bb{sym}_{i} -> bb{sym}_{};", block.bexit.elseb.index())?;
                writeln!(f)?;
            }
        }
        write!(f, "}}")
    }
}

fn fmt_block(block: &BasicBlock, gs: &GlobalState, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in block.args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", gs.symbol_name_str(*arg))?;
    }
    write!(f, ")\\n")?;
    if block.outer_loops > 0 {
        write!(f, "outerLoops: {}\\n", block.outer_loops)?;
    }
    for binding in &block.exprs {
        write!(f, "{} = ", gs.symbol_name_str(binding.bind))?;
        fmt_instruction(&binding.value, gs, f)?;
        write!(f, "\\n")?;
    }
    match block.bexit.cond {
        Some(cond) => write!(f, "{}", gs.symbol_name_str(cond)),
        None => write!(f, "<unterminated>"),
    }
}

fn fmt_symbol_list(syms: &[SymbolId], gs: &GlobalState, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, sym) in syms.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", gs.symbol_name_str(*sym))?;
    }
    Ok(())
}

fn fmt_instruction(
    inst: &Instruction,
    gs: &GlobalState,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match inst {
        Instruction::Ident { what } => write!(f, "{}", gs.symbol_name_str(*what)),
        Instruction::Alias { what } => write!(f, "alias {}", gs.symbol_name_str(*what)),
        Instruction::Send { recv, fun, args } => {
            write!(f, "{}.{}(", gs.symbol_name_str(*recv), gs.name_str(*fun))?;
            fmt_symbol_list(args, gs, f)?;
            write!(f, ")")
        }
        Instruction::Super { args } => {
            write!(f, "super(")?;
            fmt_symbol_list(args, gs, f)?;
            write!(f, ")")
        }
        Instruction::Return { what } => write!(f, "return {}", gs.symbol_name_str(*what)),
        Instruction::NamedArg { name, value } => write!(
            f,
            "named_arg({}, {})",
            gs.name_str(*name),
            gs.symbol_name_str(*value)
        ),
        Instruction::LoadArg {
            receiver,
            method,
            index,
        } => write!(
            f,
            "load_arg({}#{}, {})",
            gs.symbol_name_str(*receiver),
            gs.name_str(*method),
            index
        ),
        Instruction::SelfRef { .. } => write!(f, "self"),
        Instruction::IntLit { value } => write!(f, "{value}"),
        Instruction::FloatLit { value } => write!(f, "{value}"),
        Instruction::StringLit { value } => write!(f, "{}", gs.name_str(*value)),
        Instruction::BoolLit { value } => write!(f, "{value}"),
        Instruction::Nil => write!(f, "nil"),
        Instruction::ArraySplat { what } => write!(f, "*{}", gs.symbol_name_str(*what)),
        Instruction::HashSplat { what } => write!(f, "**{}", gs.symbol_name_str(*what)),
        Instruction::NotSupported { why } => write!(f, "NotSupported({why})"),
    }
}
