//! Control-flow graph of a single method body.
//!
//! A `Cfg` owns its blocks; blocks own their bindings. Links between blocks
//! (`thenb`, `elseb`, `back_edges`) are arena indices, so loops cost
//! nothing to represent and the whole graph dies with its `Cfg`.
//!
//! Construction is a fixed five-stage pipeline driven by
//! [`builder::build_for`]: lower the AST, inject the alias prefix, fill in
//! both topological sorts, fold copy chains, infer block arguments.

pub mod block_args;
pub mod builder;
pub mod dealias;
pub mod instruction;
pub mod printer;
pub mod topo;

#[cfg(test)]
pub(crate) mod test_helpers;

use serde::{Deserialize, Serialize};

use crate::context::{Loc, SymbolId};
use crate::define_entity;
use crate::entity::{EntityRef, PrimaryMap};

pub use builder::build_for;
pub use instruction::Instruction;
pub use printer::to_dot;

define_entity!(BlockId);

/// Single-assignment triple: `bind := value` at `loc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub bind: SymbolId,
    pub loc: Loc,
    pub value: Instruction,
}

impl Binding {
    pub fn new(bind: SymbolId, loc: Loc, value: Instruction) -> Self {
        Self { bind, loc, value }
    }
}

/// Block terminator.
///
/// `cond` is `None` until one of the jump helpers installs the exit; after
/// construction every block has exactly one. `defn_cfg_always` and
/// `defn_cfg_never` mark unconditional and never-taken exits; any other
/// condition symbol is a real conditional and counts as a read of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockExit {
    pub cond: Option<SymbolId>,
    pub thenb: BlockId,
    pub elseb: BlockId,
}

/// Maximal straight-line sequence of bindings ending in one terminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Formal parameters of the block, sorted ascending by symbol id.
    /// Populated by block-argument inference.
    pub args: Vec<SymbolId>,
    pub exprs: Vec<Binding>,
    pub bexit: BlockExit,
    /// Predecessors, one entry per incoming terminator edge.
    pub back_edges: Vec<BlockId>,
    /// Loop-nesting depth this block lives at.
    pub outer_loops: i32,
    /// Visitation bits for the topological sorts.
    pub flags: u8,
}

impl BasicBlock {
    pub const FORWARD_TOPO_SORT_VISITED: u8 = 1 << 0;
    pub const BACKWARD_TOPO_SORT_VISITED: u8 = 1 << 1;
}

/// The control-flow graph of one method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cfg {
    /// The method this graph was built for.
    pub symbol: SymbolId,
    pub basic_blocks: PrimaryMap<BlockId, BasicBlock>,
    /// Post-order over forward edges; the entry block is last.
    pub forwards_topo_sort: Vec<BlockId>,
    /// Loop-aware order from the dead block over back edges; a loop header
    /// precedes every block of its loop.
    pub backwards_topo_sort: Vec<BlockId>,
}

impl Cfg {
    /// A fresh two-block graph: entry and dead block. The dead block is its
    /// own successor under `defn_cfg_never` and is the sink of every
    /// program path.
    pub(crate) fn new(symbol: SymbolId, never: SymbolId) -> Self {
        let mut cfg = Cfg {
            symbol,
            basic_blocks: PrimaryMap::new(),
            forwards_topo_sort: Vec::new(),
            backwards_topo_sort: Vec::new(),
        };
        cfg.fresh_block(0); // entry
        let dead = cfg.fresh_block(0);
        let dead_exit = &mut cfg.basic_blocks[dead].bexit;
        dead_exit.cond = Some(never);
        dead_exit.thenb = dead;
        dead_exit.elseb = dead;
        cfg
    }

    pub fn entry(&self) -> BlockId {
        BlockId::new(0)
    }

    pub fn dead_block(&self) -> BlockId {
        BlockId::new(1)
    }

    /// Append a new unterminated block at loop depth `outer_loops`.
    pub(crate) fn fresh_block(&mut self, outer_loops: i32) -> BlockId {
        // Successors start out pointing at the dead block; a jump helper
        // overwrites them exactly once together with `cond`.
        let placeholder = BlockId::new(1);
        self.basic_blocks.push(BasicBlock {
            args: Vec::new(),
            exprs: Vec::new(),
            bexit: BlockExit {
                cond: None,
                thenb: placeholder,
                elseb: placeholder,
            },
            back_edges: Vec::new(),
            outer_loops,
            flags: 0,
        })
    }
}
