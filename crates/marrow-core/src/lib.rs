//! Core of the marrow type-checker front-end: lowering of method bodies
//! into control-flow graphs of three-address bindings.
//!
//! The pipeline per method is strictly sequential: build the block graph
//! from the AST, inject alias bindings for non-local names, compute the
//! forward and backward topological orders, fold copy chains through
//! synthetic temporaries, then infer each block's formal parameters.
//! Downstream type inference consumes the finished, immutable graph.

pub mod ast;
pub mod cfg;
pub mod context;
pub mod entity;
pub mod error;

pub use ast::{BlockLit, Expr, MethodDef};
pub use cfg::{build_for, to_dot, BasicBlock, Binding, BlockExit, BlockId, Cfg, Instruction};
pub use context::{GlobalState, Loc, NameId, Symbol, SymbolId, SymbolKind};
pub use error::CfgError;
