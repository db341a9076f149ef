//! AST node kinds consumed by CFG construction.
//!
//! This is the slice of the front-end's tree that survives naming and
//! resolution. `ConstantLit` is listed only so its appearance can be
//! rejected: the resolver replaces every constant before lowering runs.
//! Node kinds outside this set lower to a `NotSupported` binding.

use crate::context::{Loc, NameId, SymbolId};

/// A method definition ready for lowering. Formal parameters live on the
/// method symbol (`GlobalState::symbol(symbol).arguments`).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub loc: Loc,
    pub symbol: SymbolId,
    pub rhs: Box<Expr>,
}

/// A literal block attached to a send: `recv.fun(args) { |formals| body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLit {
    pub loc: Loc,
    pub args: Vec<Expr>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    While {
        loc: Loc,
        cond: Box<Expr>,
        body: Box<Expr>,
    },
    Return {
        loc: Loc,
        expr: Box<Expr>,
    },
    If {
        loc: Loc,
        cond: Box<Expr>,
        thenp: Box<Expr>,
        elsep: Box<Expr>,
    },
    Assign {
        loc: Loc,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A statement sequence whose value is the value of `expr`.
    InsSeq {
        loc: Loc,
        stats: Vec<Expr>,
        expr: Box<Expr>,
    },
    Send {
        loc: Loc,
        recv: Box<Expr>,
        fun: NameId,
        args: Vec<Expr>,
        block: Option<BlockLit>,
    },
    /// A block occurring on its own — only legal attached to a send.
    Block(BlockLit),
    Ident {
        loc: Loc,
        symbol: SymbolId,
    },
    SelfRef {
        loc: Loc,
        claz: SymbolId,
    },
    IntLit {
        loc: Loc,
        value: i64,
    },
    FloatLit {
        loc: Loc,
        value: f64,
    },
    StringLit {
        loc: Loc,
        value: NameId,
    },
    BoolLit {
        loc: Loc,
        value: bool,
    },
    /// An unresolved constant. Must not reach lowering.
    ConstantLit {
        loc: Loc,
        name: NameId,
    },
    // Kinds below are recognized by earlier phases but not lowered yet;
    // they produce `NotSupported` bindings.
    Array {
        loc: Loc,
        elems: Vec<Expr>,
    },
    Next {
        loc: Loc,
    },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::While { loc, .. }
            | Expr::Return { loc, .. }
            | Expr::If { loc, .. }
            | Expr::Assign { loc, .. }
            | Expr::InsSeq { loc, .. }
            | Expr::Send { loc, .. }
            | Expr::Ident { loc, .. }
            | Expr::SelfRef { loc, .. }
            | Expr::IntLit { loc, .. }
            | Expr::FloatLit { loc, .. }
            | Expr::StringLit { loc, .. }
            | Expr::BoolLit { loc, .. }
            | Expr::ConstantLit { loc, .. }
            | Expr::Array { loc, .. }
            | Expr::Next { loc } => *loc,
            Expr::Block(block) => block.loc,
        }
    }
}
