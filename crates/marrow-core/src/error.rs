use crate::cfg::BlockId;
use crate::context::Loc;

/// Errors raised while lowering a method body to a CFG.
///
/// These are programmer errors in the sense of "an earlier phase broke its
/// contract": a well-formed namer/resolver output never triggers them.
/// Unsupported constructs are *not* errors — they lower to a
/// `NotSupported` binding so a diagnostic can be attached downstream.
#[derive(Debug, thiserror::Error)]
pub enum CfgError {
    #[error("constant literal at {loc} should have been resolved by an earlier phase")]
    UnresolvedConstant { loc: Loc },

    #[error("bare block at {loc} outside of a send")]
    BareBlock { loc: Loc },

    #[error("terminator already installed on block {block:?}")]
    TerminatorOverwritten { block: BlockId },
}
