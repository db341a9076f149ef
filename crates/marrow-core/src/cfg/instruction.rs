use serde::{Deserialize, Serialize};

use crate::context::{NameId, SymbolId};

/// Three-address instruction kinds.
///
/// The set is closed: every pass in this module does exhaustive case
/// analysis over it, and the dead-store filter below names the pure subset
/// explicitly so adding a kind forces a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Copy the value of `what`.
    Ident { what: SymbolId },
    /// Materialize a non-local name as a method-local.
    Alias { what: SymbolId },
    Send {
        recv: SymbolId,
        fun: NameId,
        args: Vec<SymbolId>,
    },
    Super { args: Vec<SymbolId> },
    /// Method return. Always followed by a jump to the dead block.
    Return { what: SymbolId },
    /// Keyword-argument placeholder. Consumed by the passes but not yet
    /// produced by the builder.
    NamedArg { name: NameId, value: SymbolId },
    /// Bind formal parameter `index` of `method` as seen on `receiver`.
    LoadArg {
        receiver: SymbolId,
        method: NameId,
        index: usize,
    },
    /// The enclosing class instance.
    SelfRef { claz: SymbolId },
    IntLit { value: i64 },
    FloatLit { value: f64 },
    StringLit { value: NameId },
    BoolLit { value: bool },
    Nil,
    ArraySplat { what: SymbolId },
    HashSplat { what: SymbolId },
    /// An AST node the builder does not lower. Kept so downstream phases can
    /// report a diagnostic at the binding's location.
    NotSupported { why: String },
}

impl Instruction {
    /// Whether a binding of this instruction may be deleted when its target
    /// is never read.
    ///
    /// The list is spelled out kind by kind rather than as a negation so
    /// that a new instruction kind fails closed (gets retained). `Nil` is
    /// deliberately not listed: the `while` lowering's result binding stays
    /// in place even when unread.
    pub fn is_side_effect_free(&self) -> bool {
        matches!(
            self,
            Instruction::Ident { .. }
                | Instruction::ArraySplat { .. }
                | Instruction::HashSplat { .. }
                | Instruction::BoolLit { .. }
                | Instruction::StringLit { .. }
                | Instruction::IntLit { .. }
                | Instruction::FloatLit { .. }
                | Instruction::SelfRef { .. }
                | Instruction::LoadArg { .. }
                | Instruction::NamedArg { .. }
        )
    }
}
