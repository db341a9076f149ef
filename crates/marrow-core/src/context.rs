//! Symbol table and compilation context.
//!
//! `GlobalState` owns every name and symbol the front-end knows about. CFG
//! construction consults it for symbol attributes, mints fresh synthetic
//! temporaries through it, and compares terminator conditions against the
//! sentinel symbols it creates at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::define_entity;
use crate::entity::{EntityRef, PrimaryMap};

define_entity!(NameId);
define_entity!(SymbolId);

/// Source byte range for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    pub begin: u32,
    pub end: u32,
}

impl Loc {
    pub const NONE: Loc = Loc { begin: 0, end: 0 };

    pub fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.begin, self.end)
    }
}

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Root,
    Class,
    Method,
    LocalVariable,
    /// Instance/class-level storage — never a local, always aliased into one
    /// by the CFG builder before use.
    Field,
    /// Well-known marker symbols (`<always>`, `<never>`, …).
    Sentinel,
}

/// One symbol record.
///
/// `min_loops` is lower-bounded by block-argument inference to the smallest
/// loop-nesting depth across all blocks that read or write the symbol; the
/// type-checker uses it to hoist loop invariants. `-1` marks locals that
/// materialize a non-local name and therefore never belong to a loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: NameId,
    pub owner: SymbolId,
    pub kind: SymbolKind,
    pub is_synthetic_temporary: bool,
    pub min_loops: i32,
    pub definition_loc: Loc,
    /// Formal parameters, in declaration order. Methods only.
    pub arguments: Vec<SymbolId>,
}

impl Symbol {
    pub fn is_local_variable(&self) -> bool {
        self.kind == SymbolKind::LocalVariable
    }
}

/// Names interned once at startup so hot paths never re-hash them.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownNames {
    pub while_temp: NameId,
    pub if_temp: NameId,
    pub stat_temp: NameId,
    pub return_temp: NameId,
    pub block_return_temp: NameId,
    pub return_method_temp: NameId,
    pub self_method_temp: NameId,
}

/// The compilation context: name interner, symbol arena, sentinels.
#[derive(Debug)]
pub struct GlobalState {
    names: PrimaryMap<NameId, String>,
    names_by_str: HashMap<String, NameId>,
    symbols: PrimaryMap<SymbolId, Symbol>,
    pub well_known: WellKnownNames,
    root: SymbolId,
    todo: SymbolId,
    cfg_always: SymbolId,
    cfg_never: SymbolId,
    cfg_block_call: SymbolId,
}

impl GlobalState {
    pub fn new() -> Self {
        let mut names = PrimaryMap::new();
        let mut names_by_str = HashMap::new();
        let mut intern = |s: &str| -> NameId {
            let id = names.push(s.to_owned());
            names_by_str.insert(s.to_owned(), id);
            id
        };

        let well_known = WellKnownNames {
            while_temp: intern("whileTemp"),
            if_temp: intern("ifTemp"),
            stat_temp: intern("statTemp"),
            return_temp: intern("returnTemp"),
            block_return_temp: intern("blockReturnTemp"),
            return_method_temp: intern("returnMethodTemp"),
            self_method_temp: intern("selfMethodTemp"),
        };
        let root_name = intern("<root>");
        let todo_name = intern("<todo>");
        let always_name = intern("<always>");
        let never_name = intern("<never>");
        let block_call_name = intern("<blockCall>");

        let mut symbols = PrimaryMap::new();
        // The root owns itself; sentinel ids are fixed by construction order.
        let root = symbols.push(Symbol {
            name: root_name,
            owner: SymbolId::new(0),
            kind: SymbolKind::Root,
            is_synthetic_temporary: false,
            min_loops: i32::MAX,
            definition_loc: Loc::NONE,
            arguments: Vec::new(),
        });
        let mut sentinel = |name: NameId| {
            symbols.push(Symbol {
                name,
                owner: root,
                kind: SymbolKind::Sentinel,
                is_synthetic_temporary: false,
                min_loops: i32::MAX,
                definition_loc: Loc::NONE,
                arguments: Vec::new(),
            })
        };
        let todo = sentinel(todo_name);
        let cfg_always = sentinel(always_name);
        let cfg_never = sentinel(never_name);
        let cfg_block_call = sentinel(block_call_name);

        Self {
            names,
            names_by_str,
            symbols,
            well_known,
            root,
            todo,
            cfg_always,
            cfg_never,
            cfg_block_call,
        }
    }

    // -- sentinels --

    pub fn root(&self) -> SymbolId {
        self.root
    }

    /// Placeholder target for assignments whose left-hand side the namer has
    /// not resolved to an identifier yet.
    pub fn defn_todo(&self) -> SymbolId {
        self.todo
    }

    /// Terminator condition of an unconditional jump.
    pub fn defn_cfg_always(&self) -> SymbolId {
        self.cfg_always
    }

    /// Terminator condition of a never-taken jump (the dead block's exit).
    pub fn defn_cfg_never(&self) -> SymbolId {
        self.cfg_never
    }

    /// Terminator condition of the yield/skip fork around a block-taking send.
    pub fn defn_cfg_block_call(&self) -> SymbolId {
        self.cfg_block_call
    }

    // -- names --

    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.names_by_str.get(name) {
            return id;
        }
        let id = self.names.push(name.to_owned());
        self.names_by_str.insert(name.to_owned(), id);
        id
    }

    pub fn name_str(&self, name: NameId) -> &str {
        &self.names[name]
    }

    // -- symbols --

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    pub fn symbol_name_str(&self, id: SymbolId) -> &str {
        self.name_str(self.symbols[id].name)
    }

    /// Fully qualified name: owner chain from the root, joined with `::`.
    pub fn full_name(&self, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut cur = id;
        while cur != self.root {
            parts.push(self.symbol_name_str(cur));
            cur = self.symbols[cur].owner;
        }
        parts.reverse();
        parts.join("::")
    }

    /// Mint a fresh synthetic temporary named after `name`, owned by the
    /// method it is local to. The display name is made unique by suffixing
    /// the symbol count, so two temporaries never collide.
    pub fn new_temporary(&mut self, name: NameId, owner: SymbolId) -> SymbolId {
        let unique = format!("{}${}", self.name_str(name), self.symbols.len());
        let unique = self.intern(&unique);
        self.symbols.push(Symbol {
            name: unique,
            owner,
            kind: SymbolKind::LocalVariable,
            is_synthetic_temporary: true,
            min_loops: i32::MAX,
            definition_loc: Loc::NONE,
            arguments: Vec::new(),
        })
    }

    pub fn enter_class(&mut self, name: &str) -> SymbolId {
        let name = self.intern(name);
        let owner = self.root;
        self.symbols.push(Symbol {
            name,
            owner,
            kind: SymbolKind::Class,
            is_synthetic_temporary: false,
            min_loops: i32::MAX,
            definition_loc: Loc::NONE,
            arguments: Vec::new(),
        })
    }

    pub fn enter_method(&mut self, owner: SymbolId, name: &str, loc: Loc) -> SymbolId {
        let name = self.intern(name);
        self.symbols.push(Symbol {
            name,
            owner,
            kind: SymbolKind::Method,
            is_synthetic_temporary: false,
            min_loops: i32::MAX,
            definition_loc: loc,
            arguments: Vec::new(),
        })
    }

    /// Declare a formal parameter of `method`. Parameters are local
    /// variables and are recorded on the method in declaration order.
    pub fn enter_method_argument(&mut self, method: SymbolId, name: &str, loc: Loc) -> SymbolId {
        let arg = self.enter_local_variable(method, name, loc);
        self.symbols[method].arguments.push(arg);
        arg
    }

    pub fn enter_local_variable(&mut self, owner: SymbolId, name: &str, loc: Loc) -> SymbolId {
        let name = self.intern(name);
        self.symbols.push(Symbol {
            name,
            owner,
            kind: SymbolKind::LocalVariable,
            is_synthetic_temporary: false,
            min_loops: i32::MAX,
            definition_loc: loc,
            arguments: Vec::new(),
        })
    }

    /// Instance-level storage: not a local variable, so every use inside a
    /// method body goes through an `Alias` local.
    pub fn enter_field(&mut self, owner: SymbolId, name: &str, loc: Loc) -> SymbolId {
        let name = self.intern(name);
        self.symbols.push(Symbol {
            name,
            owner,
            kind: SymbolKind::Field,
            is_synthetic_temporary: false,
            min_loops: i32::MAX,
            definition_loc: loc,
            arguments: Vec::new(),
        })
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self::new()
    }
}
