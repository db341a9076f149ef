//! Construction helpers shared by the CFG tests: a tiny "namer" that sets
//! up a class, a method and its locals, plus terse AST constructors.

use crate::ast::{BlockLit, Expr, MethodDef};
use crate::context::{GlobalState, Loc, NameId, SymbolId};
use crate::error::CfgError;

use super::{build_for, Cfg};

pub(crate) struct Fixture {
    pub gs: GlobalState,
    pub class: SymbolId,
    pub method_sym: SymbolId,
    pub params: Vec<SymbolId>,
}

impl Fixture {
    /// A class `Widget` with one method `name(params…)`.
    pub fn new(name: &str, params: &[&str]) -> Self {
        let mut gs = GlobalState::new();
        let class = gs.enter_class("Widget");
        let method_sym = gs.enter_method(class, name, Loc::new(0, 2));
        let params = params
            .iter()
            .map(|p| gs.enter_method_argument(method_sym, p, Loc::new(4, 5)))
            .collect();
        Self {
            gs,
            class,
            method_sym,
            params,
        }
    }

    pub fn local(&mut self, name: &str) -> SymbolId {
        self.gs.enter_local_variable(self.method_sym, name, Loc::NONE)
    }

    pub fn field(&mut self, name: &str) -> SymbolId {
        self.gs.enter_field(self.class, name, Loc::NONE)
    }

    pub fn name(&mut self, s: &str) -> NameId {
        self.gs.intern(s)
    }

    pub fn str_lit(&mut self, s: &str, loc: Loc) -> Expr {
        let value = self.gs.intern(s);
        Expr::StringLit { loc, value }
    }

    pub fn method(&self, body: Expr) -> MethodDef {
        MethodDef {
            loc: self.gs.symbol(self.method_sym).definition_loc,
            symbol: self.method_sym,
            rhs: Box::new(body),
        }
    }

    pub fn build(&mut self, md: &MethodDef) -> Cfg {
        build_for(&mut self.gs, md).expect("lowering failed")
    }

    pub fn build_err(&mut self, md: &MethodDef) -> CfgError {
        match build_for(&mut self.gs, md) {
            Ok(_) => panic!("lowering unexpectedly succeeded"),
            Err(err) => err,
        }
    }
}

pub(crate) fn loc(begin: u32, end: u32) -> Loc {
    Loc::new(begin, end)
}

fn span(a: &Expr, b: &Expr) -> Loc {
    Loc::new(a.loc().begin, b.loc().end)
}

pub(crate) fn int(value: i64, loc: Loc) -> Expr {
    Expr::IntLit { loc, value }
}

pub(crate) fn boolean(value: bool, loc: Loc) -> Expr {
    Expr::BoolLit { loc, value }
}

pub(crate) fn ident(symbol: SymbolId, loc: Loc) -> Expr {
    Expr::Ident { loc, symbol }
}

pub(crate) fn assign(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Assign {
        loc: span(&lhs, &rhs),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub(crate) fn seq(stats: Vec<Expr>, tail: Expr) -> Expr {
    let loc = match stats.first() {
        Some(first) => Loc::new(first.loc().begin, tail.loc().end),
        None => tail.loc(),
    };
    Expr::InsSeq {
        loc,
        stats,
        expr: Box::new(tail),
    }
}

pub(crate) fn if_(cond: Expr, thenp: Expr, elsep: Expr) -> Expr {
    Expr::If {
        loc: span(&cond, &elsep),
        cond: Box::new(cond),
        thenp: Box::new(thenp),
        elsep: Box::new(elsep),
    }
}

pub(crate) fn while_(cond: Expr, body: Expr) -> Expr {
    Expr::While {
        loc: span(&cond, &body),
        cond: Box::new(cond),
        body: Box::new(body),
    }
}

pub(crate) fn ret(expr: Expr) -> Expr {
    Expr::Return {
        loc: expr.loc(),
        expr: Box::new(expr),
    }
}

pub(crate) fn send(recv: Expr, fun: NameId, args: Vec<Expr>, block: Option<BlockLit>) -> Expr {
    let loc = match args.last() {
        Some(last) => Loc::new(recv.loc().begin, last.loc().end),
        None => recv.loc(),
    };
    Expr::Send {
        loc,
        recv: Box::new(recv),
        fun,
        args,
        block,
    }
}

pub(crate) fn block_lit(args: Vec<Expr>, body: Expr) -> BlockLit {
    BlockLit {
        loc: body.loc(),
        args,
        body: Box::new(body),
    }
}
