//! The Micro-C abstract syntax tree.
//!
//! A closed sum type per construct (spec.md design note: "re-architect as
//! a closed sum type with exhaustive pattern matching"). Every node keeps
//! an optional source line so diagnostics and the printed-AST debug dump
//! can point back at the program text. Identifiers are `StrId`s from
//! `mc_str` — equal and hashable by id, never by re-comparing text.

use mc_str::{Interner, StrId};

pub type Lineno = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub blocks: Vec<Block>,
}

/// An outer block: declarations followed by statements. Only outer
/// blocks get their program-graph sinks stitched (spec.md §4.1); bodies
/// of `if`/`while` are `NestedBlock`s instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
}

/// A statement-only block, used for `if`/`if-else`/`while` bodies. No
/// declarations are permitted and no sink-stitching happens here.
pub type NestedBlock = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Variable,
    Array { size: i64 },
    /// `{ int fst; int snd } id;` — the two fields are always named
    /// `fst`/`snd` by the grammar, so no field identifiers are stored.
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: StrId,
    pub kind: DeclKind,
    pub lineno: Option<Lineno>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Fst,
    Snd,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Fst => "fst",
            Field::Snd => "snd",
        }
    }
}

/// An assignable location: a scalar identifier, an array slot, or a
/// record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LValue {
    Identifier(StrId),
    ArrayDeref { base: StrId, index: Box<AExpr> },
    RecordDeref { base: StrId, field: Field },
}

impl LValue {
    /// The variable this lvalue ultimately writes through — itself for a
    /// scalar, the aggregate's name for an array/record slot.
    pub fn base(&self) -> StrId {
        match self {
            LValue::Identifier(id) => *id,
            LValue::ArrayDeref { base, .. } => *base,
            LValue::RecordDeref { base, .. } => *base,
        }
    }
}

/// The right-hand side of an assignment: either an arithmetic
/// expression, or a two-element record initializer list (neither of
/// whose elements may itself be a record initializer list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rhs {
    AExpr(AExpr),
    RecordInit(AExpr, AExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lhs: LValue,
    pub rhs: Rhs,
    pub lineno: Option<Lineno>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read(LValue, Option<Lineno>),
    Write(AExpr, Option<Lineno>),
}

impl Call {
    pub fn lineno(&self) -> Option<Lineno> {
        match self {
            Call::Read(_, l) | Call::Write(_, l) => *l,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Assignment(Assignment),
    Call(Call),
    If {
        cond: BExpr,
        body: NestedBlock,
    },
    IfElse {
        cond: BExpr,
        then_body: NestedBlock,
        else_body: NestedBlock,
    },
    While {
        cond: BExpr,
        body: NestedBlock,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub lineno: Option<Lineno>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ABinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ABinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ABinOp::Add => "+",
            ABinOp::Sub => "-",
            ABinOp::Mul => "*",
            ABinOp::Div => "/",
            ABinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AExprKind {
    Identifier(StrId),
    Number(i64),
    ArrayDeref { base: StrId, index: Box<AExpr> },
    RecordDeref { base: StrId, field: Field },
    BinOp { op: ABinOp, lhs: Box<AExpr>, rhs: Box<AExpr> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AExpr {
    pub kind: AExprKind,
    pub lineno: Option<Lineno>,
}

impl AExpr {
    pub fn new(kind: AExprKind, lineno: Option<Lineno>) -> Self {
        Self { kind, lineno }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RelOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Neq => "!=",
            RelOp::Lt => "<",
            RelOp::Lte => "<=",
            RelOp::Gt => ">",
            RelOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BExprKind {
    BoolLiteral(bool),
    Not(Box<BExpr>),
    And(Box<BExpr>, Box<BExpr>),
    Or(Box<BExpr>, Box<BExpr>),
    Relation { op: RelOp, lhs: AExpr, rhs: AExpr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BExpr {
    pub kind: BExprKind,
    pub lineno: Option<Lineno>,
}

impl BExpr {
    pub fn new(kind: BExprKind, lineno: Option<Lineno>) -> Self {
        Self { kind, lineno }
    }

    /// Build the syntactic negation of this condition — used for the
    /// "not taken" edge out of an `if`/`while` node (spec.md §4.2).
    pub fn negate(&self) -> BExpr {
        BExpr::new(BExprKind::Not(Box::new(self.clone())), self.lineno)
    }
}

/// Free variables occurring structurally in an arithmetic expression —
/// used by Live Variables' `gen` set (spec.md §4.5).
pub fn free_vars_aexpr(e: &AExpr, out: &mut Vec<StrId>) {
    match &e.kind {
        AExprKind::Identifier(id) => out.push(*id),
        AExprKind::Number(_) => {}
        AExprKind::ArrayDeref { base, index } => {
            out.push(*base);
            free_vars_aexpr(index, out);
        }
        AExprKind::RecordDeref { base, .. } => out.push(*base),
        AExprKind::BinOp { lhs, rhs, .. } => {
            free_vars_aexpr(lhs, out);
            free_vars_aexpr(rhs, out);
        }
    }
}

/// Free variables occurring structurally in a boolean/relational
/// expression.
pub fn free_vars_bexpr(e: &BExpr, out: &mut Vec<StrId>) {
    match &e.kind {
        BExprKind::BoolLiteral(_) => {}
        BExprKind::Not(inner) => free_vars_bexpr(inner, out),
        BExprKind::And(lhs, rhs) | BExprKind::Or(lhs, rhs) => {
            free_vars_bexpr(lhs, out);
            free_vars_bexpr(rhs, out);
        }
        BExprKind::Relation { lhs, rhs, .. } => {
            free_vars_aexpr(lhs, out);
            free_vars_aexpr(rhs, out);
        }
    }
}

/// Render an AST fragment for debug printing and DOT edge labels,
/// following the original's `__str__` conventions (fully parenthesized
/// binary ops, `(call fn (args))` for builtins).
pub trait Display {
    fn display(&self, interner: &Interner) -> String;
}

impl Display for AExpr {
    fn display(&self, interner: &Interner) -> String {
        match &self.kind {
            AExprKind::Identifier(id) => interner.lookup(*id).to_string(),
            AExprKind::Number(n) => n.to_string(),
            AExprKind::ArrayDeref { base, index } => {
                format!("{}[{}]", interner.lookup(*base), index.display(interner))
            }
            AExprKind::RecordDeref { base, field } => {
                format!("{}.{}", interner.lookup(*base), field.as_str())
            }
            AExprKind::BinOp { op, lhs, rhs } => format!(
                "({} {} {})",
                op.as_str(),
                lhs.display(interner),
                rhs.display(interner)
            ),
        }
    }
}

impl Display for BExpr {
    fn display(&self, interner: &Interner) -> String {
        match &self.kind {
            BExprKind::BoolLiteral(b) => b.to_string(),
            BExprKind::Not(inner) => format!("(! {})", inner.display(interner)),
            BExprKind::And(lhs, rhs) => {
                format!("(& {} {})", lhs.display(interner), rhs.display(interner))
            }
            BExprKind::Or(lhs, rhs) => {
                format!("(| {} {})", lhs.display(interner), rhs.display(interner))
            }
            BExprKind::Relation { op, lhs, rhs } => format!(
                "({} {} {})",
                op.as_str(),
                lhs.display(interner),
                rhs.display(interner)
            ),
        }
    }
}

impl Display for LValue {
    fn display(&self, interner: &Interner) -> String {
        match self {
            LValue::Identifier(id) => interner.lookup(*id).to_string(),
            LValue::ArrayDeref { base, index } => {
                format!("{}[{}]", interner.lookup(*base), index.display(interner))
            }
            LValue::RecordDeref { base, field } => {
                format!("{}.{}", interner.lookup(*base), field.as_str())
            }
        }
    }
}

impl Display for Assignment {
    fn display(&self, interner: &Interner) -> String {
        let rhs = match &self.rhs {
            Rhs::AExpr(e) => e.display(interner),
            Rhs::RecordInit(a, b) => format!("({}, {})", a.display(interner), b.display(interner)),
        };
        format!("{} := {}", self.lhs.display(interner), rhs)
    }
}

impl Display for Call {
    fn display(&self, interner: &Interner) -> String {
        match self {
            Call::Read(lv, _) => format!("(call read ({}))", lv.display(interner)),
            Call::Write(e, _) => format!("(call write ({}))", e.display(interner)),
        }
    }
}
