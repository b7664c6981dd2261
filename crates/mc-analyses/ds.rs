//! Detection of Signs: abstract interpretation over
//! `𝒫({−, 0, +})`-valued memories, with basic-memory splitting at
//! boolean guards so `if (x < 0) ...` actually narrows `x` in the
//! then-branch instead of collapsing to the full sign set.

use mc_ast::{ABinOp, AExpr, AExprKind, BExpr, BExprKind, Call, DeclKind, LValue, RelOp, Rhs};
use mc_pg::{Action, NodeId, Pg};
use mc_str::StrId;
use mc_worklist::{run, Strategy};

use crate::sign::{self, Bool, Memory, Sign, SignSet};

type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

pub type Element = Memory;

fn aggregates_of(pg: &Pg) -> Vec<StrId> {
    pg.var_table()
        .iter()
        .filter(|(_, decl)| !matches!(decl.kind, DeclKind::Variable))
        .map(|(name, _)| *name)
        .collect()
}

/// Declared initial sign set: literals contribute their own sign;
/// arrays/records have no literal initializer in Micro-C, so they
/// default to `{0}` (matching uninitialized-memory-reads-as-zero, the
/// same default the spec gives for aggregates).
fn initial_memory(pg: &Pg) -> Memory {
    pg.var_table()
        .iter()
        .map(|(name, _)| (*name, sign::singleton(Sign::Zero)))
        .collect()
}

fn sign_of_aexpr(m: &Memory, e: &AExpr) -> SignSet {
    if sign::is_bottom(m) {
        return sign::empty();
    }
    match &e.kind {
        AExprKind::Number(n) => sign::sign_of(*n),
        AExprKind::Identifier(x) => m.get(x).cloned().unwrap_or_else(sign::empty),
        AExprKind::ArrayDeref { base, index } => {
            let idx = sign_of_aexpr(m, index);
            if idx.iter().any(|s| matches!(s, Sign::Zero | Sign::Pos)) {
                m.get(base).cloned().unwrap_or_else(sign::empty)
            } else {
                sign::empty()
            }
        }
        AExprKind::RecordDeref { base, .. } => m.get(base).cloned().unwrap_or_else(sign::empty),
        AExprKind::BinOp { op, lhs, rhs } => {
            let a = sign_of_aexpr(m, lhs);
            let b = sign_of_aexpr(m, rhs);
            combine_over_pairs(&a, &b, |x, y| match op {
                ABinOp::Add => sign::add(x, y),
                ABinOp::Sub => sign::sub(x, y),
                ABinOp::Mul => sign::mul(x, y),
                ABinOp::Div => sign::div(x, y),
                ABinOp::Mod => sign::modulo(x, y),
            })
        }
    }
}

fn combine_over_pairs(a: &SignSet, b: &SignSet, f: impl Fn(Sign, Sign) -> SignSet) -> SignSet {
    let mut out = sign::empty();
    for &x in a {
        for &y in b {
            out = sign::union(&out, &f(x, y));
        }
    }
    out
}

fn bool_of_bexpr(m: &Memory, b: &BExpr) -> sign::BoolSet {
    if sign::is_bottom(m) {
        return sign::bool_both();
    }
    match &b.kind {
        BExprKind::BoolLiteral(true) => sign::bool_singleton(Bool::Tt),
        BExprKind::BoolLiteral(false) => sign::bool_singleton(Bool::Ff),
        BExprKind::Not(inner) => {
            let s = bool_of_bexpr(m, inner);
            let mut out = Vec::new();
            for v in s {
                let negated = match v {
                    Bool::Tt => Bool::Ff,
                    Bool::Ff => Bool::Tt,
                };
                if !out.contains(&negated) {
                    out.push(negated);
                }
            }
            out
        }
        BExprKind::And(lhs, rhs) => pointwise_bool(m, lhs, rhs, |a, b| a == Bool::Tt && b == Bool::Tt),
        BExprKind::Or(lhs, rhs) => pointwise_bool(m, lhs, rhs, |a, b| a == Bool::Tt || b == Bool::Tt),
        BExprKind::Relation { op, lhs, rhs } => {
            let a = sign_of_aexpr(m, lhs);
            let b = sign_of_aexpr(m, rhs);
            combine_bool_over_pairs(&a, &b, |x, y| match op {
                RelOp::Eq => sign::eq(x, y),
                RelOp::Neq => sign::neq(x, y),
                RelOp::Lt => sign::lt(x, y),
                RelOp::Gt => sign::gt(x, y),
                RelOp::Lte => sign::lte(x, y),
                RelOp::Gte => sign::gte(x, y),
            })
        }
    }
}

fn pointwise_bool(m: &Memory, lhs: &BExpr, rhs: &BExpr, f: impl Fn(Bool, Bool) -> bool) -> sign::BoolSet {
    let a = bool_of_bexpr(m, lhs);
    let b = bool_of_bexpr(m, rhs);
    let mut out = Vec::new();
    for &x in &a {
        for &y in &b {
            let v = if f(x, y) { Bool::Tt } else { Bool::Ff };
            if !out.contains(&v) {
                out.push(v);
            }
        }
    }
    out
}

fn combine_bool_over_pairs(a: &SignSet, b: &SignSet, f: impl Fn(Sign, Sign) -> sign::BoolSet) -> sign::BoolSet {
    let mut out = Vec::new();
    for &x in a {
        for &y in b {
            for v in f(x, y) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
    }
    out
}

fn lhs_base(lv: &LValue) -> StrId {
    match lv {
        LValue::Identifier(x) => *x,
        LValue::ArrayDeref { base, .. } => *base,
        LValue::RecordDeref { base, .. } => *base,
    }
}

pub fn compute(pg: &Pg, strategy: Strategy) -> (FxHashMap<NodeId, Element>, usize) {
    let aggregates = aggregates_of(pg);
    let source = pg.source();
    let seed_memory = initial_memory(pg);
    let vars: Vec<StrId> = pg.var_table().keys().copied().collect();

    run(
        pg,
        strategy,
        |n| {
            if n == source {
                seed_memory.clone()
            } else {
                sign::bottom(vars.iter().copied())
            }
        },
        |r, u, v, action, _pg| {
            let m_u = r.get(&u).cloned().unwrap_or_else(|| sign::bottom(vars.iter().copied()));

            let contribution = match action {
                Action::Assignment(a) if matches!(a.rhs, Rhs::AExpr(_)) => {
                    if sign::is_bottom(&m_u) {
                        sign::bottom(vars.iter().copied())
                    } else if let Rhs::AExpr(e) = &a.rhs {
                        let s = sign_of_aexpr(&m_u, e);
                        let mut next = m_u.clone();
                        next.insert(lhs_base(&a.lhs), s);
                        next
                    } else {
                        unreachable!()
                    }
                }
                Action::Assignment(a) => {
                    // RecordInit(fst, snd): the record's sign set is
                    // the union of both fields' signs (fields aren't
                    // tracked separately, per the abstraction).
                    if sign::is_bottom(&m_u) {
                        sign::bottom(vars.iter().copied())
                    } else if let Rhs::RecordInit(fst, snd) = &a.rhs {
                        let sf = sign_of_aexpr(&m_u, fst);
                        let ss = sign_of_aexpr(&m_u, snd);
                        let mut next = m_u.clone();
                        next.insert(lhs_base(&a.lhs), sign::union(&sf, &ss));
                        next
                    } else {
                        unreachable!()
                    }
                }
                Action::BoolExpr(b) => {
                    if sign::is_bottom(&m_u) {
                        sign::bottom(vars.iter().copied())
                    } else {
                        let basics = sign::split_into_basic_memories(&m_u, &aggregates);
                        let mut acc = sign::bottom(vars.iter().copied());
                        for basic in basics {
                            if bool_of_bexpr(&basic, b).contains(&Bool::Tt) {
                                acc = sign::memory_union(&acc, &basic);
                            }
                        }
                        acc
                    }
                }
                Action::Call(Call::Read(lv, _)) => {
                    // An external read produces any sign at all.
                    let mut next = m_u.clone();
                    next.insert(lhs_base(lv), sign::full());
                    next
                }
                Action::Call(Call::Write(_, _)) => m_u.clone(),
            };

            let before = r.get(&v).cloned().unwrap_or_else(|| sign::bottom(vars.iter().copied()));
            let merged = sign::memory_union(&before, &contribution);
            let changed = merged != before;
            r.insert(v, merged);
            changed
        },
    )
}

pub fn format_element(elem: &Element, interner: &mc_str::Interner) -> String {
    let mut names: Vec<StrId> = elem.keys().copied().collect();
    names.sort();
    names
        .into_iter()
        .map(|x| {
            let signs = &elem[&x];
            let mut chars: Vec<&str> = signs
                .iter()
                .map(|s| match s {
                    Sign::Neg => "-",
                    Sign::Zero => "0",
                    Sign::Pos => "+",
                })
                .collect();
            chars.sort();
            format!("{}: {{{}}}", interner.lookup(x), chars.join(","))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{Assignment, Block, Decl, Program, Stmt, StmtKind};
    use mc_pg::Pg as PgType;
    use mc_str::Interner;

    #[test]
    fn straight_line_scalar_signs() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let y = interner.intern("y".to_string());
        let stmts = vec![
            Stmt {
                kind: StmtKind::Assignment(Assignment {
                    lhs: LValue::Identifier(x),
                    rhs: Rhs::AExpr(AExpr::new(AExprKind::Number(1), None)),
                    lineno: None,
                }),
                lineno: None,
            },
            Stmt {
                kind: StmtKind::Assignment(Assignment {
                    lhs: LValue::Identifier(y),
                    rhs: Rhs::AExpr(AExpr::new(
                        AExprKind::BinOp {
                            op: ABinOp::Add,
                            lhs: Box::new(AExpr::new(AExprKind::Identifier(x), None)),
                            rhs: Box::new(AExpr::new(AExprKind::Number(2), None)),
                        },
                        None,
                    )),
                    lineno: None,
                }),
                lineno: None,
            },
        ];
        let program = Program {
            blocks: vec![Block {
                decls: vec![
                    Decl {
                        name: x,
                        kind: DeclKind::Variable,
                        lineno: None,
                    },
                    Decl {
                        name: y,
                        kind: DeclKind::Variable,
                        lineno: None,
                    },
                ],
                stmts,
            }],
        };
        let pg = PgType::finalize(mc_pg::build(&program));
        let (r, _) = compute(&pg, Strategy::Fifo);
        let sink = &r[&pg.sink()];
        assert_eq!(sink[&x], sign::singleton(Sign::Pos));
        assert_eq!(sink[&y], sign::singleton(Sign::Pos));
    }

    #[test]
    fn source_memory_is_never_bottom() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let program = Program {
            blocks: vec![Block {
                decls: vec![Decl {
                    name: x,
                    kind: DeclKind::Variable,
                    lineno: None,
                }],
                stmts: vec![],
            }],
        };
        let pg = PgType::finalize(mc_pg::build(&program));
        let (r, _) = compute(&pg, Strategy::Fifo);
        assert!(!sign::is_bottom(&r[&pg.source()]));
    }
}
