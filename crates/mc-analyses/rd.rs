//! Reaching Definitions.
//!
//! Element: a set of triples `(x, def-site, use-site)` — "variable `x`
//! may have been last assigned on the edge between `def-site` and
//! `use-site`". `DefSite::Entry` replaces the original's literal `?`
//! jolly-node sentinel with a real sum-type variant, so callers can't
//! confuse it with an ordinary node id.

use std::hash::BuildHasherDefault;

use mc_ast::LValue;
use mc_pg::{Action, NodeId, Pg};
use mc_str::StrId;
use mc_worklist::{run, Strategy};
use rustc_hash::FxHasher;

type FxHashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;
type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefSite {
    Entry,
    Node(NodeId),
}

pub type Triple = (StrId, DefSite, NodeId);
pub type Element = FxHashSet<Triple>;

pub fn compute(pg: &Pg, strategy: Strategy) -> (FxHashMap<NodeId, Element>, usize) {
    let vars: Vec<StrId> = pg.var_table().keys().copied().collect();
    let source = pg.source();

    run(
        pg,
        strategy,
        |n| {
            if n == source {
                vars.iter().map(|&x| (x, DefSite::Entry, source)).collect()
            } else {
                Element::default()
            }
        },
        |r, u, v, action, _pg| {
            let from_u = r.get(&u).cloned().unwrap_or_default();
            let mut next = from_u.clone();

            if let Action::Assignment(a) = action {
                match &a.lhs {
                    LValue::Identifier(x) => {
                        next.retain(|(var, _, _)| var != x);
                        next.insert((*x, DefSite::Node(u), v));
                    }
                    LValue::ArrayDeref { .. } | LValue::RecordDeref { .. } => {
                        // Weak update: the aggregate's prior triples
                        // survive untouched and no new one is added.
                    }
                }
            }

            let entry = r.entry(v).or_default();
            let before_len = entry.len();
            entry.extend(next);
            entry.len() != before_len
        },
    )
}

/// Variables that reach `node` with `DefSite::Entry` — the set Dangerous
/// Variables seeds from (§4.6: "seed by first running RD and projecting").
pub fn entry_defined_at(result: &FxHashMap<NodeId, Element>, node: NodeId) -> FxHashSet<StrId> {
    result
        .get(&node)
        .map(|triples| {
            triples
                .iter()
                .filter(|(_, site, _)| *site == DefSite::Entry)
                .map(|(x, _, _)| *x)
                .collect()
        })
        .unwrap_or_default()
}

pub fn format_element(elem: &Element, interner: &mc_str::Interner) -> String {
    if elem.is_empty() {
        return "\u{2205}".to_string();
    }
    let mut parts: Vec<(String, String, String)> = elem
        .iter()
        .map(|(x, site, use_site)| {
            let def = match site {
                DefSite::Entry => "?".to_string(),
                DefSite::Node(n) => n.to_string(),
            };
            (interner.lookup(*x).to_string(), def, use_site.to_string())
        })
        .collect();
    parts.sort();
    parts
        .into_iter()
        .map(|(x, def, use_site)| format!("({}, {}, {})", x, def, use_site))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{AExpr, AExprKind, Assignment, Block, Program, Rhs, Stmt, StmtKind};
    use mc_pg::Pg as PgType;
    use mc_str::Interner;

    fn straight_line_pg() -> (PgType, StrId, StrId) {
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
                            op: mc_ast::ABinOp::Add,
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
        let decl = |name, kind| mc_ast::Decl {
            name,
            kind,
            lineno: None,
        };
        let program = Program {
            blocks: vec![Block {
                decls: vec![
                    decl(x, mc_ast::DeclKind::Variable),
                    decl(y, mc_ast::DeclKind::Variable),
                ],
                stmts,
            }],
        };
        let pg = PgType::finalize(mc_pg::build(&program));
        (pg, x, y)
    }

    #[test]
    fn scenario_1_straight_line_scalar() {
        let (pg, x, y) = straight_line_pg();
        let (r, _) = compute(&pg, Strategy::Fifo);
        let sink = r.get(&pg.sink()).unwrap();
        // RD(◀) = {(x,▷,1), (y,▷,2)} in the spec's node numbering; we
        // only assert the def-site/use-site *shape*, since node ids
        // here are builder-assigned rather than renumbered integers.
        assert!(sink.iter().any(|(v, site, _)| *v == x && *site == DefSite::Entry));
        assert!(sink.iter().any(|(v, site, use_site)| {
            *v == y && matches!(site, DefSite::Node(_)) && *use_site == pg.sink()
        }));
        // x's definition-at-entry must have been killed by the real
        // assignment `x := 1`.
        assert!(!sink
            .iter()
            .any(|(v, site, _)| *v == x && matches!(site, DefSite::Node(_))));
    }

    #[test]
    fn compute_is_idempotent() {
        let (pg, _, _) = straight_line_pg();
        let (r1, _) = compute(&pg, Strategy::Fifo);
        let (r2, _) = compute(&pg, Strategy::Fifo);
        assert_eq!(r1, r2);
    }
}
