//! Dangerous Variables: every variable starts out possibly holding an
//! unsafe (garbage/never-initialized) value; an assignment drawing
//! only from already-safe sources clears its LHS, anything else keeps
//! it (or makes it) dangerous.

use std::hash::BuildHasherDefault;

use mc_ast::{free_vars_aexpr, LValue, Rhs};
use mc_pg::{Action, NodeId, Pg};
use mc_str::StrId;
use mc_worklist::{run, Strategy};
use rustc_hash::FxHasher;

use crate::rd;

type FxHashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;
type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

pub type Element = FxHashSet<StrId>;

fn free_vars_of_rhs_and_index(a: &mc_ast::Assignment) -> FxHashSet<StrId> {
    let mut buf = Vec::new();
    match &a.rhs {
        Rhs::AExpr(e) => free_vars_aexpr(e, &mut buf),
        Rhs::RecordInit(fst, snd) => {
            free_vars_aexpr(fst, &mut buf);
            free_vars_aexpr(snd, &mut buf);
        }
    }
    if let LValue::ArrayDeref { index, .. } = &a.lhs {
        free_vars_aexpr(index, &mut buf);
    }
    buf.into_iter().collect()
}

pub fn compute(pg: &Pg, strategy: Strategy) -> (FxHashMap<NodeId, Element>, usize) {
    let (rd_result, rd_iterations) = rd::compute(pg, strategy);

    let (r, dv_iterations) = run(
        pg,
        strategy,
        |n| rd::entry_defined_at(&rd_result, n),
        |r, u, v, action, _pg| {
            let from_u = r.get(&u).cloned().unwrap_or_default();

            let next = match action {
                Action::Assignment(a) => {
                    let fv = free_vars_of_rhs_and_index(a);
                    match &a.lhs {
                        LValue::Identifier(x) => {
                            let mut next = from_u.clone();
                            if fv.is_disjoint(&from_u) {
                                next.remove(x);
                            } else {
                                next.insert(*x);
                            }
                            next
                        }
                        LValue::ArrayDeref { base, .. } | LValue::RecordDeref { base, .. } => {
                            // Open question (preserved): this tests
                            // the edge's post-state R[v] (the value
                            // already accumulated at the target from
                            // earlier iterations), not the pre-state
                            // R[u] the scalar case uses. Asymmetric
                            // with the scalar transfer above; kept as
                            // observed rather than "fixed" to R[u].
                            let current_v = r.get(&v).cloned().unwrap_or_default();
                            let mut next = from_u.clone();
                            if !fv.is_disjoint(&current_v) {
                                next.insert(*base);
                            }
                            next
                        }
                    }
                }
                _ => from_u.clone(),
            };

            let entry = r.entry(v).or_default();
            let before_len = entry.len();
            entry.extend(next);
            entry.len() != before_len
        },
    );

    (r, rd_iterations + dv_iterations)
}

pub fn format_element(elem: &Element, interner: &mc_str::Interner) -> String {
    if elem.is_empty() {
        return "\u{2205}".to_string();
    }
    let mut names: Vec<String> = elem.iter().map(|x| interner.lookup(*x).to_string()).collect();
    names.sort();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{AExpr, AExprKind, Assignment, Block, Decl, DeclKind, Program, Stmt, StmtKind};
    use mc_pg::Pg as PgType;
    use mc_str::Interner;

    #[test]
    fn assigning_a_literal_makes_the_variable_safe() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let stmts = vec![Stmt {
            kind: StmtKind::Assignment(Assignment {
                lhs: LValue::Identifier(x),
                rhs: Rhs::AExpr(AExpr::new(AExprKind::Number(1), None)),
                lineno: None,
            }),
            lineno: None,
        }];
        let program = Program {
            blocks: vec![Block {
                decls: vec![Decl {
                    name: x,
                    kind: DeclKind::Variable,
                    lineno: None,
                }],
                stmts,
            }],
        };
        let pg = PgType::finalize(mc_pg::build(&program));
        let (r, _) = compute(&pg, Strategy::Fifo);
        assert!(!r[&pg.sink()].contains(&x));
    }

    #[test]
    fn assigning_from_a_dangerous_variable_stays_dangerous() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let y = interner.intern("y".to_string());
        let stmts = vec![Stmt {
            kind: StmtKind::Assignment(Assignment {
                lhs: LValue::Identifier(y),
                rhs: Rhs::AExpr(AExpr::new(AExprKind::Identifier(x), None)),
                lineno: None,
            }),
            lineno: None,
        }];
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
        assert!(r[&pg.sink()].contains(&y));
    }
}
