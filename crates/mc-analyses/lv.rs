//! Live Variables: a backward analysis. Runs on `pg.reverse()` so the
//! worklist engine never needs to know which direction an analysis
//! flows — "backward" just means "forward over the reversed graph".

use std::hash::BuildHasherDefault;

use mc_ast::{free_vars_aexpr, free_vars_bexpr, Call, LValue, Rhs};
use mc_pg::{Action, NodeId, Pg};
use mc_str::StrId;
use mc_worklist::{run, Strategy};
use rustc_hash::FxHasher;

type FxHashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;
type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Sorted by variable id so two equal sets always compare and print
/// identically regardless of insertion order.
pub type Element = Vec<StrId>;

fn as_sorted_vec(set: FxHashSet<StrId>) -> Element {
    let mut v: Vec<StrId> = set.into_iter().collect();
    v.sort();
    v
}

fn union(a: &[StrId], b: &FxHashSet<StrId>) -> Element {
    let mut set: FxHashSet<StrId> = a.iter().copied().collect();
    set.extend(b.iter().copied());
    as_sorted_vec(set)
}

/// Variables read by `action`, regardless of which side of an
/// assignment they sit on: an lvalue's own index/base expressions are
/// reads too (`a[i] := ...` reads both `a` and `i`).
fn vars_read(action: &Action) -> FxHashSet<StrId> {
    let mut buf = Vec::new();
    match action {
        Action::Assignment(a) => {
            match &a.lhs {
                LValue::Identifier(_) => {}
                LValue::ArrayDeref { base, index } => {
                    buf.push(*base);
                    free_vars_aexpr(index, &mut buf);
                }
                // r.fst := e reads only e; the record base is killed by
                // weak update, not read.
                LValue::RecordDeref { .. } => {}
            }
            match &a.rhs {
                Rhs::AExpr(e) => free_vars_aexpr(e, &mut buf),
                Rhs::RecordInit(fst, snd) => {
                    free_vars_aexpr(fst, &mut buf);
                    free_vars_aexpr(snd, &mut buf);
                }
            }
        }
        Action::Call(Call::Read(lv, _)) => match lv {
            LValue::Identifier(_) => {}
            LValue::ArrayDeref { base, index } => {
                buf.push(*base);
                free_vars_aexpr(index, &mut buf);
            }
            LValue::RecordDeref { base, .. } => {
                buf.push(*base);
            }
        },
        Action::Call(Call::Write(e, _)) => free_vars_aexpr(e, &mut buf),
        Action::BoolExpr(b) => free_vars_bexpr(b, &mut buf),
    }
    buf.into_iter().collect()
}

/// The scalar variable written whole by `action`, if any — this is the
/// only thing a scalar assignment kills. Aggregates never kill (weak
/// update: reading `a` anywhere keeps `a` live across a write to one
/// of its slots).
fn scalar_killed(action: &Action) -> Option<StrId> {
    match action {
        Action::Assignment(a) => match &a.lhs {
            LValue::Identifier(x) => Some(*x),
            _ => None,
        },
        _ => None,
    }
}

pub fn compute(pg: &Pg, strategy: Strategy) -> (FxHashMap<NodeId, Element>, usize) {
    let reversed = pg.reverse();
    run(
        &reversed,
        strategy,
        |_n| Element::new(),
        |r, u, v, action, _pg| {
            // On the reversed graph the edge runs v -> u in program
            // order, so LV(v)'s contribution folds forward from `u`
            // (the original successor) into `v` (the original
            // predecessor): live(v) = read(action) ∪ (live(u) \ killed).
            let live_u = r.get(&u).cloned().unwrap_or_default();
            let mut next: FxHashSet<StrId> = live_u.into_iter().collect();
            if let Some(killed) = scalar_killed(action) {
                next.remove(&killed);
            }
            let reads = vars_read(action);
            let candidate = union(&as_sorted_vec(next), &reads);

            let before = r.get(&v).cloned().unwrap_or_default();
            let merged = union(&before, &candidate.into_iter().collect());
            let changed = merged != before;
            r.insert(v, merged);
            changed
        },
    )
}

pub fn format_element(elem: &Element, interner: &mc_str::Interner) -> String {
    if elem.is_empty() {
        return "\u{2205}".to_string();
    }
    elem.iter()
        .map(|x| interner.lookup(*x).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{
        ABinOp, AExpr, AExprKind, Assignment, BExpr, BExprKind, Block, Call, Decl, DeclKind,
        Program, RelOp, Rhs, Stmt, StmtKind,
    };
    use mc_pg::Pg as PgType;
    use mc_str::Interner;

    #[test]
    fn dead_assignment_before_overwrite_is_not_live() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let y = interner.intern("y".to_string());
        // x := 1; x := y;  — the first x is dead at its own def site.
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
                    lhs: LValue::Identifier(x),
                    rhs: Rhs::AExpr(AExpr::new(AExprKind::Identifier(y), None)),
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
        assert_eq!(r[&pg.source()], vec![y]);
    }

    #[test]
    fn read_does_not_kill_the_scalar_it_reads_into() {
        // read x; write x; — x must stay live all the way to the
        // program's entry: `read` assigns x from outside the program,
        // it doesn't consume a prior value, so it can never kill.
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let stmts = vec![
            Stmt {
                kind: StmtKind::Call(Call::Read(LValue::Identifier(x), None)),
                lineno: None,
            },
            Stmt {
                kind: StmtKind::Call(Call::Write(AExpr::new(AExprKind::Identifier(x), None), None)),
                lineno: None,
            },
        ];
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
        assert_eq!(r[&pg.source()], vec![x]);
    }

    #[test]
    fn condition_variables_are_live_on_entry_to_a_branch() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let y = interner.intern("y".to_string());
        let cond = BExpr::new(
            BExprKind::Relation {
                op: RelOp::Gt,
                lhs: AExpr::new(AExprKind::Identifier(x), None),
                rhs: AExpr::new(AExprKind::Number(0), None),
            },
            None,
        );
        let body = vec![Stmt {
            kind: StmtKind::Assignment(Assignment {
                lhs: LValue::Identifier(y),
                rhs: Rhs::AExpr(AExpr::new(
                    AExprKind::BinOp {
                        op: ABinOp::Add,
                        lhs: Box::new(AExpr::new(AExprKind::Identifier(y), None)),
                        rhs: Box::new(AExpr::new(AExprKind::Number(1), None)),
                    },
                    None,
                )),
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
                stmts: vec![Stmt {
                    kind: StmtKind::If { cond, body },
                    lineno: None,
                }],
            }],
        };
        let pg = PgType::finalize(mc_pg::build(&program));
        let (r, _) = compute(&pg, Strategy::Fifo);
        assert!(r[&pg.source()].contains(&x));
        assert!(r[&pg.source()].contains(&y));
    }
}
