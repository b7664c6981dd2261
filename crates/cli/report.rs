//! Renders the four analysis assignment maps to the text format
//! spec.md §6 describes: one `NAME(node): ...` line per node, `∅` for
//! an empty assignment, nodes ordered source-first for forward
//! analyses and sink-first for the backward one (Live Variables),
//! trailing separators stripped.

use mc_pg::{NodeId, Pg};
use mc_str::Interner;
use rustc_hash::FxHashMap;

/// Node order for a forward analysis (RD, DV, DS): source, `1..n`, sink.
pub fn forward_order(pg: &Pg) -> Vec<NodeId> {
    pg.nodes_ascending()
}

/// Node order for Live Variables, the one backward analysis: the same
/// traversal but over the reversed graph, so the printed order reads
/// sink-first, source-last (spec.md §6).
pub fn backward_order(pg: &Pg) -> Vec<NodeId> {
    pg.reverse().nodes_ascending()
}

fn print_report<L>(
    name: &str,
    pg: &Pg,
    order: &[NodeId],
    result: &FxHashMap<NodeId, L>,
    format_element: impl Fn(&L) -> String,
) {
    for &n in order {
        let label = pg.label(n).display();
        let rendered = result
            .get(&n)
            .map(|elem| format_element(elem))
            .unwrap_or_else(|| "\u{2205}".to_string());
        println!("{}({}): {}", name, label, rendered);
    }
}

pub fn print_rd(pg: &Pg, interner: &Interner, result: &FxHashMap<NodeId, mc_analyses::rd::Element>) {
    print_report("RD", pg, &forward_order(pg), result, |e| {
        mc_analyses::rd::format_element(e, interner)
    });
}

pub fn print_lv(pg: &Pg, interner: &Interner, result: &FxHashMap<NodeId, mc_analyses::lv::Element>) {
    print_report("LV", pg, &backward_order(pg), result, |e| {
        mc_analyses::lv::format_element(e, interner)
    });
}

pub fn print_dv(pg: &Pg, interner: &Interner, result: &FxHashMap<NodeId, mc_analyses::dv::Element>) {
    print_report("DV", pg, &forward_order(pg), result, |e| {
        mc_analyses::dv::format_element(e, interner)
    });
}

pub fn print_ds(pg: &Pg, interner: &Interner, result: &FxHashMap<NodeId, mc_analyses::ds::Element>) {
    print_report("DS", pg, &forward_order(pg), result, |e| {
        mc_analyses::ds::format_element(e, interner)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{AExpr, AExprKind, Assignment, Block, LValue, Program, Rhs, Stmt, StmtKind};
    use mc_str::Interner;

    #[test]
    fn forward_and_backward_orders_share_the_same_internal_nodes() {
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
                decls: vec![mc_ast::Decl {
                    name: x,
                    kind: mc_ast::DeclKind::Variable,
                    lineno: None,
                }],
                stmts,
            }],
        };
        let pg = Pg::finalize(mc_pg::build(&program));
        let fwd = forward_order(&pg);
        let bwd = backward_order(&pg);
        assert_eq!(fwd.first(), Some(&pg.source()));
        assert_eq!(fwd.last(), Some(&pg.sink()));
        assert_eq!(bwd.first(), Some(&pg.sink()));
        assert_eq!(bwd.last(), Some(&pg.source()));
    }
}
