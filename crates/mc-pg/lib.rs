//! The Program Graph: a labeled directed multigraph built compositionally
//! from the AST via `union`, `join`, and `stitch_sinks`.
//!
//! Nodes live in an adjacency map keyed by an opaque `NodeId`, not by
//! pointer-to-node — the natural representation for a graph with back
//! edges (loops), grounded directly on `hakana`'s `DataFlowGraph`
//! (`FxHashMap`-keyed `forward_edges`/`backward_edges`). During
//! construction a node also carries a `Selector`, the tag `join` reads
//! to decide which sinks fuse with which sources.

use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use mc_ast::{Assignment, BExpr, Call, Decl, Interner};
use mc_str::StrId;
use rustc_hash::{FxHashMap, FxHasher};

pub type NodeId = u32;
type FxHashSet<T> = HashSet<T, BuildHasherDefault<FxHasher>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    None,
    Then,
    Else,
    Loop,
}

impl Default for Selector {
    fn default() -> Self {
        Selector::None
    }
}

/// The AST node carried by a PG edge. Declarations never appear here —
/// they only ever populate the variable table.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Assignment(Assignment),
    Call(Call),
    BoolExpr(BExpr),
}

impl Action {
    pub fn display(&self, interner: &Interner) -> String {
        use mc_ast::Display;
        match self {
            Action::Assignment(a) => a.display(interner),
            Action::Call(c) => c.display(interner),
            Action::BoolExpr(b) => b.display(interner),
        }
    }

    pub fn lineno(&self) -> Option<mc_ast::Lineno> {
        match self {
            Action::Assignment(a) => a.lineno,
            Action::Call(c) => c.lineno(),
            Action::BoolExpr(b) => b.lineno,
        }
    }
}

type EdgeList = Vec<(NodeId, Action)>;

/// A PG fragment under construction. `sources`/`sinks` are ordered
/// lists (not sets) — insertion order matters for `stitch_sinks`,
/// which always keeps the first sink as canonical.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: FxHashSet<NodeId>,
    pub forward: FxHashMap<NodeId, EdgeList>,
    pub backward: FxHashMap<NodeId, EdgeList>,
    pub selector: FxHashMap<NodeId, Selector>,
    pub sources: Vec<NodeId>,
    pub sinks: Vec<NodeId>,
    pub var_table: FxHashMap<StrId, Decl>,
}

impl Graph {
    pub fn empty() -> Self {
        Self::default()
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, action: Action) {
        self.forward.entry(from).or_default().push((to, action.clone()));
        self.backward.entry(to).or_default().push((from, action));
    }

    fn selector_of(&self, n: NodeId) -> Selector {
        self.selector.get(&n).copied().unwrap_or_default()
    }

    /// Disjoint union: node/edge sets merged, `sources`/`sinks`/var
    /// table concatenated. Safe because construction hands out globally
    /// fresh ids and the language forbids identifier clashes.
    pub fn union(mut self, other: Graph) -> Graph {
        self.nodes.extend(other.nodes);
        for (k, v) in other.forward {
            self.forward.entry(k).or_default().extend(v);
        }
        for (k, v) in other.backward {
            self.backward.entry(k).or_default().extend(v);
        }
        self.selector.extend(other.selector);
        self.var_table.extend(other.var_table);
        self.sources.extend(other.sources);
        self.sinks.extend(other.sinks);
        self
    }

    /// Remove an extra sink node entirely, redirecting its predecessors
    /// onto `target`. Shared by `join`'s selector fusion and by the
    /// while-loop back-edge weld.
    fn weld_into(&mut self, extra: NodeId, target: NodeId) {
        let preds = self.backward.remove(&extra).unwrap_or_default();
        for (u, action) in preds {
            if let Some(fwd) = self.forward.get_mut(&u) {
                fwd.retain(|(to, _)| *to != extra);
            }
            self.add_edge(u, target, action);
        }
        self.nodes.remove(&extra);
        self.forward.remove(&extra);
        self.selector.remove(&extra);
        self.sinks.retain(|n| *n != extra);
    }
}

/// `join(gs, sources_keep)`: left-to-right fusion of a chain of
/// fragments. For each successive fragment, every predecessor edge of
/// a sink in the accumulator is redirected onto a source of the same
/// selector in the next fragment; the old sink is dropped and the
/// fused source is dropped from the sources list unless it's in
/// `sources_keep`.
pub fn join(graphs: Vec<Graph>, sources_keep: &FxHashSet<NodeId>) -> Graph {
    let mut iter = graphs.into_iter();
    let mut g_out = match iter.next() {
        Some(g) => g,
        None => return Graph::empty(),
    };

    for h in iter {
        let g_out_sinks = g_out.sinks.clone();
        let h_sources = h.sources.clone();
        g_out = g_out.union(h);

        let mut removed_sinks: FxHashSet<NodeId> = FxHashSet::default();
        let mut removed_sources: FxHashSet<NodeId> = FxHashSet::default();

        for &v in &g_out_sinks {
            if removed_sinks.contains(&v) {
                continue;
            }
            let v_sel = g_out.selector_of(v);
            for &x in &h_sources {
                if g_out.selector_of(x) != v_sel {
                    continue;
                }
                if !g_out.nodes.contains(&v) {
                    break;
                }
                g_out.weld_into(v, x);
                removed_sinks.insert(v);
                removed_sources.insert(x);
                break;
            }
        }

        g_out.sinks.retain(|n| !removed_sinks.contains(n));
        g_out
            .sources
            .retain(|n| !removed_sources.contains(n) || sources_keep.contains(n));
    }

    g_out
}

/// Collapse every sink after the first into the canonical (first)
/// sink, redirecting predecessors. Applied to outer blocks only —
/// nested `if`/`while` bodies keep multiple sinks so the surrounding
/// `join` can fuse each one individually.
pub fn stitch_sinks(mut g: Graph) -> Graph {
    if g.sinks.len() <= 1 {
        return g;
    }
    let canonical = g.sinks[0];
    let extras: Vec<NodeId> = g.sinks[1..].to_vec();
    for extra in extras {
        g.weld_into(extra, canonical);
    }
    g.sinks = vec![canonical];
    g
}

struct IdGen {
    next: NodeId,
}

impl IdGen {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn fresh(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }
}

fn leaf_edge(b: &mut IdGen, action: Action) -> Graph {
    let from = b.fresh();
    let to = b.fresh();
    let mut g = Graph::empty();
    g.nodes.insert(from);
    g.nodes.insert(to);
    g.add_edge(from, to, action);
    g.sources.push(from);
    g.sinks.push(to);
    g
}

fn no_op_node(b: &mut IdGen) -> Graph {
    let id = b.fresh();
    let mut g = Graph::empty();
    g.nodes.insert(id);
    g.sources.push(id);
    g.sinks.push(id);
    g
}

fn build_stmt(b: &mut IdGen, stmt: &mc_ast::Stmt) -> Graph {
    use mc_ast::StmtKind::*;
    match &stmt.kind {
        Assignment(a) => leaf_edge(b, Action::Assignment(a.clone())),
        Call(c) => leaf_edge(b, Action::Call(c.clone())),
        If { cond, body } => build_if(b, cond, body),
        IfElse {
            cond,
            then_body,
            else_body,
        } => build_ifelse(b, cond, then_body, else_body),
        While { cond, body } => build_while(b, cond, body),
    }
}

fn build_stmts(b: &mut IdGen, stmts: &[mc_ast::Stmt]) -> Graph {
    if stmts.is_empty() {
        return no_op_node(b);
    }
    let fragments = stmts.iter().map(|s| build_stmt(b, s)).collect();
    join(fragments, &FxHashSet::default())
}

fn build_if(b: &mut IdGen, cond: &BExpr, body: &[mc_ast::Stmt]) -> Graph {
    let qi = b.fresh();
    let q_if = b.fresh();
    let q_not_if = b.fresh();
    let mut g = Graph::empty();
    g.nodes.extend([qi, q_if, q_not_if]);
    g.add_edge(qi, q_if, Action::BoolExpr(cond.clone()));
    g.add_edge(qi, q_not_if, Action::BoolExpr(cond.negate()));
    g.selector.insert(q_if, Selector::Then);
    g.sources.push(qi);
    g.sinks.push(q_if);
    g.sinks.push(q_not_if);

    let mut body_g = build_stmts(b, body);
    if let Some(&src) = body_g.sources.first() {
        body_g.selector.insert(src, Selector::Then);
    }

    join(vec![g, body_g], &FxHashSet::default())
}

fn build_ifelse(
    b: &mut IdGen,
    cond: &BExpr,
    then_body: &[mc_ast::Stmt],
    else_body: &[mc_ast::Stmt],
) -> Graph {
    let qi = b.fresh();
    let q_if = b.fresh();
    let q_else = b.fresh();
    let mut g = Graph::empty();
    g.nodes.extend([qi, q_if, q_else]);
    g.add_edge(qi, q_if, Action::BoolExpr(cond.clone()));
    g.add_edge(qi, q_else, Action::BoolExpr(cond.negate()));
    g.selector.insert(q_if, Selector::Then);
    g.selector.insert(q_else, Selector::Else);
    g.sources.push(qi);
    g.sinks.push(q_if);
    g.sinks.push(q_else);

    let mut then_g = build_stmts(b, then_body);
    if let Some(&src) = then_g.sources.first() {
        then_g.selector.insert(src, Selector::Then);
    }
    let mut else_g = build_stmts(b, else_body);
    if let Some(&src) = else_g.sources.first() {
        else_g.selector.insert(src, Selector::Else);
    }

    join(vec![g, then_g, else_g], &FxHashSet::default())
}

fn build_while(b: &mut IdGen, cond: &BExpr, body: &[mc_ast::Stmt]) -> Graph {
    let qi = b.fresh();
    let q_w = b.fresh();
    let q_not_w = b.fresh();
    let mut g = Graph::empty();
    g.nodes.extend([qi, q_w, q_not_w]);
    g.add_edge(qi, q_w, Action::BoolExpr(cond.clone()));
    g.add_edge(qi, q_not_w, Action::BoolExpr(cond.negate()));
    g.selector.insert(qi, Selector::Loop);
    g.selector.insert(q_w, Selector::Loop);
    g.sources.push(qi);
    g.sinks.push(q_w);
    g.sinks.push(q_not_w);

    let mut body_g = build_stmts(b, body);
    if let Some(&src) = body_g.sources.first() {
        body_g.selector.insert(src, Selector::Loop);
    }
    for &sink in &body_g.sinks.clone() {
        body_g.selector.insert(sink, Selector::Loop);
    }

    let mut sources_keep = FxHashSet::default();
    sources_keep.insert(qi);
    let mut out = join(vec![g, body_g], &sources_keep);

    // Weld the back edge: every remaining sink still tagged `Loop` is
    // the body's exit point, which must flow back into the header `qi`
    // rather than stay a dangling sink. `join` cannot express this
    // itself since `qi` is already a node in `out`, not a fresh
    // fragment to fuse against — so the reconnection happens here
    // directly instead of through a second synthetic copy of the
    // header (the source this spec was distilled from builds one; a
    // plain adjacency-map graph doesn't need it).
    let loop_sinks: Vec<NodeId> = out
        .sinks
        .iter()
        .copied()
        .filter(|s| out.selector_of(*s) == Selector::Loop)
        .collect();
    for sink in loop_sinks {
        out.weld_into(sink, qi);
    }
    out.selector.insert(qi, Selector::None);
    out
}

fn build_block(b: &mut IdGen, block: &mc_ast::Block) -> Graph {
    let mut decls_g = Graph::empty();
    for d in &block.decls {
        decls_g.var_table.insert(d.name, d.clone());
    }
    let stmts_g = stitch_sinks(build_stmts(b, &block.stmts));
    decls_g.union(stmts_g)
}

/// Build a Program Graph from a parsed program. Every declaration in
/// every block is folded into one variable table; multiple top-level
/// blocks are sequenced exactly like a statement list (a generalization
/// of the single-block case — nothing in the grammar or the analyses
/// depends on there being exactly one).
pub fn build(program: &mc_ast::Program) -> Graph {
    let mut ids = IdGen::new();
    let fragments = program
        .blocks
        .iter()
        .map(|blk| build_block(&mut ids, blk))
        .collect();
    join(fragments, &FxHashSet::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    Source,
    Sink,
    Internal(u32),
}

impl NodeLabel {
    pub fn display(self) -> String {
        match self {
            NodeLabel::Source => "\u{25b7}".to_string(),
            NodeLabel::Sink => "\u{25c4}".to_string(),
            NodeLabel::Internal(n) => n.to_string(),
        }
    }
}

/// A finished Program Graph: exactly one source, one sink, every node
/// reachable from the source and reaching the sink. Presentation
/// labels (`▷`, `1..n`, `◀`) are derived once here and never change,
/// even across `reverse()` — only which node plays "source" for
/// traversal purposes changes.
#[derive(Debug, Clone)]
pub struct Pg {
    nodes: FxHashSet<NodeId>,
    forward: FxHashMap<NodeId, EdgeList>,
    backward: FxHashMap<NodeId, EdgeList>,
    source: NodeId,
    sink: NodeId,
    var_table: FxHashMap<StrId, Decl>,
    labels: FxHashMap<NodeId, NodeLabel>,
}

impl Pg {
    pub fn finalize(g: Graph) -> Pg {
        assert_eq!(g.sources.len(), 1, "PG construction must leave exactly one source");
        assert_eq!(g.sinks.len(), 1, "PG construction must leave exactly one sink");
        let source = g.sources[0];
        let sink = g.sinks[0];

        let mut internals: Vec<NodeId> = g
            .nodes
            .iter()
            .copied()
            .filter(|n| *n != source && *n != sink)
            .collect();
        internals.sort_unstable();

        let mut labels = FxHashMap::default();
        labels.insert(source, NodeLabel::Source);
        labels.insert(sink, NodeLabel::Sink);
        for (i, n) in internals.into_iter().enumerate() {
            labels.insert(n, NodeLabel::Internal((i + 1) as u32));
        }

        Pg {
            nodes: g.nodes,
            forward: g.forward,
            backward: g.backward,
            source,
            sink,
            var_table: g.var_table,
            labels,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn var_table(&self) -> &FxHashMap<StrId, Decl> {
        &self.var_table
    }

    pub fn label(&self, n: NodeId) -> NodeLabel {
        self.labels[&n]
    }

    pub fn successors(&self, n: NodeId) -> &[(NodeId, Action)] {
        self.forward.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, n: NodeId) -> &[(NodeId, Action)] {
        self.backward.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes in ascending presentation order: source, `1..n`, sink.
    pub fn nodes_ascending(&self) -> Vec<NodeId> {
        let mut internals: Vec<NodeId> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| *n != self.source && *n != self.sink)
            .collect();
        internals.sort_by_key(|n| match self.labels[n] {
            NodeLabel::Internal(i) => i,
            _ => u32::MAX,
        });
        let mut out = vec![self.source];
        out.extend(internals);
        out.push(self.sink);
        out
    }

    /// Flip every edge and swap source/sink. Used to run Live Variables
    /// as a forward analysis over the reversed graph. Presentation
    /// labels are untouched — `reverse().reverse()` restores the
    /// original edge sets, and printing code always reads labels from
    /// whichever `Pg` it was handed since both carry the same map.
    pub fn reverse(&self) -> Pg {
        Pg {
            nodes: self.nodes.clone(),
            forward: self.backward.clone(),
            backward: self.forward.clone(),
            source: self.sink,
            sink: self.source,
            var_table: self.var_table.clone(),
            labels: self.labels.clone(),
        }
    }

    /// Edges in depth-first order from the source, following
    /// `nx.edge_dfs`'s convention: every edge is emitted exactly once,
    /// in the order the DFS first encounters it, recursing into a
    /// target only the first time it's reached.
    pub fn dfs_edges(&self) -> Vec<(NodeId, NodeId, &Action)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut out = Vec::new();
        visited.insert(self.source);
        self.dfs_edges_from(self.source, &mut visited, &mut out);
        out
    }

    fn dfs_edges_from<'a>(
        &'a self,
        u: NodeId,
        visited: &mut FxHashSet<NodeId>,
        out: &mut Vec<(NodeId, NodeId, &'a Action)>,
    ) {
        if let Some(edges) = self.forward.get(&u) {
            for (v, action) in edges {
                out.push((u, *v, action));
                if visited.insert(*v) {
                    self.dfs_edges_from(*v, visited, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_ast::{ABinOp, AExpr, AExprKind, BExprKind, LValue, Rhs};
    use mc_str::Interner;

    fn ident_assign(interner: &mut Interner, name: &str, n: i64) -> mc_ast::Stmt {
        let id = interner.intern(name.to_string());
        mc_ast::Stmt {
            kind: mc_ast::StmtKind::Assignment(Assignment {
                lhs: LValue::Identifier(id),
                rhs: Rhs::AExpr(AExpr::new(AExprKind::Number(n), None)),
                lineno: None,
            }),
            lineno: None,
        }
    }

    #[test]
    fn straight_line_has_single_source_and_sink() {
        let mut interner = Interner::new();
        let stmts = vec![
            ident_assign(&mut interner, "x", 1),
            ident_assign(&mut interner, "y", 2),
        ];
        let mut ids = IdGen::new();
        let g = stitch_sinks(build_stmts(&mut ids, &stmts));
        assert_eq!(g.sources.len(), 1);
        assert_eq!(g.sinks.len(), 1);
        let pg = Pg::finalize(g);
        // ▷ → 1 → 2 → ◀ (two assignment nodes in between).
        assert_eq!(pg.nodes_ascending().len(), 4);
    }

    #[test]
    fn if_without_else_joins_both_branches_into_one_sink() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let cond = BExpr::new(
            BExprKind::Relation {
                op: mc_ast::RelOp::Lt,
                lhs: AExpr::new(AExprKind::Identifier(x), None),
                rhs: AExpr::new(AExprKind::Number(1), None),
            },
            None,
        );
        let body = vec![ident_assign(&mut interner, "x", 1)];
        let mut ids = IdGen::new();
        let g = stitch_sinks(build_if(&mut ids, &cond, &body));
        let pg = Pg::finalize(g);
        assert_eq!(pg.sink(), pg.sink());
        // Both the taken and not-taken edges out of the if node must
        // eventually reach the sink.
        let (qi, _, _) = pg.dfs_edges()[0];
        assert_eq!(qi, pg.source());
    }

    #[test]
    fn while_loop_back_edge_returns_to_header() {
        let mut interner = Interner::new();
        let x = interner.intern("x".to_string());
        let cond = BExpr::new(
            BExprKind::Relation {
                op: mc_ast::RelOp::Lt,
                lhs: AExpr::new(AExprKind::Identifier(x), None),
                rhs: AExpr::new(AExprKind::Number(10), None),
            },
            None,
        );
        let body = vec![mc_ast::Stmt {
            kind: mc_ast::StmtKind::Assignment(Assignment {
                lhs: LValue::Identifier(x),
                rhs: Rhs::AExpr(AExpr::new(
                    AExprKind::BinOp {
                        op: ABinOp::Add,
                        lhs: Box::new(AExpr::new(AExprKind::Identifier(x), None)),
                        rhs: Box::new(AExpr::new(AExprKind::Number(1), None)),
                    },
                    None,
                )),
                lineno: None,
            }),
            lineno: None,
        }];
        let mut ids = IdGen::new();
        let g = stitch_sinks(build_while(&mut ids, &cond, &body));
        let pg = Pg::finalize(g);
        let header = pg.source();
        // The header must have two predecessors' worth of structure:
        // an incoming edge from the body (the back edge) in addition
        // to being the unique PG source.
        assert!(pg.predecessors(header).iter().any(|(from, _)| *from != header));
    }

    #[test]
    fn join_single_graph_is_identity() {
        let mut interner = Interner::new();
        let stmts = vec![ident_assign(&mut interner, "x", 1)];
        let mut ids = IdGen::new();
        let g = build_stmts(&mut ids, &stmts);
        let sources_before = g.sources.clone();
        let joined = join(vec![g.clone()], &FxHashSet::default());
        assert_eq!(joined.sources, sources_before);
        assert_eq!(joined.sinks, g.sinks);
    }

    #[test]
    fn reverse_swaps_source_and_sink_but_keeps_labels() {
        let mut interner = Interner::new();
        let stmts = vec![
            ident_assign(&mut interner, "x", 1),
            ident_assign(&mut interner, "y", 2),
        ];
        let mut ids = IdGen::new();
        let g = stitch_sinks(build_stmts(&mut ids, &stmts));
        let pg = Pg::finalize(g);
        let rev = pg.reverse();
        assert_eq!(rev.source(), pg.sink());
        assert_eq!(rev.sink(), pg.source());
        assert_eq!(rev.label(pg.source()), NodeLabel::Source);
    }
}
