//! Generic monotone worklist / fixed-point solver.
//!
//! Solves `R[v] ⊇ AF_uv(R[u])` for every edge `(u, v)` of a `Pg`. The
//! solver itself knows nothing about what a lattice element looks like
//! — that's entirely `af`'s business — so the same engine drives
//! Reaching Definitions, Live Variables, Dangerous Variables, and
//! Detection of Signs from `mc-analyses`, differing only in `L`, the
//! seed function, and `af`.

use std::collections::VecDeque;
use std::hash::BuildHasherDefault;

use mc_pg::{Action, NodeId, Pg};
use rustc_hash::{FxHashMap, FxHasher};

type FxHashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fifo,
    Lifo,
    RoundRobin,
}

/// The contract an analysis implements: read `R[u]` and the edge
/// `(u, v)` — in particular its `action`, since the PG is a multigraph
/// and two edges between the same pair of nodes can carry distinct
/// actions — monotonically fold into `R[v]`, and report whether
/// anything changed.
pub type AnalysisFn<'a, L> =
    dyn FnMut(&mut FxHashMap<NodeId, L>, NodeId, NodeId, &Action, &Pg) -> bool + 'a;

fn reachable_from(pg: &Pg, start: NodeId) -> FxHashSet<NodeId> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![start];
    seen.insert(start);
    while let Some(u) = stack.pop() {
        for (v, _) in pg.successors(u) {
            if seen.insert(*v) {
                stack.push(*v);
            }
        }
    }
    seen
}

/// Reverse postorder of the DFS spanning tree rooted at the source —
/// computed once; `Strategy::RoundRobin` filters this cached order
/// down to whatever is currently pending rather than re-running the
/// DFS on every refill.
fn reverse_postorder(pg: &Pg) -> Vec<NodeId> {
    let mut visited = FxHashSet::default();
    let mut postorder = Vec::new();
    fn visit(pg: &Pg, u: NodeId, visited: &mut FxHashSet<NodeId>, postorder: &mut Vec<NodeId>) {
        if !visited.insert(u) {
            return;
        }
        for (v, _) in pg.successors(u) {
            visit(pg, *v, visited, postorder);
        }
        postorder.push(u);
    }
    visit(pg, pg.source(), &mut visited, &mut postorder);
    postorder.reverse();
    postorder
}

enum Queue {
    Fifo(VecDeque<NodeId>),
    Lifo(Vec<NodeId>),
    RoundRobin {
        order: Vec<NodeId>,
        current: VecDeque<NodeId>,
        current_set: FxHashSet<NodeId>,
        pending: FxHashSet<NodeId>,
    },
}

impl Queue {
    fn new(strategy: Strategy, seed_order: Vec<NodeId>, rp_order: Vec<NodeId>) -> Queue {
        match strategy {
            Strategy::Fifo => Queue::Fifo(seed_order.into_iter().collect()),
            Strategy::Lifo => Queue::Lifo(seed_order),
            Strategy::RoundRobin => {
                let current_set: FxHashSet<NodeId> = seed_order.iter().copied().collect();
                Queue::RoundRobin {
                    order: rp_order,
                    current: seed_order.into_iter().collect(),
                    current_set,
                    pending: FxHashSet::default(),
                }
            }
        }
    }

    fn insert(&mut self, n: NodeId) {
        match self {
            Queue::Fifo(q) => {
                if !q.contains(&n) {
                    q.push_back(n);
                }
            }
            Queue::Lifo(q) => {
                q.push(n);
            }
            Queue::RoundRobin {
                current_set,
                pending,
                ..
            } => {
                if !current_set.contains(&n) {
                    pending.insert(n);
                }
            }
        }
    }

    fn extract(&mut self) -> Option<NodeId> {
        match self {
            Queue::Fifo(q) => q.pop_front(),
            Queue::Lifo(q) => q.pop(),
            Queue::RoundRobin {
                order,
                current,
                current_set,
                pending,
            } => {
                if current.is_empty() {
                    if pending.is_empty() {
                        return None;
                    }
                    let refill: Vec<NodeId> =
                        order.iter().copied().filter(|n| pending.contains(n)).collect();
                    *current = refill.into_iter().collect();
                    *current_set = current.iter().copied().collect();
                    pending.clear();
                }
                let n = current.pop_front();
                if let Some(n) = n {
                    current_set.remove(&n);
                }
                n
            }
        }
    }
}

/// Run the solver to a fixed point. Returns the final assignment map
/// plus the number of worklist extractions performed.
pub fn run<L: Clone>(
    pg: &Pg,
    strategy: Strategy,
    mut seed: impl FnMut(NodeId) -> L,
    mut af: impl FnMut(&mut FxHashMap<NodeId, L>, NodeId, NodeId, &Action, &Pg) -> bool,
) -> (FxHashMap<NodeId, L>, usize) {
    let reachable = reachable_from(pg, pg.source());
    let rp_order = reverse_postorder(pg);
    let seed_order: Vec<NodeId> = rp_order.iter().copied().filter(|n| reachable.contains(n)).collect();

    let mut r: FxHashMap<NodeId, L> = reachable.iter().map(|&n| (n, seed(n))).collect();
    let mut queue = Queue::new(strategy, seed_order, rp_order);

    let mut iterations = 0usize;
    while let Some(u) = queue.extract() {
        iterations += 1;
        // Collect before mutating `r` through `af` — a multigraph can
        // have several actions between the same `(u, v)` pair, and
        // each one is a distinct edge the transfer function must see.
        let edges: Vec<(NodeId, Action)> = pg.successors(u).to_vec();
        for (v, action) in edges {
            if af(&mut r, u, v, &action, pg) {
                queue.insert(v);
            }
        }
    }

    (r, iterations)
}
