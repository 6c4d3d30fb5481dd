//! Dominance over the edge-split graph.
//!
//! In a directed graph with a start node **R**, a node **A** *dominates* a
//! node **B** iff every path from **R** to **B** contains **A**;
//! post-dominance is the same relation over reversed edges from the exit.
//! SESE boundaries are edges, not nodes, so both relations are computed on
//! the *edge-split* graph: every edge `(u, v)` becomes `u → e → v`, and
//! dominance between e-nodes expresses dominance between edges.

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

/// Full dominator sets from one start node, one bitset row per node.
///
/// The iterative fixed point is quadratic in the worst case, but it is
/// simple, deterministic, and the edge-split graphs this subsystem sees
/// are small; `a ∈ dom(b)` stays **O(1)**.
#[derive(Clone, Debug)]
pub(crate) struct DominatorSets {
    rows: Vec<FixedBitSet>,
}

impl DominatorSets {
    /// Solve `dom(start) = {start}`,
    /// `dom(n) = {n} ∪ ⋂ dom(p) over p ∈ preds(n)` to a fixed point.
    /// A node without predecessors keeps `{n}`.
    pub(crate) fn compute(total: usize, start: usize, preds: &[Vec<usize>]) -> Self {
        debug_assert!(start < total);
        let mut rows: Vec<FixedBitSet> = (0..total)
            .map(|w| {
                let mut row = FixedBitSet::with_capacity(total);
                if w == start {
                    row.insert(start);
                } else {
                    row.set_range(.., true);
                }
                row
            })
            .collect();

        let mut scratch = FixedBitSet::with_capacity(total);
        let mut changed = true;
        while changed {
            changed = false;
            for w in 0..total {
                if w == start {
                    continue;
                }
                scratch.clear();
                if !preds[w].is_empty() {
                    scratch.set_range(.., true);
                    for &p in &preds[w] {
                        scratch.intersect_with(&rows[p]);
                    }
                }
                scratch.insert(w);
                if scratch != rows[w] {
                    rows[w].clone_from(&scratch);
                    changed = true;
                }
            }
        }
        DominatorSets { rows }
    }

    /// Does `a` dominate `b`?
    pub(crate) fn dominates(&self, a: usize, b: usize) -> bool {
        self.rows[b].contains(a)
    }
}

/// Forward and backward dominance over one edge-split graph.
#[derive(Clone, Debug)]
pub(crate) struct EdgeSplitDominance {
    split: HashMap<usize, usize>,
    dom: DominatorSets,
    postdom: DominatorSets,
}

impl EdgeSplitDominance {
    /// Split every `(id, u, v)` of `edges` into `u → e → v` (node indices
    /// must lie below `node_count`), then compute dominators from `entry`
    /// and post-dominators from `exit`.
    pub(crate) fn new(
        node_count: usize,
        entry: usize,
        exit: usize,
        edges: &[(usize, usize, usize)],
    ) -> Self {
        let total = node_count + edges.len();
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); total];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); total];
        let mut split = HashMap::with_capacity(edges.len());
        for (k, &(id, u, v)) in edges.iter().enumerate() {
            let e = node_count + k;
            split.insert(id, e);
            succs[u].push(e);
            preds[e].push(u);
            succs[e].push(v);
            preds[v].push(e);
        }
        let dom = DominatorSets::compute(total, entry, &preds);
        let postdom = DominatorSets::compute(total, exit, &succs);
        EdgeSplitDominance { split, dom, postdom }
    }

    /// The e-node of `edge`, if the edge was split.
    pub(crate) fn split_node(&self, edge: usize) -> Option<usize> {
        self.split.get(&edge).copied()
    }

    /// Does edge `a` dominate edge `b` (via their e-nodes)?
    pub(crate) fn edge_dominates(&self, a: usize, b: usize) -> bool {
        match (self.split_node(a), self.split_node(b)) {
            (Some(a), Some(b)) => self.dom.dominates(a, b),
            _ => false,
        }
    }

    /// Does edge `a` post-dominate edge `b`?
    pub(crate) fn edge_postdominates(&self, a: usize, b: usize) -> bool {
        match (self.split_node(a), self.split_node(b)) {
            (Some(a), Some(b)) => self.postdom.dominates(a, b),
            _ => false,
        }
    }

    /// Membership rule for a region bounded by `entry_edge`/`exit_edge`:
    /// the entry's e-node dominates `node` and the exit's e-node
    /// post-dominates it.
    pub(crate) fn node_in_region(&self, entry_edge: usize, exit_edge: usize, node: usize) -> bool {
        match (self.split_node(entry_edge), self.split_node(exit_edge)) {
            (Some(en), Some(ex)) => {
                self.dom.dominates(en, node) && self.postdom.dominates(ex, node)
            }
            _ => false,
        }
    }
}
