//! Program structure tree construction.
//!
//! The pipeline is a single pass over immutable stages: input adjacency →
//! augmented edge list → cycle-equivalence classes → regions → nested
//! regions → published result. Nothing here mutates the input, and the
//! [`PstResult`] handed out is read-only.

use core::fmt;
use std::collections::BTreeMap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use indexmap::IndexSet;

#[cfg(feature = "serde-1")]
use serde_derive::{Deserialize, Serialize};

use crate::cycle_equiv;
use crate::dominance::EdgeSplitDominance;
use crate::graph::{Adjacency, AugmentedGraph, CfgNode, EdgeKind, NodeLabel};

/// An algorithm error: the input could not be analyzed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PstError {
    /// The input adjacency has no nodes.
    EmptyGraph,
    /// The bracket engine met an empty bracket list at a non-root tree
    /// edge. The augmentation makes this unreachable for any input; it is
    /// kept as an internal consistency check.
    NotStronglyConnected,
}

impl fmt::Display for PstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PstError::EmptyGraph => f.write_str("input graph has no nodes"),
            PstError::NotStronglyConnected => {
                f.write_str("augmented graph is not strongly connected")
            }
        }
    }
}

impl std::error::Error for PstError {}

/// How strictly malformed inputs are treated.
///
/// Reserved: both levels currently behave identically — list members that
/// are not keys of the adjacency are registered implicitly either way.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Fail loudly on malformed inputs.
    #[default]
    Strict,
    /// Best-effort interpretation of malformed inputs.
    Lenient,
}

/// One canonical SESE region.
///
/// Region 0 is the synthetic root: no boundary edges, no parent. Every
/// other region is bounded by an entry and an exit edge of the same
/// cycle-equivalence class.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub struct Region {
    /// Region id; ids are assigned from 1 in creation order, 0 is the root.
    pub id: usize,
    /// Id of the edge through which the region is entered.
    pub entry_edge: Option<usize>,
    /// Id of the edge through which the region is left.
    pub exit_edge: Option<usize>,
    /// Immediate enclosing region; `None` only for the root.
    pub parent: Option<usize>,
    /// Immediately nested regions, in discovery (id) order.
    pub children: Vec<usize>,
}

/// A published edge of the augmented graph.
///
/// Capping edges are internal to classification and never published, so
/// `kind` is one of `Orig`, `SuperEntry`, `SuperExit`, `Back`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub struct EdgeInfo<N> {
    /// Edge id, unique and dense within one result.
    pub id: usize,
    pub src: CfgNode<N>,
    pub dst: CfgNode<N>,
    pub kind: EdgeKind,
    /// Cycle-equivalence class, numbered from 1. `-1` marks an
    /// unclassified edge, which does not occur on well-formed inputs.
    pub class_id: i64,
}

/// The result of a [`compute_pst`] call: the region tree keyed on region
/// ids, the edge table keyed on edge ids, and the two synthetic endpoint
/// labels. Fully built before it is handed out; read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(Serialize))]
pub struct PstResult<N: NodeLabel> {
    root: usize,
    regions: BTreeMap<usize, Region>,
    edges: BTreeMap<usize, EdgeInfo<N>>,
    super_entry: CfgNode<N>,
    super_exit: CfgNode<N>,
}

impl<N: NodeLabel> PstResult<N> {
    /// Id of the root region. Always 0.
    pub fn root(&self) -> usize {
        self.root
    }

    /// All regions, keyed by id.
    pub fn regions(&self) -> &BTreeMap<usize, Region> {
        &self.regions
    }

    /// The region with the given id.
    pub fn region(&self, id: usize) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// All published edges, keyed by id.
    pub fn edges(&self) -> &BTreeMap<usize, EdgeInfo<N>> {
        &self.edges
    }

    /// The published edge with the given id.
    pub fn edge(&self, id: usize) -> Option<&EdgeInfo<N>> {
        self.edges.get(&id)
    }

    /// The entry and exit edges of a non-root region.
    pub fn region_bounds(&self, id: usize) -> Option<(&EdgeInfo<N>, &EdgeInfo<N>)> {
        let region = self.regions.get(&id)?;
        let entry = self.edges.get(&region.entry_edge?)?;
        let exit = self.edges.get(&region.exit_edge?)?;
        Some((entry, exit))
    }

    /// Label of the synthetic entry node.
    pub fn super_entry(&self) -> &CfgNode<N> {
        &self.super_entry
    }

    /// Label of the synthetic exit node.
    pub fn super_exit(&self) -> &CfgNode<N> {
        &self.super_exit
    }

    /// The nodes contained in each region: `n` lies in a region iff the
    /// region's entry edge dominates `n` and its exit edge post-dominates
    /// it, over the edge-split graph of the published edges. The root maps
    /// to an empty list.
    ///
    /// This recomputes dominance from the published edge table alone, so
    /// renderers and other consumers can call it on any stored result.
    pub fn region_nodes(&self) -> BTreeMap<usize, Vec<CfgNode<N>>> {
        let mut nodes: IndexSet<CfgNode<N>> = IndexSet::new();
        let mut split_edges: Vec<(usize, usize, usize)> = Vec::new();
        for e in self.edges.values() {
            if e.kind == EdgeKind::Back {
                continue;
            }
            let u = nodes.insert_full(e.src.clone()).0;
            let v = nodes.insert_full(e.dst.clone()).0;
            split_edges.push((e.id, u, v));
        }

        let empty = || {
            self.regions
                .keys()
                .map(|&id| (id, Vec::new()))
                .collect::<BTreeMap<_, _>>()
        };
        let (entry, exit) = match (
            nodes.get_index_of(&self.super_entry),
            nodes.get_index_of(&self.super_exit),
        ) {
            (Some(entry), Some(exit)) => (entry, exit),
            _ => return empty(),
        };
        let dominance = EdgeSplitDominance::new(nodes.len(), entry, exit, &split_edges);

        let mut out = BTreeMap::new();
        for (&id, region) in &self.regions {
            let mut members = Vec::new();
            if let (Some(en), Some(ex)) = (region.entry_edge, region.exit_edge) {
                for (ix, node) in nodes.iter().enumerate() {
                    if dominance.node_in_region(en, ex, ix) {
                        members.push(node.clone());
                    }
                }
            }
            out.insert(id, members);
        }
        out
    }
}

/// Compute the program structure tree of a directed graph.
///
/// The input may have any shape: multiple entries and exits, irreducible
/// cycles, parallel edges, disconnected pieces. A synthetic super-entry is
/// wired to every entry node (the indegree-0 nodes, or every node when
/// there is none), a super-exit to every exit node (same rule on
/// outdegree), and a single closing edge makes the whole strongly
/// connected. Every published edge is then assigned its cycle-equivalence
/// class, consecutive same-class edges in DFS order become regions, and
/// regions nest by edge-split dominance.
///
/// Given the adjacency's insertion order, the computation is fully
/// deterministic: node indices, edge ids, class ids, region ids, and
/// children orderings are stable across calls.
///
/// Classification and region building are **O(|V| + |E|)**; the nesting
/// pass is quadratic in the number of regions over bitset dominators.
///
/// # Errors
///
/// [`PstError::EmptyGraph`] when `adj` has no nodes.
///
/// # Example
///
/// ```
/// use pst::{compute_pst, Adjacency, CfgNode};
///
/// // S → A → {B, C} → D → T
/// let adj = Adjacency::from_edges([
///     ("S", "A"),
///     ("A", "B"),
///     ("A", "C"),
///     ("B", "D"),
///     ("C", "D"),
///     ("D", "T"),
/// ]);
/// let result = compute_pst(&adj).unwrap();
///
/// // The diamond body is one region holding one region per arm.
/// let body = result
///     .regions()
///     .values()
///     .find(|r| {
///         result
///             .region_bounds(r.id)
///             .map_or(false, |(entry, _)| entry.src == CfgNode::Node("S"))
///     })
///     .unwrap();
/// assert_eq!(body.children.len(), 2);
/// ```
pub fn compute_pst<N: NodeLabel>(adj: &Adjacency<N>) -> Result<PstResult<N>, PstError> {
    compute_pst_with(adj, Strictness::Strict)
}

/// [`compute_pst`] with an explicit strictness level.
///
/// The level is reserved; see [`Strictness`].
pub fn compute_pst_with<N: NodeLabel>(
    adj: &Adjacency<N>,
    strictness: Strictness,
) -> Result<PstResult<N>, PstError> {
    let _ = strictness;
    if adj.is_empty() {
        return Err(PstError::EmptyGraph);
    }

    let mut graph = AugmentedGraph::build(adj);
    cycle_equiv::classify(&mut graph)?;

    let order = dfs_edge_order(&graph);
    let mut regions = build_regions(&graph, &order);

    let split_edges: Vec<(usize, usize, usize)> = graph
        .edges
        .iter()
        .filter(|e| e.kind != EdgeKind::Back && e.kind != EdgeKind::Capping)
        .map(|e| (e.id, e.u, e.v))
        .collect();
    let dominance = EdgeSplitDominance::new(
        graph.nodes.len(),
        graph.super_entry,
        graph.super_exit,
        &split_edges,
    );
    resolve_nesting(&mut regions, &dominance);

    Ok(publish(graph, regions))
}

/// Deterministic DFS ordering of the directed non-back edges from the
/// super-entry. Every outgoing edge is appended when first walked, even
/// when its target is already visited; the walk only descends into
/// unvisited targets and restarts on leftover nodes in input order.
fn dfs_edge_order<N: NodeLabel>(graph: &AugmentedGraph<N>) -> Vec<usize> {
    let n = graph.nodes.len();
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in &graph.edges {
        if e.kind != EdgeKind::Back && e.kind != EdgeKind::Capping {
            out[e.u].push(e.id);
        }
    }

    let mut visited = FixedBitSet::with_capacity(n);
    let mut order = Vec::with_capacity(graph.real_edges);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for start in std::iter::once(graph.super_entry).chain(0..n) {
        if visited.contains(start) {
            continue;
        }
        visited.insert(start);
        stack.push((start, 0));
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let cursor = top.1;
            if cursor == out[node].len() {
                stack.pop();
                continue;
            }
            top.1 += 1;
            let eid = out[node][cursor];
            order.push(eid);
            let next = graph.edges[eid].v;
            if !visited.contains(next) {
                visited.insert(next);
                stack.push((next, 0));
            }
        }
    }
    order
}

/// Pair consecutive same-class edges of the DFS order into regions.
fn build_regions<N: NodeLabel>(
    graph: &AugmentedGraph<N>,
    order: &[usize],
) -> BTreeMap<usize, Region> {
    let mut regions = BTreeMap::new();
    regions.insert(
        0,
        Region {
            id: 0,
            entry_edge: None,
            exit_edge: None,
            parent: None,
            children: Vec::new(),
        },
    );

    let mut last_edge_by_class: HashMap<usize, usize> = HashMap::new();
    let mut next_id = 1;
    for &eid in order {
        let class = match graph.edges[eid].class_id {
            Some(class) => class,
            None => continue,
        };
        if let Some(&prev) = last_edge_by_class.get(&class) {
            regions.insert(
                next_id,
                Region {
                    id: next_id,
                    entry_edge: Some(prev),
                    exit_edge: Some(eid),
                    parent: None,
                    children: Vec::new(),
                },
            );
            next_id += 1;
        }
        last_edge_by_class.insert(class, eid);
    }
    regions
}

/// Assign each non-root region its immediate parent: the innermost other
/// region whose entry dominates its entry and whose exit post-dominates
/// its exit.
fn resolve_nesting(regions: &mut BTreeMap<usize, Region>, dominance: &EdgeSplitDominance) {
    let ids: Vec<usize> = regions.keys().copied().filter(|&id| id != 0).collect();

    let bounds = |regions: &BTreeMap<usize, Region>, id: usize| -> Option<(usize, usize)> {
        let region = &regions[&id];
        Some((region.entry_edge?, region.exit_edge?))
    };
    let contains = |regions: &BTreeMap<usize, Region>, outer: usize, inner: usize| -> bool {
        if outer == 0 {
            return true;
        }
        match (bounds(regions, outer), bounds(regions, inner)) {
            (Some((oe, ox)), Some((ie, ix))) => {
                dominance.edge_dominates(oe, ie) && dominance.edge_postdominates(ox, ix)
            }
            _ => false,
        }
    };

    let mut parents: Vec<(usize, usize)> = Vec::with_capacity(ids.len());
    for &r in &ids {
        let mut parent = 0;
        for &c in &ids {
            if c == r {
                continue;
            }
            if contains(regions, c, r) && (parent == 0 || contains(regions, parent, c)) {
                parent = c;
            }
        }
        parents.push((r, parent));
    }
    for (r, p) in parents {
        if let Some(region) = regions.get_mut(&r) {
            region.parent = Some(p);
        }
        if let Some(parent) = regions.get_mut(&p) {
            parent.children.push(r);
        }
    }
}

/// Copy the non-capping edges into the published tables.
fn publish<N: NodeLabel>(graph: AugmentedGraph<N>, regions: BTreeMap<usize, Region>) -> PstResult<N> {
    let mut edges = BTreeMap::new();
    for e in &graph.edges {
        if e.kind == EdgeKind::Capping {
            continue;
        }
        edges.insert(
            e.id,
            EdgeInfo {
                id: e.id,
                src: graph.nodes[e.u].clone(),
                dst: graph.nodes[e.v].clone(),
                kind: e.kind,
                class_id: e.class_id.map_or(-1, |class| class as i64),
            },
        );
    }
    PstResult {
        root: 0,
        regions,
        edges,
        super_entry: CfgNode::SuperEntry,
        super_exit: CfgNode::SuperExit,
    }
}
