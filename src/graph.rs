//! Input adjacency and control-flow-graph augmentation.

use core::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

#[cfg(feature = "serde-1")]
use serde_derive::{Deserialize, Serialize};

/// A caller-supplied node identifier.
///
/// Identifiers are opaque to the analysis: they are compared, hashed, and
/// cloned into the published result, nothing else. Implemented for all
/// applicable types.
pub trait NodeLabel: Clone + Eq + Hash {}

impl<N> NodeLabel for N where N: Clone + Eq + Hash {}

/// A node of the augmented control-flow graph: either a caller-supplied
/// node or one of the two synthetic endpoints injected by the augmentation.
///
/// The enum keeps the synthetic endpoints distinct from every caller
/// identifier by construction. For rendering, the synthetic variants
/// display as `__super_entry__` and `__super_exit__`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub enum CfgNode<N> {
    /// A node of the input graph.
    Node(N),
    /// The unique synthetic entry; every entry node of the input is one of
    /// its successors.
    SuperEntry,
    /// The unique synthetic exit; every exit node of the input is one of
    /// its predecessors.
    SuperExit,
}

impl<N> CfgNode<N> {
    /// Is this one of the two synthetic endpoints?
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, CfgNode::Node(_))
    }

    /// The caller-supplied label, if this is not a synthetic endpoint.
    pub fn label(&self) -> Option<&N> {
        match self {
            CfgNode::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl<N> fmt::Display for CfgNode<N>
where
    N: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgNode::Node(n) => n.fmt(f),
            CfgNode::SuperEntry => f.write_str("__super_entry__"),
            CfgNode::SuperExit => f.write_str("__super_exit__"),
        }
    }
}

/// How an edge entered the augmented graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(Serialize, Deserialize))]
pub enum EdgeKind {
    /// Declared by an `out` list of the input adjacency.
    Orig,
    /// Synthetic `super-entry → entry node` edge.
    SuperEntry,
    /// Synthetic `exit node → super-exit` edge.
    SuperExit,
    /// The single synthetic `super-exit → super-entry` closing edge.
    Back,
    /// Synthetic bracket terminator minted during classification; never
    /// part of a published result.
    Capping,
}

/// The out/in neighbor lists of one node.
///
/// Only `out` defines directed edges; `incoming` (the `in` side) is
/// informational and merely registers the nodes it mentions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeLinks<N> {
    /// Successors, one edge per entry; duplicates are parallel edges.
    pub out: Vec<N>,
    /// Predecessors as declared by the caller. Not used to form edges.
    pub incoming: Vec<N>,
}

impl<N> Default for NodeLinks<N> {
    fn default() -> Self {
        NodeLinks {
            out: Vec::new(),
            incoming: Vec::new(),
        }
    }
}

/// Directed adjacency input for [`compute_pst`](crate::compute_pst).
///
/// Nodes iterate in first-insertion order, which is what makes every
/// derived artifact (indices, edge ids, class ids, region ids) of a
/// computation deterministic.
#[derive(Clone, Debug)]
pub struct Adjacency<N: NodeLabel> {
    map: IndexMap<N, NodeLinks<N>>,
}

impl<N: NodeLabel> Default for Adjacency<N> {
    fn default() -> Self {
        Adjacency {
            map: IndexMap::new(),
        }
    }
}

impl<N: NodeLabel> Adjacency<N> {
    /// Create an empty adjacency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`, keeping its links if it already exists.
    pub fn add_node(&mut self, node: N) {
        self.map.entry(node).or_default();
    }

    /// Add the directed edge `u → v`, registering both endpoints.
    ///
    /// Adding the same pair twice creates parallel edges.
    pub fn add_edge(&mut self, u: N, v: N) {
        self.map.entry(u.clone()).or_default().out.push(v.clone());
        self.map.entry(v).or_default().incoming.push(u);
    }

    /// Insert a node with explicit link lists, replacing any previous
    /// entry for it.
    ///
    /// The lists may reference nodes that are not themselves keys; such
    /// nodes are registered implicitly when a result is computed.
    pub fn insert(&mut self, node: N, links: NodeLinks<N>) -> Option<NodeLinks<N>> {
        self.map.insert(node, links)
    }

    /// Add all edges from the iterable. See [`Adjacency::add_edge`].
    pub fn extend_with_edges<I>(&mut self, iterable: I)
    where
        I: IntoIterator<Item = (N, N)>,
    {
        for (u, v) in iterable {
            self.add_edge(u, v);
        }
    }

    /// Build an adjacency from an edge list.
    pub fn from_edges<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut adj = Self::new();
        adj.extend_with_edges(iterable);
        adj
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.map.len()
    }

    /// Number of declared edges (the summed `out` lengths).
    pub fn edge_count(&self) -> usize {
        self.map.values().map(|links| links.out.len()).sum()
    }

    /// Whether no node has been registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `node` is registered as a key.
    pub fn contains_node(&self, node: &N) -> bool {
        self.map.contains_key(node)
    }

    /// The link lists of `node`, if registered.
    pub fn links(&self, node: &N) -> Option<&NodeLinks<N>> {
        self.map.get(node)
    }

    /// Registered nodes in first-insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.map.keys()
    }

    /// Nodes with their link lists, in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&N, &NodeLinks<N>)> {
        self.map.iter()
    }
}

/// An edge of the augmented graph, in dense-index form.
#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub(crate) id: usize,
    pub(crate) u: usize,
    pub(crate) v: usize,
    pub(crate) kind: EdgeKind,
    /// Cycle-equivalence class, assigned by classification. Classes are
    /// numbered from 1.
    pub(crate) class_id: Option<usize>,
}

/// The input graph with dense node indices, a super-entry, a super-exit,
/// and the closing back edge — the form every later pass works on.
#[derive(Clone, Debug)]
pub(crate) struct AugmentedGraph<N: NodeLabel> {
    pub(crate) nodes: Vec<CfgNode<N>>,
    /// All edges in id order. Classification appends capping edges past
    /// `real_edges`.
    pub(crate) edges: Vec<Edge>,
    pub(crate) super_entry: usize,
    pub(crate) super_exit: usize,
    /// Number of non-capping edges.
    pub(crate) real_edges: usize,
}

impl<N: NodeLabel> AugmentedGraph<N> {
    /// Index nodes in first-seen order (keys first, then list members per
    /// key), then close the graph: `super_entry → n` for every entry node,
    /// `n → super_exit` for every exit node, and one back edge
    /// `super_exit → super_entry`.
    ///
    /// A node with indegree 0 is an entry; if there is none, every node
    /// is. Exits are the outdegree-0 nodes with the same fallback. Only
    /// `out` lists define edges and degrees.
    pub(crate) fn build(adj: &Adjacency<N>) -> Self {
        let mut interner: IndexSet<&N> = IndexSet::with_capacity(adj.node_count());
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(adj.edge_count());

        for (u, links) in adj.iter() {
            let ui = interner.insert_full(u).0;
            for v in &links.out {
                let vi = interner.insert_full(v).0;
                spans.push((ui, vi));
            }
            for v in &links.incoming {
                interner.insert_full(v);
            }
        }

        let n = interner.len();
        let mut indegree = vec![0usize; n];
        let mut outdegree = vec![0usize; n];
        for &(u, v) in &spans {
            outdegree[u] += 1;
            indegree[v] += 1;
        }

        let mut entries: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        if entries.is_empty() {
            entries = (0..n).collect();
        }
        let mut exits: Vec<usize> = (0..n).filter(|&i| outdegree[i] == 0).collect();
        if exits.is_empty() {
            exits = (0..n).collect();
        }

        let super_entry = n;
        let super_exit = n + 1;
        let mut nodes: Vec<CfgNode<N>> = Vec::with_capacity(n + 2);
        nodes.extend(interner.iter().map(|&node| CfgNode::Node(node.clone())));
        nodes.push(CfgNode::SuperEntry);
        nodes.push(CfgNode::SuperExit);

        fn push(edges: &mut Vec<Edge>, u: usize, v: usize, kind: EdgeKind) {
            let id = edges.len();
            edges.push(Edge {
                id,
                u,
                v,
                kind,
                class_id: None,
            });
        }
        let mut edges: Vec<Edge> =
            Vec::with_capacity(spans.len() + entries.len() + exits.len() + 1);
        for &(u, v) in &spans {
            push(&mut edges, u, v, EdgeKind::Orig);
        }
        for &e in &entries {
            push(&mut edges, super_entry, e, EdgeKind::SuperEntry);
        }
        for &x in &exits {
            push(&mut edges, x, super_exit, EdgeKind::SuperExit);
        }
        push(&mut edges, super_exit, super_entry, EdgeKind::Back);

        let real_edges = edges.len();
        AugmentedGraph {
            nodes,
            edges,
            super_entry,
            super_exit,
            real_edges,
        }
    }
}
