//! Cycle-equivalence classification of the augmented graph.
//!
//! Two edges are *cycle-equivalent* iff every cycle of the undirected
//! augmentation contains both or neither; edges of one class are exactly
//! the candidate boundaries of the same SESE regions. This implements the
//! linear-time algorithm of Johnson, Pearson and Pingali (*The program
//! structure tree: computing control regions in linear time*, PLDI 1994):
//! one undirected spanning-tree DFS, then one post-order sweep that keeps a
//! bracket list per node — the back edges whose cycles are still open —
//! and names classes after the top bracket of each tree edge.
//!
//! Runs in **O(|V| + |E|)**.

use fixedbitset::FixedBitSet;

use crate::bracket::{BracketArena, BracketList, NIL};
use crate::graph::{AugmentedGraph, Edge, EdgeKind, NodeLabel};
use crate::pst::PstError;

const UNDEFINED: usize = usize::MAX;

/// Assign a `class_id` to every non-capping edge of `graph`.
///
/// Capping edges minted along the way are appended to `graph.edges`; the
/// publisher drops them. Fails with [`PstError::NotStronglyConnected`]
/// when a non-root tree edge has an empty bracket list, which cannot
/// happen once the augmentation has closed the graph.
pub(crate) fn classify<N: NodeLabel>(graph: &mut AugmentedGraph<N>) -> Result<(), PstError> {
    let n = graph.nodes.len();
    let real = graph.real_edges;

    // Undirected incidence over all real edges, including the closing
    // back edge. Both endpoints see the edge; `edge_seen` keeps the DFS
    // from walking an edge twice.
    let mut undirected: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for e in &graph.edges {
        undirected[e.u].push((e.id, e.v));
        undirected[e.v].push((e.id, e.u));
    }

    let mut dfsnum = vec![0usize; n];
    let mut parent = vec![UNDEFINED; n];
    let mut parent_edge = vec![UNDEFINED; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    // Back edges leaving a node for a strict ancestor, and arriving at a
    // node from a strict descendant.
    let mut backedges_from: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut backedges_to: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut edge_upper = vec![UNDEFINED; real];
    let mut edge_seen = FixedBitSet::with_capacity(real);
    let mut postorder = Vec::with_capacity(n);

    let mut classes = 0usize;
    let mut time = 0usize;
    let mut stack: Vec<(usize, usize)> = Vec::new();

    // Spanning-tree DFS rooted at the super-entry; disconnected inputs
    // restart in input order.
    for start in std::iter::once(graph.super_entry).chain(0..n) {
        if dfsnum[start] != 0 {
            continue;
        }
        time += 1;
        dfsnum[start] = time;
        stack.push((start, 0));
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let cursor = top.1;
            if cursor == undirected[node].len() {
                postorder.push(node);
                stack.pop();
                continue;
            }
            top.1 += 1;
            let (eid, other) = undirected[node][cursor];
            if edge_seen.contains(eid) {
                continue;
            }
            edge_seen.insert(eid);
            if other == node {
                // A self-loop is a cycle all by itself: own class, and it
                // must not survive as a bracket in any ancestor's list.
                classes += 1;
                graph.edges[eid].class_id = Some(classes);
                continue;
            }
            if dfsnum[other] == 0 {
                parent[other] = node;
                parent_edge[other] = eid;
                children[node].push(other);
                time += 1;
                dfsnum[other] = time;
                stack.push((other, 0));
            } else {
                let (desc, anc) = if dfsnum[other] < dfsnum[node] {
                    (node, other)
                } else {
                    (other, node)
                };
                backedges_from[desc].push(eid);
                backedges_to[anc].push(eid);
                edge_upper[eid] = anc;
            }
        }
    }

    let mut node_by_dfsnum = vec![0usize; time + 1];
    for w in 0..n {
        node_by_dfsnum[dfsnum[w]] = w;
    }

    let mut arena = BracketArena::new();
    let mut blists = vec![BracketList::new(); n];
    let mut hi = vec![UNDEFINED; n];
    let mut capping_to: Vec<Vec<usize>> = vec![Vec::new(); n];
    // Per-edge sweep state, indexed by edge id and grown whenever a
    // capping edge is minted.
    let mut recent_size = vec![0usize; real];
    let mut recent_class = vec![0usize; real];
    let mut handle = vec![NIL; real];

    for &w in &postorder {
        // hi0: highest ancestor reached by a back edge leaving w.
        let mut hi0 = UNDEFINED;
        for &e in &backedges_from[w] {
            hi0 = hi0.min(dfsnum[edge_upper[e]]);
        }

        // hi1/hi2: the two highest reaches among the children.
        let mut hi1 = UNDEFINED;
        let mut hi2 = UNDEFINED;
        for &c in &children[w] {
            let val = hi[c];
            if val < hi1 {
                hi2 = hi1;
                hi1 = val;
            } else if val < hi2 {
                hi2 = val;
            }
        }
        hi[w] = hi0.min(hi1);

        let mut bl = BracketList::new();
        for &c in &children[w] {
            bl = arena.concat(blists[c], bl);
        }
        for &cap in &capping_to[w] {
            if handle[cap] != NIL {
                arena.remove(&mut bl, handle[cap]);
                handle[cap] = NIL;
            }
        }
        for &b in &backedges_to[w] {
            if handle[b] != NIL {
                arena.remove(&mut bl, handle[b]);
                handle[b] = NIL;
            }
            if graph.edges[b].class_id.is_none() {
                classes += 1;
                graph.edges[b].class_id = Some(classes);
            }
        }
        for &b in &backedges_from[w] {
            handle[b] = arena.push(&mut bl, b);
        }

        // Brackets from the second-highest child reach would stay open too
        // long; a capping edge up to that ancestor closes them on time.
        if hi2 < hi0 {
            let upper = node_by_dfsnum[hi2];
            let id = graph.edges.len();
            graph.edges.push(Edge {
                id,
                u: w,
                v: upper,
                kind: EdgeKind::Capping,
                class_id: None,
            });
            recent_size.push(0);
            recent_class.push(0);
            handle.push(NIL);
            handle[id] = arena.push(&mut bl, id);
            capping_to[upper].push(id);
        }

        if parent[w] != UNDEFINED {
            let tree_edge = parent_edge[w];
            let top = match arena.top(&bl) {
                Some(top) => top,
                None => return Err(PstError::NotStronglyConnected),
            };
            if recent_size[top] != bl.len() {
                recent_size[top] = bl.len();
                classes += 1;
                recent_class[top] = classes;
            }
            graph.edges[tree_edge].class_id = Some(recent_class[top]);
            // A singleton bracket means the tree edge and the bracket are
            // the two sides of one region boundary.
            if recent_size[top] == 1 && graph.edges[top].kind != EdgeKind::Capping {
                graph.edges[top].class_id = graph.edges[tree_edge].class_id;
            }
        }

        blists[w] = bl;
    }

    Ok(())
}
