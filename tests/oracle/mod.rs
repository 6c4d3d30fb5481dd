//! Naive reference implementations used to cross-check results: undirected
//! simple-cycle enumeration, set-based dominators over the edge-split
//! graph, and the canonical SESE pair filter. Everything here is
//! exponential or quadratic and meant for small graphs only.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use pst::{CfgNode, EdgeKind, NodeLabel, PstResult};

/// The published edges of a result with dense node indices.
pub struct Indexed {
    pub node_count: usize,
    pub entry: usize,
    pub exit: usize,
    /// `(edge id, u, v, kind)` in id order.
    pub edges: Vec<(usize, usize, usize, EdgeKind)>,
}

pub fn index_result<N: NodeLabel>(result: &PstResult<N>) -> Indexed {
    let mut index: HashMap<&CfgNode<N>, usize> = HashMap::new();
    for e in result.edges().values() {
        for node in [&e.src, &e.dst] {
            let next = index.len();
            index.entry(node).or_insert(next);
        }
    }
    let edges = result
        .edges()
        .values()
        .map(|e| (e.id, index[&e.src], index[&e.dst], e.kind))
        .collect();
    Indexed {
        node_count: index.len(),
        entry: index[result.super_entry()],
        exit: index[result.super_exit()],
        edges,
    }
}

/// Every simple cycle of the undirected multigraph, as an edge-id set.
/// Tracks the arrival edge rather than the parent node, so two-edge cycles
/// (parallel edges, mutual edges) and self-loops are all found.
pub fn enumerate_cycles(
    node_count: usize,
    edges: &[(usize, usize, usize, EdgeKind)],
) -> Vec<BTreeSet<usize>> {
    let mut incidence: Vec<Vec<(usize, usize)>> = vec![Vec::new(); node_count];
    for &(id, u, v, _) in edges {
        incidence[u].push((id, v));
        if u != v {
            incidence[v].push((id, u));
        }
    }

    let mut cycles: HashSet<BTreeSet<usize>> = HashSet::new();
    for start in 0..node_count {
        // Simple paths from `start` over nodes >= start; a cycle is
        // counted at its minimum node.
        let mut stack: Vec<(usize, usize, Vec<usize>, Vec<usize>)> =
            vec![(start, usize::MAX, vec![start], Vec::new())];
        while let Some((node, in_edge, path_nodes, path_edges)) = stack.pop() {
            for &(eid, nb) in &incidence[node] {
                if eid == in_edge {
                    continue;
                }
                if nb == start {
                    let mut cycle: BTreeSet<usize> = path_edges.iter().copied().collect();
                    cycle.insert(eid);
                    cycles.insert(cycle);
                    continue;
                }
                if nb < start || path_nodes.contains(&nb) {
                    continue;
                }
                let mut next_nodes = path_nodes.clone();
                next_nodes.push(nb);
                let mut next_edges = path_edges.clone();
                next_edges.push(eid);
                stack.push((nb, eid, next_nodes, next_edges));
            }
        }
    }

    let mut out: Vec<BTreeSet<usize>> = cycles.into_iter().collect();
    out.sort();
    out
}

/// For every edge, the set of cycle indices it participates in.
pub fn edge_cycle_sets(
    edges: &[(usize, usize, usize, EdgeKind)],
    cycles: &[BTreeSet<usize>],
) -> BTreeMap<usize, BTreeSet<usize>> {
    let mut sets: BTreeMap<usize, BTreeSet<usize>> = edges
        .iter()
        .map(|&(id, _, _, _)| (id, BTreeSet::new()))
        .collect();
    for (ci, cycle) in cycles.iter().enumerate() {
        for &e in cycle {
            if let Some(set) = sets.get_mut(&e) {
                set.insert(ci);
            }
        }
    }
    sets
}

/// Set-based iterative dominators: `dom(start) = {start}`, every other
/// node intersects its predecessors' sets until nothing changes.
pub fn dominator_sets(total: usize, start: usize, preds: &[Vec<usize>]) -> Vec<BTreeSet<usize>> {
    let full: BTreeSet<usize> = (0..total).collect();
    let mut dom: Vec<BTreeSet<usize>> = vec![full.clone(); total];
    dom[start] = std::iter::once(start).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for n in 0..total {
            if n == start {
                continue;
            }
            let mut next: BTreeSet<usize> = if preds[n].is_empty() {
                BTreeSet::new()
            } else {
                let mut acc = full.clone();
                for &p in &preds[n] {
                    acc = acc.intersection(&dom[p]).copied().collect();
                }
                acc
            };
            next.insert(n);
            if next != dom[n] {
                dom[n] = next;
                changed = true;
            }
        }
    }
    dom
}

/// Dominator and post-dominator sets over the edge-split graph of the
/// published non-back edges.
pub struct SplitDominance {
    pub split: BTreeMap<usize, usize>,
    pub dom: Vec<BTreeSet<usize>>,
    pub postdom: Vec<BTreeSet<usize>>,
}

pub fn split_dominance(ix: &Indexed) -> SplitDominance {
    let mut split = BTreeMap::new();
    for &(id, _, _, kind) in &ix.edges {
        if kind == EdgeKind::Back {
            continue;
        }
        split.insert(id, ix.node_count + split.len());
    }
    let total = ix.node_count + split.len();
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); total];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); total];
    for &(id, u, v, kind) in &ix.edges {
        if kind == EdgeKind::Back {
            continue;
        }
        let e = split[&id];
        succs[u].push(e);
        preds[e].push(u);
        succs[e].push(v);
        preds[v].push(e);
    }
    SplitDominance {
        dom: dominator_sets(total, ix.entry, &preds),
        postdom: dominator_sets(total, ix.exit, &succs),
        split,
    }
}

/// Does the crate's class partition of the non-back edges equal the
/// partition by cycle membership?
pub fn classes_match_cycle_sets<N: NodeLabel>(result: &PstResult<N>) -> bool {
    let ix = index_result(result);
    let cycles = enumerate_cycles(ix.node_count, &ix.edges);
    let sets = edge_cycle_sets(&ix.edges, &cycles);

    let non_back: Vec<usize> = ix
        .edges
        .iter()
        .filter(|&&(_, _, _, kind)| kind != EdgeKind::Back)
        .map(|&(id, _, _, _)| id)
        .collect();
    for (i, &a) in non_back.iter().enumerate() {
        for &b in &non_back[i + 1..] {
            let same_class = result.edges()[&a].class_id == result.edges()[&b].class_id;
            let same_cycles = sets[&a] == sets[&b];
            if same_class != same_cycles {
                return false;
            }
        }
    }
    true
}

/// All canonical SESE pairs `(entry edge, exit edge)` by brute force:
/// every edge pair with equal cycle membership where the entry dominates
/// the exit and the exit post-dominates the entry, reduced to the
/// innermost (minimal) pairs.
pub fn canonical_pairs<N: NodeLabel>(result: &PstResult<N>) -> BTreeSet<(usize, usize)> {
    let ix = index_result(result);
    let cycles = enumerate_cycles(ix.node_count, &ix.edges);
    let cycle_sets = edge_cycle_sets(&ix.edges, &cycles);
    let sd = split_dominance(&ix);

    let non_back: Vec<usize> = ix
        .edges
        .iter()
        .filter(|&&(_, _, _, kind)| kind != EdgeKind::Back)
        .map(|&(id, _, _, _)| id)
        .collect();

    let mut sese: Vec<(usize, usize)> = Vec::new();
    for &a in &non_back {
        for &b in &non_back {
            if a == b || cycle_sets[&a] != cycle_sets[&b] {
                continue;
            }
            if !sd.dom[sd.split[&b]].contains(&sd.split[&a]) {
                continue;
            }
            if !sd.postdom[sd.split[&a]].contains(&sd.split[&b]) {
                continue;
            }
            sese.push((a, b));
        }
    }

    let mut by_entry: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut by_exit: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &(a, b) in &sese {
        by_entry.entry(a).or_default().push(b);
        by_exit.entry(b).or_default().push(a);
    }

    // Keep the exit that dominates all other candidate exits of the same
    // entry, then the entry that post-dominates all other candidate
    // entries of the same exit.
    let mut canonical: BTreeSet<(usize, usize)> = BTreeSet::new();
    for (&a, bs) in &by_entry {
        for &b in bs {
            if bs
                .iter()
                .all(|&x| sd.dom[sd.split[&x]].contains(&sd.split[&b]))
            {
                canonical.insert((a, b));
            }
        }
    }
    let mut filtered: BTreeSet<(usize, usize)> = BTreeSet::new();
    for (&b, a_list) in &by_exit {
        for &a in a_list {
            if a_list
                .iter()
                .all(|&x| sd.postdom[sd.split[&x]].contains(&sd.split[&a]))
                && canonical.contains(&(a, b))
            {
                filtered.insert((a, b));
            }
        }
    }
    filtered
}

/// The `(entry edge, exit edge)` pairs of the computed non-root regions.
pub fn pst_pairs<N: NodeLabel>(result: &PstResult<N>) -> BTreeSet<(usize, usize)> {
    result
        .regions()
        .values()
        .filter(|r| r.id != result.root())
        .filter_map(|r| Some((r.entry_edge?, r.exit_edge?)))
        .filter(|&(a, b)| {
            result.edges()[&a].kind != EdgeKind::Back && result.edges()[&b].kind != EdgeKind::Back
        })
        .collect()
}

/// Parent/children soundness: chains terminate at the root, children
/// lists exactly cover the non-root regions, and both sides agree.
pub fn check_nesting_forest<N: NodeLabel>(result: &PstResult<N>) -> bool {
    let root = result.root();
    let regions = result.regions();
    let Some(root_region) = regions.get(&root) else {
        return false;
    };
    if root_region.parent.is_some() {
        return false;
    }

    let mut child_count: BTreeMap<usize, usize> = BTreeMap::new();
    for region in regions.values() {
        for &child in &region.children {
            *child_count.entry(child).or_insert(0) += 1;
            match regions.get(&child) {
                Some(c) if c.parent == Some(region.id) => {}
                _ => return false,
            }
        }
    }
    if child_count.contains_key(&root) {
        return false;
    }

    for region in regions.values() {
        if region.id == root {
            continue;
        }
        if child_count.get(&region.id) != Some(&1) {
            return false;
        }
        // Walk the parent chain; it must reach the root without cycling.
        let mut cursor = region.id;
        let mut steps = 0;
        while cursor != root {
            match regions.get(&cursor).and_then(|r| r.parent) {
                Some(p) => cursor = p,
                None => return false,
            }
            steps += 1;
            if steps > regions.len() {
                return false;
            }
        }
    }
    true
}
