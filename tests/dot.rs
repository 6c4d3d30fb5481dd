use pst::dot::{CfgDot, Config, PstDot, RegionDot};
use pst::{compute_pst, Adjacency, PstResult};

fn chain() -> PstResult<&'static str> {
    compute_pst(&Adjacency::from_edges([("A", "B"), ("B", "C")])).unwrap()
}

#[test]
fn cfg_dot_lists_nodes_and_edges() {
    let result = chain();
    let dot = CfgDot::new(&result).to_string();

    assert!(dot.starts_with("digraph CFG {"));
    assert!(dot.contains("\"A\";"));
    assert!(dot.contains("\"__super_entry__\" [shape=doublecircle, label=\"Super entry\"];"));
    assert!(dot.contains("\"A\" -> \"B\""));
    assert!(dot.contains("\"__super_entry__\" -> \"A\" [style=dashed"));
    // The closing back edge stays hidden by default.
    assert!(!dot.contains("\"__super_exit__\" -> \"__super_entry__\""));

    let with_back = CfgDot::with_config(&result, &[Config::IncludeBack]).to_string();
    assert!(with_back.contains("\"__super_exit__\" -> \"__super_entry__\" [style=dotted"));
    assert!(with_back.contains("\\nback"));
}

#[test]
fn cfg_dot_edge_labels_carry_id_and_class() {
    let result = chain();
    let dot = CfgDot::new(&result).to_string();
    for edge in result.edges().values() {
        if edge.kind != pst::EdgeKind::Back {
            assert!(dot.contains(&format!("label=\"{}:{}\"", edge.id, edge.class_id)));
        }
    }

    let unlabeled = CfgDot::with_config(&result, &[Config::EdgeNoLabel]).to_string();
    assert!(!unlabeled.contains("label=\"0:"));
}

#[test]
fn pst_dot_draws_the_region_tree() {
    let result = chain();
    let dot = PstDot::new(&result).to_string();

    assert!(dot.starts_with("digraph PST {"));
    assert!(dot.contains("\"R0\""));
    for region in result.regions().values() {
        for &child in &region.children {
            assert!(dot.contains(&format!("\"R{}\" -> \"R{}\";", region.id, child)));
        }
    }
    assert!(dot.contains("&#8594;"));
}

#[test]
fn region_dot_nests_clusters() {
    let result = compute_pst(&Adjacency::from_edges([
        ("S", "A"),
        ("A", "B"),
        ("A", "C"),
        ("B", "D"),
        ("C", "D"),
        ("D", "T"),
    ]))
    .unwrap();
    let dot = RegionDot::new(&result).to_string();

    assert!(dot.starts_with("digraph CFG {"));
    for region in result.regions().values() {
        if region.id != result.root() {
            assert!(dot.contains(&format!("subgraph cluster_R{} {{", region.id)));
        }
    }
    // Root cluster appears only on request.
    assert!(!dot.contains("cluster_R0"));
    let with_root = RegionDot::with_config(&result, &[Config::IncludeRoot]).to_string();
    assert!(with_root.contains("cluster_R0"));

    // Depth palette: regions directly under the root sit at depth 1 and
    // use the second pair, their children the third.
    assert!(dot.contains("fillcolor=\"#E8F5E9\""));
    assert!(dot.contains("fillcolor=\"#FFF8E1\""));
    // Synthetic endpoints are drawn outside every cluster.
    assert!(dot.contains("\"__super_entry__\" [shape=doublecircle"));
}

#[test]
fn dot_identifiers_are_escaped() {
    let result = compute_pst(&Adjacency::from_edges([("say \"hi\"", "B")])).unwrap();
    let dot = CfgDot::new(&result).to_string();
    assert!(dot.contains("\"say \\\"hi\\\"\""));
}
