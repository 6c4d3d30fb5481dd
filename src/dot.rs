//! Graphviz dot file format output for computed results.
//!
//! Three views over a [`PstResult`], each a cheap wrapper whose `Display`
//! impl writes the dot text:
//!
//! - [`CfgDot`] — the flat augmented control-flow graph, one statement per
//!   node and published edge;
//! - [`PstDot`] — the region tree itself, one box per region;
//! - [`RegionDot`] — the control-flow graph with every region drawn as a
//!   nested `cluster` subgraph.
//!
//! Formatting is intended for inspection and debugging; exact output may
//! change.
//!
//! ```
//! use pst::dot::{Config, CfgDot};
//! use pst::{compute_pst, Adjacency};
//!
//! let adj = Adjacency::from_edges([("A", "B"), ("B", "C")]);
//! let result = compute_pst(&adj).unwrap();
//!
//! println!("{}", CfgDot::with_config(&result, &[Config::IncludeBack]));
//! ```

use core::fmt::{self, Display};
use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::graph::{CfgNode, EdgeKind, NodeLabel};
use crate::pst::{EdgeInfo, PstResult};

static INDENT: &str = "    ";

/// Fill and border colors per nesting depth, cycled.
static REGION_PALETTE: [(&str, &str); 6] = [
    ("#E3F2FD", "#64B5F6"),
    ("#E8F5E9", "#81C784"),
    ("#FFF8E1", "#FFB74D"),
    ("#FBE9E7", "#FF8A65"),
    ("#E0F7FA", "#4DD0E1"),
    ("#ECEFF1", "#90A4AE"),
];

static GRAPH_ATTRS: &str = "rankdir=\"LR\", bgcolor=\"transparent\", pad=\"0.2\", \
     nodesep=\"0.35\", ranksep=\"0.5\", splines=\"true\", overlap=\"false\", \
     fontname=\"Helvetica\", fontsize=\"12\"";
static NODE_ATTRS: &str = "shape=\"oval\", style=\"filled\", color=\"#455A64\", \
     fillcolor=\"white\", penwidth=\"1.1\", fontname=\"Helvetica\", fontsize=\"11\", \
     margin=\"0.08,0.05\"";
static EDGE_ATTRS: &str = "color=\"#546E7A\", fontcolor=\"#455A64\", penwidth=\"1.1\", \
     arrowsize=\"0.7\", fontname=\"Helvetica\", fontsize=\"9\"";

/// Dot output configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Config {
    /// Emit the synthetic closing back edge, hidden by default.
    IncludeBack,
    /// Wrap the whole drawing in a cluster for the root region
    /// ([`RegionDot`] only).
    IncludeRoot,
    /// Use no edge labels.
    EdgeNoLabel,
}

#[derive(Copy, Clone, Debug, Default)]
struct Configs {
    include_back: bool,
    include_root: bool,
    edge_no_label: bool,
}

impl Configs {
    fn extract(configs: &[Config]) -> Self {
        let mut c = Configs::default();
        for config in configs {
            match config {
                Config::IncludeBack => c.include_back = true,
                Config::IncludeRoot => c.include_root = true,
                Config::EdgeNoLabel => c.edge_no_label = true,
            }
        }
        c
    }
}

fn escape_id(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_label(text: &str) -> String {
    text.replace('"', "\\\"")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Friendly display label: synthetic endpoints read better than their
/// `__super_entry__`/`__super_exit__` identifiers.
fn display_label<N: Display>(node: &CfgNode<N>) -> String {
    match node {
        CfgNode::Node(n) => n.to_string(),
        CfgNode::SuperEntry => "Super entry".to_string(),
        CfgNode::SuperExit => "Super exit".to_string(),
    }
}

fn edge_label<N>(edge: &EdgeInfo<N>) -> String {
    let mut label = format!("{}:{}", edge.id, edge.class_id);
    if edge.kind == EdgeKind::Back {
        label.push_str("\\nback");
    }
    label
}

fn html_table(lines: &[String]) -> String {
    let mut rows = String::new();
    for line in lines {
        rows.push_str("<TR><TD ALIGN=\"LEFT\">");
        rows.push_str(line);
        rows.push_str("</TD></TR>");
    }
    format!(
        "<TABLE BORDER=\"0\" CELLBORDER=\"0\" CELLPADDING=\"0\" ALIGN=\"LEFT\">{}</TABLE>",
        rows
    )
}

fn edge_pair_html<N: Display>(src: &CfgNode<N>, dst: &CfgNode<N>) -> String {
    format!(
        "{} &#8594; {}",
        escape_html(&display_label(src)),
        escape_html(&display_label(dst))
    )
}

/// The flat augmented control-flow graph as `digraph CFG`.
pub struct CfgDot<'a, N: NodeLabel> {
    result: &'a PstResult<N>,
    config: Configs,
}

impl<'a, N: NodeLabel> CfgDot<'a, N> {
    /// Create a `CfgDot` wrapper with default configuration.
    pub fn new(result: &'a PstResult<N>) -> Self {
        Self::with_config(result, &[])
    }

    /// Create a `CfgDot` wrapper with custom configuration.
    pub fn with_config(result: &'a PstResult<N>, config: &[Config]) -> Self {
        CfgDot {
            result,
            config: Configs::extract(config),
        }
    }
}

impl<'a, N> Display for CfgDot<'a, N>
where
    N: NodeLabel + Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph CFG {{")?;
        writeln!(f, "{}rankdir=LR;", INDENT)?;

        // Node statements, sorted by identifier text.
        let mut nodes: BTreeMap<String, &CfgNode<N>> = BTreeMap::new();
        for edge in self.result.edges().values() {
            if edge.kind == EdgeKind::Back && !self.config.include_back {
                continue;
            }
            nodes.insert(edge.src.to_string(), &edge.src);
            nodes.insert(edge.dst.to_string(), &edge.dst);
        }
        for (id_text, node) in &nodes {
            let mut attrs: Vec<String> = Vec::new();
            if node.is_synthetic() {
                attrs.push("shape=doublecircle".to_string());
            }
            let label = display_label(node);
            if label != *id_text {
                attrs.push(format!("label=\"{}\"", escape_label(&label)));
            }
            if attrs.is_empty() {
                writeln!(f, "{}\"{}\";", INDENT, escape_id(id_text))?;
            } else {
                writeln!(f, "{}\"{}\" [{}];", INDENT, escape_id(id_text), attrs.join(", "))?;
            }
        }

        for edge in self.result.edges().values() {
            if edge.kind == EdgeKind::Back && !self.config.include_back {
                continue;
            }
            let mut attrs: Vec<String> = Vec::new();
            match edge.kind {
                EdgeKind::Back => attrs.push("style=dotted".to_string()),
                EdgeKind::SuperEntry | EdgeKind::SuperExit => {
                    attrs.push("style=dashed".to_string());
                }
                _ => {}
            }
            if !self.config.edge_no_label {
                attrs.push(format!("label=\"{}\"", escape_label(&edge_label(edge))));
            }
            let src = escape_id(&edge.src.to_string());
            let dst = escape_id(&edge.dst.to_string());
            if attrs.is_empty() {
                writeln!(f, "{}\"{}\" -> \"{}\";", INDENT, src, dst)?;
            } else {
                writeln!(f, "{}\"{}\" -> \"{}\" [{}];", INDENT, src, dst, attrs.join(", "))?;
            }
        }

        writeln!(f, "}}")
    }
}

/// The region tree as `digraph PST`: one box per region, tree edges from
/// parent to child.
pub struct PstDot<'a, N: NodeLabel> {
    result: &'a PstResult<N>,
}

impl<'a, N: NodeLabel> PstDot<'a, N> {
    pub fn new(result: &'a PstResult<N>) -> Self {
        PstDot { result }
    }
}

impl<'a, N> Display for PstDot<'a, N>
where
    N: NodeLabel + Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph PST {{")?;
        writeln!(f, "{}node [shape=box];", INDENT)?;

        for &id in self.result.regions().keys() {
            let label = if id == self.result.root() {
                html_table(&["root".to_string()])
            } else {
                match self.result.region_bounds(id) {
                    Some((entry, exit)) => html_table(&[
                        format!("<B>R{}</B>", id),
                        edge_pair_html(&entry.src, &entry.dst),
                        edge_pair_html(&exit.src, &exit.dst),
                    ]),
                    None => continue,
                }
            };
            writeln!(f, "{}\"R{}\" [label=<{}>];", INDENT, id, label)?;
        }

        for (&id, region) in self.result.regions() {
            for &child in &region.children {
                writeln!(f, "{}\"R{}\" -> \"R{}\";", INDENT, id, child)?;
            }
        }

        writeln!(f, "}}")
    }
}

/// The control-flow graph with every region drawn as a nested Graphviz
/// `cluster`, colored by nesting depth. Nodes sit in their innermost
/// region; anything outside every region (the synthetic endpoints in
/// particular) is drawn at top level.
pub struct RegionDot<'a, N: NodeLabel> {
    result: &'a PstResult<N>,
    config: Configs,
}

impl<'a, N: NodeLabel> RegionDot<'a, N> {
    /// Create a `RegionDot` wrapper with default configuration.
    pub fn new(result: &'a PstResult<N>) -> Self {
        Self::with_config(result, &[])
    }

    /// Create a `RegionDot` wrapper with custom configuration.
    pub fn with_config(result: &'a PstResult<N>, config: &[Config]) -> Self {
        RegionDot {
            result,
            config: Configs::extract(config),
        }
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &CfgNode<N>,
        indent: &str,
    ) -> fmt::Result
    where
        N: Display,
    {
        let id_text = node.to_string();
        let mut attrs: Vec<String> = Vec::new();
        if node.is_synthetic() {
            attrs.push("shape=doublecircle".to_string());
            attrs.push("fillcolor=\"#ECEFF1\"".to_string());
            attrs.push("color=\"#607D8B\"".to_string());
            attrs.push("penwidth=\"1.4\"".to_string());
        }
        let label = display_label(node);
        if label != id_text {
            attrs.push(format!("label=\"{}\"", escape_label(&label)));
        }
        if attrs.is_empty() {
            writeln!(f, "{}\"{}\";", indent, escape_id(&id_text))
        } else {
            writeln!(f, "{}\"{}\" [{}];", indent, escape_id(&id_text), attrs.join(", "))
        }
    }
}

impl<'a, N> Display for RegionDot<'a, N>
where
    N: NodeLabel + Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let root = result.root();
        let region_nodes = result.region_nodes();

        // Depth of every region below the root.
        let mut depth: BTreeMap<usize, usize> = BTreeMap::new();
        depth.insert(root, 0);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let d = depth[&id];
            if let Some(region) = result.region(id) {
                for &child in &region.children {
                    depth.insert(child, d + 1);
                    stack.push(child);
                }
            }
        }

        // Innermost region of every node: deepest regions claim first.
        let mut by_depth: Vec<usize> = result
            .regions()
            .keys()
            .copied()
            .filter(|&id| id != root)
            .collect();
        by_depth.sort_by_key(|id| std::cmp::Reverse(depth.get(id).copied().unwrap_or(0)));
        let mut assigned: HashSet<CfgNode<N>> = HashSet::new();
        let mut members: BTreeMap<usize, Vec<CfgNode<N>>> = BTreeMap::new();
        for &id in &by_depth {
            if let Some(nodes) = region_nodes.get(&id) {
                for node in nodes {
                    if assigned.insert(node.clone()) {
                        members.entry(id).or_default().push(node.clone());
                    }
                }
            }
        }

        writeln!(f, "digraph CFG {{")?;
        writeln!(f, "{}graph [{}];", INDENT, GRAPH_ATTRS)?;
        writeln!(f, "{}node [{}];", INDENT, NODE_ATTRS)?;
        writeln!(f, "{}edge [{}];", INDENT, EDGE_ATTRS)?;

        // Nested clusters, children before the region's own nodes.
        enum Step {
            Open(usize, usize),
            Close(usize),
            Nodes(usize, usize),
        }
        let mut steps: Vec<Step> = Vec::new();
        if self.config.include_root {
            steps.push(Step::Open(root, 1));
        } else if let Some(region) = result.region(root) {
            for &child in region.children.iter().rev() {
                steps.push(Step::Open(child, 1));
            }
        }
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(id, level) => {
                    let indent = INDENT.repeat(level);
                    let inner = INDENT.repeat(level + 1);
                    writeln!(f, "{}subgraph cluster_R{} {{", indent, id)?;
                    let label = if id == root {
                        html_table(&["root".to_string()])
                    } else {
                        match result.region_bounds(id) {
                            Some((entry, exit)) => html_table(&[
                                format!("<B>R{}</B>", id),
                                edge_pair_html(&entry.src, &entry.dst),
                                edge_pair_html(&exit.src, &exit.dst),
                            ]),
                            None => html_table(&[format!("R{}", id)]),
                        }
                    };
                    writeln!(f, "{}label=<{}>;", inner, label)?;
                    writeln!(f, "{}labelloc=\"t\";", inner)?;
                    writeln!(f, "{}labeljust=\"l\";", inner)?;
                    let (fill, border) =
                        REGION_PALETTE[depth.get(&id).unwrap_or(&0) % REGION_PALETTE.len()];
                    writeln!(f, "{}style=\"rounded,filled\";", inner)?;
                    writeln!(f, "{}color=\"{}\";", inner, border)?;
                    writeln!(f, "{}fillcolor=\"{}\";", inner, fill)?;
                    writeln!(f, "{}fontcolor=\"#37474F\";", inner)?;
                    writeln!(f, "{}fontsize=\"11\";", inner)?;
                    writeln!(f, "{}fontname=\"Helvetica\";", inner)?;
                    writeln!(f, "{}penwidth=\"1.2\";", inner)?;

                    steps.push(Step::Close(level));
                    steps.push(Step::Nodes(id, level + 1));
                    if let Some(region) = result.region(id) {
                        for &child in region.children.iter().rev() {
                            steps.push(Step::Open(child, level + 1));
                        }
                    }
                }
                Step::Nodes(id, level) => {
                    let indent = INDENT.repeat(level);
                    if let Some(nodes) = members.get(&id) {
                        let mut sorted: Vec<&CfgNode<N>> = nodes.iter().collect();
                        sorted.sort_by_key(|node| node.to_string());
                        for node in sorted {
                            self.write_node(f, node, &indent)?;
                        }
                    }
                }
                Step::Close(level) => {
                    writeln!(f, "{}}}", INDENT.repeat(level))?;
                }
            }
        }

        // Everything no region claimed, at top level.
        let mut emitted = assigned;
        for edge in result.edges().values() {
            if edge.kind == EdgeKind::Back && !self.config.include_back {
                continue;
            }
            for node in [&edge.src, &edge.dst] {
                if emitted.insert(node.clone()) {
                    self.write_node(f, node, INDENT)?;
                }
            }
        }

        for edge in result.edges().values() {
            if edge.kind == EdgeKind::Back && !self.config.include_back {
                continue;
            }
            let mut attrs: Vec<String> = Vec::new();
            match edge.kind {
                EdgeKind::Back => {
                    attrs.push("style=\"dotted\"".to_string());
                    attrs.push("color=\"#90A4AE\"".to_string());
                    attrs.push("fontcolor=\"#90A4AE\"".to_string());
                    attrs.push("constraint=false".to_string());
                }
                EdgeKind::SuperEntry | EdgeKind::SuperExit => {
                    attrs.push("style=\"dashed\"".to_string());
                    attrs.push("color=\"#78909C\"".to_string());
                    attrs.push("fontcolor=\"#78909C\"".to_string());
                }
                _ => {}
            }
            if !self.config.edge_no_label {
                attrs.push(format!("label=\"{}\"", escape_label(&edge_label(edge))));
            }
            let src = escape_id(&edge.src.to_string());
            let dst = escape_id(&edge.dst.to_string());
            if attrs.is_empty() {
                writeln!(f, "{}\"{}\" -> \"{}\";", INDENT, src, dst)?;
            } else {
                writeln!(f, "{}\"{}\" -> \"{}\" [{}];", INDENT, src, dst, attrs.join(", "))?;
            }
        }

        writeln!(f, "}}")
    }
}
