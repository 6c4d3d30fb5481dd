//! Writes the example SESE visualizations to disk: dot files for a small
//! diamond graph and for the reference graph of the program-structure-tree
//! paper, rendered to SVG when Graphviz is installed.

use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use pst::dot::{Config, RegionDot};
use pst::{compute_pst, Adjacency};

const DIAMOND: &[(&str, &str)] = &[
    ("S", "A"),
    ("A", "B"),
    ("A", "C"),
    ("B", "D"),
    ("C", "D"),
    ("D", "T"),
];

/// Figure 1(a) of Johnson–Pearson–Pingali.
const PAPER: &[(&str, &str)] = &[
    ("start", "n1"),
    ("n1", "n2"),
    ("n1", "n3"),
    ("n2", "n4"),
    ("n3", "n5"),
    ("n4", "n6"),
    ("n5", "n7"),
    ("n5", "n8"),
    ("n6", "n9"),
    ("n6", "n10"),
    ("n7", "n11"),
    ("n8", "n11"),
    ("n9", "n12"),
    ("n10", "n12"),
    ("n11", "n13"),
    ("n12", "n14"),
    ("n13", "n8"),
    ("n13", "n15"),
    ("n14", "n2"),
    ("n14", "n16"),
    ("n15", "n16"),
    ("n16", "end"),
];

fn build_adj(edges: &[(&'static str, &'static str)]) -> Adjacency<&'static str> {
    let mut adj = Adjacency::new();
    let mut seen = HashSet::new();
    for &(u, v) in edges {
        if seen.insert((u, v)) {
            adj.add_edge(u, v);
        }
    }
    adj
}

fn run() -> Result<(), Box<dyn Error>> {
    let out_dir = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("images"));
    fs::create_dir_all(&out_dir)?;

    let mut written = Vec::new();
    for (name, edges, labels) in [
        ("cfg_regions", DIAMOND, true),
        ("cfg_regions_paper", PAPER, false),
    ] {
        let adj = build_adj(edges);
        let result = compute_pst(&adj)?;
        let config: &[Config] = if labels { &[] } else { &[Config::EdgeNoLabel] };
        let dot = RegionDot::with_config(&result, config).to_string();

        let path = out_dir.join(format!("{}.dot", name));
        fs::write(&path, dot)?;
        println!(
            "{}: nodes={} edges={} regions={} wrote {}",
            name,
            adj.node_count(),
            adj.edge_count(),
            result.regions().len(),
            path.display()
        );
        written.push(path);
    }

    render_svgs(&out_dir, &written)
}

/// Render each dot file to SVG with Graphviz, removing the dot file on
/// success. A missing `dot` executable is not an error; a failing one is.
fn render_svgs(out_dir: &Path, dot_files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    for path in dot_files {
        let svg = path.with_extension("svg");
        let status = match Command::new("dot")
            .arg("-Tsvg")
            .arg(path)
            .arg("-o")
            .arg(&svg)
            .status()
        {
            Ok(status) => status,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                println!("Graphviz 'dot' not found; DOT files are in {}", out_dir.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        if !status.success() {
            return Err(format!("dot -Tsvg failed for {}", path.display()).into());
        }
        fs::remove_file(path)?;
    }
    println!("SVGs written to {}", out_dir.display());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
