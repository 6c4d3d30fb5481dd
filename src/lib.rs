//! **pst** computes the program structure tree of a directed control-flow
//! graph: its decomposition into canonical single-entry single-exit (SESE)
//! regions, nested by containment.
//!
//! The input is an abstract adjacency ([`Adjacency`]); it may have multiple
//! entries and exits, irreducible cycles, parallel edges, and disconnected
//! pieces. [`compute_pst`] augments it with a super-entry, a super-exit and
//! a closing back edge, classifies every edge by *cycle equivalence* with
//! the linear-time bracket-list algorithm of Johnson, Pearson and Pingali,
//! pairs consecutive class members in DFS order into regions, and nests the
//! regions via dominators over the edge-split graph. The returned
//! [`PstResult`] is immutable: a region tree, an edge table with class ids,
//! and the two synthetic endpoint labels.
//!
//! The [`dot`] module renders a result to the Graphviz dot format.
//!
//! ```
//! use pst::{compute_pst, Adjacency};
//!
//! let adj = Adjacency::from_edges([("A", "B"), ("B", "C")]);
//! let result = compute_pst(&adj).unwrap();
//!
//! // every published edge carries a cycle-equivalence class
//! assert!(result.edges().values().all(|e| e.class_id >= 1));
//! ```
//!
//! Crate feature `serde-1` derives serde serialization for the published
//! result types.

#![deny(unsafe_code)]

pub mod dot;
pub mod graph;
pub mod pst;

mod bracket;
mod cycle_equiv;
mod dominance;

pub use crate::graph::{Adjacency, CfgNode, EdgeKind, NodeLabel, NodeLinks};
pub use crate::pst::{
    compute_pst, compute_pst_with, EdgeInfo, PstError, PstResult, Region, Strictness,
};
