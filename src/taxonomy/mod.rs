//! Class taxonomy construction and indexing.
//!
//! A taxonomy arrives as a flat parent → children adjacency map plus an
//! ordered list of leaf class names. This module turns that into:
//!
//! - [`TaxonomyTree`]: an arena tree with ordered children and (optionally)
//!   collapsed single-child chains
//! - [`TaxonomyIndex`]: the lookup tables routing needs — leaf name ↔ dense
//!   label index, and per-leaf root-to-leaf decision paths
//!
//! Both are built once at model-assembly time and are immutable for the life
//! of a training or inference run. Loading helpers for the serialized inputs
//! live in [`io`].

pub mod io;

mod index;
mod tree;

pub use index::{PathStep, TaxonomyIndex};
pub use tree::{NodeId, TaxonomyTree};

/// Errors raised while building or indexing a taxonomy.
///
/// All of these are fatal: a malformed or inconsistent taxonomy makes
/// downstream routing undefined, so construction aborts instead of guessing.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    /// The adjacency data contains a cycle reachable from the root.
    #[error("malformed taxonomy: cycle through node `{node}`")]
    Malformed {
        /// The node that was reached while already on the traversal path.
        node: String,
    },

    /// The tree's leaf set and the supplied leaf-name list disagree.
    #[error("inconsistent taxonomy: {reason}")]
    Inconsistent { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strip everything but ASCII alphanumerics from an identifier.
///
/// Source taxonomies carry formatting noise (whitespace, punctuation,
/// quoting), so ids are sanitized on ingest and the adjacency map, the
/// leaf-name list, and all lookups agree on one spelling.
pub(crate) fn sanitize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
