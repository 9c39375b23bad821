//! Loading helpers for serialized taxonomy inputs.
//!
//! Two inputs arrive from outside:
//!
//! - the adjacency structure, a JSON object mapping parent id → array of
//!   child ids, loaded once at startup
//! - the leaf-name list, one name per line, order-sensitive: line `N`
//!   assigns dense label index `N`
//!
//! Parsing is separated from file access so the core can be driven from
//! in-memory data in tests and embeddings.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::TaxonomyError;

/// Parse an adjacency structure from a JSON object.
///
/// Child order inside each array is preserved; it defines each node's
/// classifier output layout downstream.
pub fn adjacency_from_json(json: &str) -> Result<HashMap<String, Vec<String>>, TaxonomyError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse an adjacency structure from a JSON file.
pub fn adjacency_from_path(
    path: impl AsRef<Path>,
) -> Result<HashMap<String, Vec<String>>, TaxonomyError> {
    adjacency_from_json(&fs::read_to_string(path)?)
}

/// Split a leaf-name list into ordered names, one per line.
///
/// Blank lines are skipped; surrounding whitespace is trimmed. Sanitization
/// happens later, at index construction, so the raw spellings stay available
/// to callers.
pub fn leaf_names_from_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read an ordered leaf-name list from a file.
pub fn leaf_names_from_path(path: impl AsRef<Path>) -> Result<Vec<String>, TaxonomyError> {
    Ok(leaf_names_from_lines(&fs::read_to_string(path)?))
}
