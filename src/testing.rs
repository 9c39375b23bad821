//! Assertion helpers and shared fixtures for unit and integration tests.
//!
//! The fixtures build a small songbird taxonomy used across the test suite:
//!
//! ```text
//! Aves ── Paridae ──── Parusmajor
//!      │           └── Parusater
//!      └─ Corvidae ─── Corvuscorax
//!                  └── Picapica
//! ```

use std::collections::HashMap;

use ndarray::Array2;

use crate::branch::{BranchParams, TaxonomicBranch};
use crate::taxonomy::{TaxonomyIndex, TaxonomyTree};
use crate::training::Batch;

/// Feature dimension used by the fixture branch.
pub const AVES_FEATURES: usize = 6;

/// Assert that two floats are approximately equal (absolute difference).
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let (left, right, tolerance) = ($left, $right, $tolerance);
        let diff = (left - right).abs();
        assert!(
            diff <= tolerance,
            "assertion failed: `(left ≈ right)`\n  left: `{left:?}`\n right: `{right:?}`\n  diff: `{diff:?}` > tolerance `{tolerance:?}`",
        );
    }};
}

/// Adjacency map for the two-family songbird taxonomy.
pub fn aves_adjacency() -> HashMap<String, Vec<String>> {
    [
        ("Aves", vec!["Paridae", "Corvidae"]),
        ("Paridae", vec!["Parusmajor", "Parusater"]),
        ("Corvidae", vec!["Corvuscorax", "Picapica"]),
    ]
    .into_iter()
    .map(|(parent, kids)| {
        (
            parent.to_string(),
            kids.into_iter().map(String::from).collect(),
        )
    })
    .collect()
}

/// Leaf-name list matching [`aves_adjacency`], in label order.
pub fn aves_leaf_names() -> Vec<String> {
    ["Parusmajor", "Parusater", "Corvuscorax", "Picapica"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Tree and index for the songbird taxonomy.
pub fn aves_taxonomy() -> (TaxonomyTree, TaxonomyIndex) {
    let tree = TaxonomyTree::build("Aves", &aves_adjacency(), true)
        .expect("fixture adjacency is well formed");
    let index =
        TaxonomyIndex::build(&tree, &aves_leaf_names()).expect("fixture leaf list is consistent");
    (tree, index)
}

/// A freshly initialized branch over the songbird taxonomy.
pub fn aves_branch() -> TaxonomicBranch {
    let (tree, index) = aves_taxonomy();
    TaxonomicBranch::new(tree, index, AVES_FEATURES, &BranchParams::default())
}

/// One minibatch with one example per leaf.
///
/// Example `i` (label `i`) carries the basis feature vector `eᵢ`, so the
/// four classes are linearly separable and deterministic.
pub fn aves_training_batch() -> Batch {
    let mut inputs = Array2::zeros((AVES_FEATURES, 4));
    for i in 0..4 {
        inputs[(i, i)] = 1.0;
    }
    Batch {
        inputs,
        labels: vec![0, 1, 2, 3],
    }
}
