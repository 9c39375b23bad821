//! Taxonomy construction and indexing integration tests.

use std::collections::HashMap;

use proptest::prelude::*;
use rstest::rstest;

use cladewise::taxonomy::{io, TaxonomyError, TaxonomyIndex, TaxonomyTree};
use cladewise::testing::{aves_adjacency, aves_leaf_names};

fn adjacency(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(parent, kids)| {
            (
                parent.to_string(),
                kids.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect()
}

#[test]
fn every_leaf_path_replays_to_its_leaf() {
    let adj = adjacency(&[
        ("Aves", &["Passeriformes", "Piciformes"]),
        ("Passeriformes", &["Paridae", "Corvidae"]),
        ("Paridae", &["Parusmajor", "Parusater", "Parusmontanus"]),
        ("Corvidae", &["Corvuscorax", "Picapica"]),
        ("Piciformes", &["Dendrocoposmajor", "Picusviridis"]),
    ]);
    let names: Vec<String> = [
        "Parusmajor",
        "Parusater",
        "Parusmontanus",
        "Corvuscorax",
        "Picapica",
        "Dendrocoposmajor",
        "Picusviridis",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let tree = TaxonomyTree::build("Aves", &adj, true).unwrap();
    let index = TaxonomyIndex::build(&tree, &names).unwrap();

    for label in 0..index.n_leaves() {
        let mut node = tree.root();
        for step in index.path(label).unwrap() {
            assert_eq!(step.node, node, "path steps must chain from the root");
            node = tree.children(node)[step.child];
        }
        assert_eq!(
            Some(node),
            index.leaf_node(label),
            "replaying label {label} must land on its leaf"
        );
    }
}

#[test]
fn label_maps_are_a_bijection() {
    let tree = TaxonomyTree::build("Aves", &aves_adjacency(), true).unwrap();
    let index = TaxonomyIndex::build(&tree, &aves_leaf_names()).unwrap();

    let mut seen = vec![false; index.n_leaves()];
    for name in aves_leaf_names() {
        let label = index.label_of_name(&name).unwrap();
        assert!(!seen[label], "label {label} assigned twice");
        seen[label] = true;

        let node = index.leaf_node(label).unwrap();
        assert_eq!(index.label_of_node(node), Some(label));
    }
    assert!(seen.into_iter().all(|s| s));
}

#[test]
fn single_child_parent_is_elided() {
    // A's only child is B: no node named A survives, B takes its place.
    let adj = adjacency(&[("A", &["B"]), ("B", &["left", "right"])]);
    let tree = TaxonomyTree::build("A", &adj, true).unwrap();

    assert_eq!(tree.name(tree.root()), "B");
    for node in 0..tree.n_nodes() as u32 {
        assert_ne!(tree.name(node), "A");
    }
}

#[rstest]
#[case::collapsed(true)]
#[case::uncollapsed(false)]
fn chain_taxonomy_routes_consistently(#[case] collapse: bool) {
    let adj = adjacency(&[
        ("Aves", &["Passeriformes"]),
        ("Passeriformes", &["Paridae"]),
        ("Paridae", &["Parusmajor", "Parusater"]),
    ]);
    let names: Vec<String> = vec!["Parusmajor".into(), "Parusater".into()];

    let tree = TaxonomyTree::build("Aves", &adj, collapse).unwrap();
    let index = TaxonomyIndex::build(&tree, &names).unwrap();

    let expected_depth = if collapse { 1 } else { 3 };
    assert_eq!(tree.depth(), expected_depth);

    for label in 0..index.n_leaves() {
        let mut node = tree.root();
        for step in index.path(label).unwrap() {
            node = tree.children(node)[step.child];
        }
        assert_eq!(index.label_of_node(node), Some(label));
    }
}

#[test]
fn cyclic_adjacency_fails_construction() {
    let adj = adjacency(&[("a", &["b", "x"]), ("b", &["c"]), ("c", &["a"])]);
    assert!(matches!(
        TaxonomyTree::build("a", &adj, false),
        Err(TaxonomyError::Malformed { .. })
    ));
}

#[test]
fn leaf_list_mismatch_fails_indexing() {
    let tree = TaxonomyTree::build("Aves", &aves_adjacency(), true).unwrap();

    // Missing one tree leaf.
    let short: Vec<String> = aves_leaf_names().into_iter().take(3).collect();
    assert!(matches!(
        TaxonomyIndex::build(&tree, &short),
        Err(TaxonomyError::Inconsistent { .. })
    ));

    // Listing a name the tree does not have.
    let mut extra = aves_leaf_names();
    extra.push("Sittaeuropaea".into());
    assert!(matches!(
        TaxonomyIndex::build(&tree, &extra),
        Err(TaxonomyError::Inconsistent { .. })
    ));
}

#[test]
fn adjacency_loads_from_json() {
    let json = r#"{
        "Aves": ["Paridae", "Corvidae"],
        "Paridae": ["Parus major", "Parus ater"],
        "Corvidae": ["Corvus corax", "Pica pica"]
    }"#;
    let adj = io::adjacency_from_json(json).unwrap();
    let tree = TaxonomyTree::build("Aves", &adj, true).unwrap();

    let names = io::leaf_names_from_lines("Parus major\nParus ater\nCorvus corax\nPica pica\n");
    let index = TaxonomyIndex::build(&tree, &names).unwrap();

    assert_eq!(index.n_leaves(), 4);
    assert_eq!(index.label_of_name("Pica pica"), Some(3));
}

// ============================================================================
// Property tests
// ============================================================================

#[derive(Debug, Clone)]
enum Shape {
    Leaf,
    Internal(Vec<Shape>),
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = Just(Shape::Leaf);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 2..4).prop_map(Shape::Internal)
    })
}

/// Flatten a generated shape into (adjacency, leaf names, root name),
/// assigning unique ids in depth-first order.
fn flatten(shape: &Shape) -> (HashMap<String, Vec<String>>, Vec<String>, String) {
    fn walk(
        shape: &Shape,
        adj: &mut HashMap<String, Vec<String>>,
        leaves: &mut Vec<String>,
        counter: &mut usize,
    ) -> String {
        let name = format!("n{counter}");
        *counter += 1;
        match shape {
            Shape::Leaf => leaves.push(name.clone()),
            Shape::Internal(kids) => {
                let kid_names = kids
                    .iter()
                    .map(|kid| walk(kid, adj, leaves, counter))
                    .collect();
                adj.insert(name.clone(), kid_names);
            }
        }
        name
    }

    let mut adj = HashMap::new();
    let mut leaves = Vec::new();
    let mut counter = 0;
    let root = walk(shape, &mut adj, &mut leaves, &mut counter);
    (adj, leaves, root)
}

proptest! {
    #[test]
    fn generated_taxonomies_route_every_leaf(shape in shape_strategy()) {
        let (adj, leaf_names, root) = flatten(&shape);
        let tree = TaxonomyTree::build(&root, &adj, true).unwrap();
        let index = TaxonomyIndex::build(&tree, &leaf_names).unwrap();

        prop_assert_eq!(index.n_leaves(), leaf_names.len());

        for label in 0..index.n_leaves() {
            let mut node = tree.root();
            for step in index.path(label).unwrap() {
                prop_assert_eq!(step.node, node);
                node = tree.children(node)[step.child];
            }
            prop_assert_eq!(index.label_of_node(node), Some(label));
            prop_assert_eq!(index.leaf_node(label), Some(node));
        }
    }
}
