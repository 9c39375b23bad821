//! Label indexing and routing tables derived from a [`TaxonomyTree`].

use std::collections::HashMap;

use super::{sanitize, NodeId, TaxonomyError, TaxonomyTree};

/// One decision on a root-to-leaf path: at `node`, the correct child is
/// `child` (an index into that node's ordered children, and therefore into
/// its classifier's softmax outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub node: NodeId,
    pub child: usize,
}

/// Lookup tables binding a [`TaxonomyTree`] to a dataset's label space.
///
/// The leaf-name list supplies the dense label indices: line `N` of the list
/// is label `N`. The index precomputes, for every label, the ordered
/// root-to-leaf sequence of [`PathStep`] decisions that training must
/// reproduce and that inference routing follows.
///
/// Construction enforces a closed world: the tree's leaf set and the
/// leaf-name list must contain exactly the same names, in either direction.
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    /// Sanitized leaf name → dense label index.
    leaf_to_label: HashMap<String, usize>,
    /// Dense label index → leaf node id.
    label_to_leaf: Vec<NodeId>,
    /// Node id → label index (leaves only).
    node_label: Vec<Option<usize>>,
    /// Dense label index → root-first decision path.
    paths: Vec<Vec<PathStep>>,
}

impl TaxonomyIndex {
    /// Build the index from a tree and an ordered leaf-name list.
    ///
    /// Names are sanitized the same way tree ids are. Fails with
    /// [`TaxonomyError::Inconsistent`] if the list contains duplicates, if a
    /// tree leaf is missing from the list, or if a listed name is not a leaf
    /// of the tree.
    pub fn build(tree: &TaxonomyTree, leaf_names: &[String]) -> Result<Self, TaxonomyError> {
        let mut leaf_to_label = HashMap::with_capacity(leaf_names.len());
        for (label, raw) in leaf_names.iter().enumerate() {
            let name = sanitize(raw);
            if leaf_to_label.insert(name.clone(), label).is_some() {
                return Err(TaxonomyError::Inconsistent {
                    reason: format!("leaf name `{name}` appears more than once in the list"),
                });
            }
        }

        let mut index = Self {
            leaf_to_label,
            label_to_leaf: vec![NodeId::MAX; leaf_names.len()],
            node_label: vec![None; tree.n_nodes()],
            paths: vec![Vec::new(); leaf_names.len()],
        };

        let mut prefix = Vec::with_capacity(tree.depth());
        index.walk(tree, tree.root(), &mut prefix)?;

        // Every listed name must have been reached as a tree leaf.
        for (name, &label) in &index.leaf_to_label {
            if index.label_to_leaf[label] == NodeId::MAX {
                return Err(TaxonomyError::Inconsistent {
                    reason: format!("listed name `{name}` is not a leaf of the tree"),
                });
            }
        }

        Ok(index)
    }

    /// Number of leaves (= number of labels).
    pub fn n_leaves(&self) -> usize {
        self.label_to_leaf.len()
    }

    /// Dense label index for a (raw or sanitized) leaf name.
    pub fn label_of_name(&self, name: &str) -> Option<usize> {
        self.leaf_to_label.get(&sanitize(name)).copied()
    }

    /// Leaf node id for a label index.
    pub fn leaf_node(&self, label: usize) -> Option<NodeId> {
        self.label_to_leaf.get(label).copied()
    }

    /// Label index for a node id, if that node is an indexed leaf.
    pub fn label_of_node(&self, node: NodeId) -> Option<usize> {
        self.node_label.get(node as usize).copied().flatten()
    }

    /// Root-first decision path for a label index.
    pub fn path(&self, label: usize) -> Option<&[PathStep]> {
        self.paths.get(label).map(Vec::as_slice)
    }

    fn walk(
        &mut self,
        tree: &TaxonomyTree,
        node: NodeId,
        prefix: &mut Vec<PathStep>,
    ) -> Result<(), TaxonomyError> {
        if tree.is_leaf(node) {
            let name = tree.name(node);
            let label = self.leaf_to_label.get(name).copied().ok_or_else(|| {
                TaxonomyError::Inconsistent {
                    reason: format!("tree leaf `{name}` is missing from the leaf-name list"),
                }
            })?;
            self.label_to_leaf[label] = node;
            self.node_label[node as usize] = Some(label);
            self.paths[label] = prefix.clone();
            return Ok(());
        }

        for (child_idx, &child) in tree.children(node).iter().enumerate() {
            prefix.push(PathStep {
                node,
                child: child_idx,
            });
            self.walk(tree, child, prefix)?;
            prefix.pop();
        }
        Ok(())
    }
}
