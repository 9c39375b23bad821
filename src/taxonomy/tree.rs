//! Ordered taxonomy tree built from a parent → children adjacency map.

use std::collections::{HashMap, HashSet};

use super::{sanitize, TaxonomyError};

/// Index of a node within a [`TaxonomyTree`] arena.
pub type NodeId = u32;

/// Ordered tree with flat arena storage.
///
/// Nodes live in parallel arrays indexed by [`NodeId`]. Children keep the
/// adjacency list's order, which later defines each per-node classifier's
/// output layout: child `i` of a node corresponds to softmax output `i` of
/// that node's classifier. A node with no children is a leaf.
///
/// # Collapsing
///
/// With `collapse = true`, an internal node with exactly one child is spliced
/// out and replaced by its descendant, so every surviving decision point
/// discriminates between at least two alternatives.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    /// Sanitized node name, by node id.
    names: Vec<String>,
    /// Ordered children, by node id. Empty = leaf.
    children: Vec<Vec<NodeId>>,
    root: NodeId,
    /// Maximum number of edges on any root-to-leaf path.
    depth: usize,
}

impl TaxonomyTree {
    /// Build a tree from a root id and a parent → ordered-children map.
    ///
    /// Ids are sanitized before use (see the module docs). A node with no
    /// adjacency entry (or an empty child list) is a leaf. Construction
    /// walks depth-first in adjacency order and fails with
    /// [`TaxonomyError::Malformed`] as soon as a node appears on its own
    /// ancestor path, so cyclic input is rejected before it can recurse
    /// unboundedly.
    pub fn build(
        root: &str,
        adjacency: &HashMap<String, Vec<String>>,
        collapse: bool,
    ) -> Result<Self, TaxonomyError> {
        let adj: HashMap<String, Vec<String>> = adjacency
            .iter()
            .map(|(parent, kids)| {
                (sanitize(parent), kids.iter().map(|k| sanitize(k)).collect())
            })
            .collect();

        let mut builder = Builder {
            adj: &adj,
            collapse,
            names: Vec::new(),
            children: Vec::new(),
            on_path: HashSet::new(),
        };
        let root_id = builder.build_node(&sanitize(root))?;

        let mut tree = Self {
            names: builder.names,
            children: builder.children,
            root: root_id,
            depth: 0,
        };
        tree.depth = tree.compute_depth();
        Ok(tree)
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena.
    pub fn n_nodes(&self) -> usize {
        self.names.len()
    }

    /// Sanitized name of a node.
    pub fn name(&self, node: NodeId) -> &str {
        &self.names[node as usize]
    }

    /// Ordered children of a node. Empty for leaves.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.children[node as usize]
    }

    /// Whether a node has no children.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.children[node as usize].is_empty()
    }

    /// Maximum number of edges on any root-to-leaf path.
    ///
    /// This bounds every traversal: a walk that takes more than `depth`
    /// steps without reaching a leaf cannot be following this tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Ids of all leaf nodes, in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.is_leaf(node) {
                out.push(node);
            } else {
                // Reverse so the leftmost child is visited first.
                stack.extend(self.children(node).iter().rev());
            }
        }
        out
    }

    /// Ids of all internal nodes, in depth-first order.
    pub fn internal_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if !self.is_leaf(node) {
                out.push(node);
                stack.extend(self.children(node).iter().rev());
            }
        }
        out
    }

    fn compute_depth(&self) -> usize {
        let mut max = 0usize;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((node, d)) = stack.pop() {
            if self.is_leaf(node) {
                max = max.max(d);
            } else {
                for &child in self.children(node) {
                    stack.push((child, d + 1));
                }
            }
        }
        max
    }
}

struct Builder<'a> {
    adj: &'a HashMap<String, Vec<String>>,
    collapse: bool,
    names: Vec<String>,
    children: Vec<Vec<NodeId>>,
    /// Names on the current ancestor path; re-entering one means a cycle.
    on_path: HashSet<String>,
}

impl Builder<'_> {
    fn build_node(&mut self, name: &str) -> Result<NodeId, TaxonomyError> {
        if !self.on_path.insert(name.to_string()) {
            return Err(TaxonomyError::Malformed {
                node: name.to_string(),
            });
        }

        let id = match self.adj.get(name) {
            None => self.push(name, Vec::new()),
            Some(kids) if kids.is_empty() => self.push(name, Vec::new()),
            Some(kids) if self.collapse && kids.len() == 1 => {
                // Splice the only child into this node's position.
                self.build_node(&kids[0])?
            }
            Some(kids) => {
                let mut child_ids = Vec::with_capacity(kids.len());
                for kid in kids {
                    child_ids.push(self.build_node(kid)?);
                }
                self.push(name, child_ids)
            }
        };

        self.on_path.remove(name);
        Ok(id)
    }

    fn push(&mut self, name: &str, child_ids: Vec<NodeId>) -> NodeId {
        let id = self.names.len() as NodeId;
        self.names.push(name.to_string());
        self.children.push(child_ids);
        id
    }
}
