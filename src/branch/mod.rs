//! Routed classification over a class taxonomy.
//!
//! [`TaxonomicBranch`] owns one [`NodeClassifier`] per internal node of the
//! taxonomy. Training an example never traverses by prediction: it replays
//! the example's precomputed root-to-leaf path, runs each on-path node's
//! classifier against a one-hot target at the recorded child index, and
//! backpropagates through that node's classifier only. Off-path classifiers
//! are untouched, and a node shared by several examples accumulates the sum
//! of their gradient contributions within the minibatch.
//!
//! Inference walks the tree greedily from the root, taking each node's
//! arg-max child until it reaches a leaf.

mod classifier;

pub use classifier::NodeClassifier;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::layers::{CrossEntropy, ParamTensor, ParamTensorMut};
use crate::taxonomy::{NodeId, TaxonomyIndex, TaxonomyTree};

// ============================================================================
// Params and errors
// ============================================================================

/// Construction parameters for [`TaxonomicBranch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchParams {
    /// Standard deviation of the Gaussian weight initialization.
    pub init_scale: f32,
    /// Constant initial value for every classifier bias.
    pub bias_init: f32,
    /// Seed for the weight-initialization RNG.
    pub seed: u64,
}

impl Default for BranchParams {
    fn default() -> Self {
        Self {
            init_scale: 0.01,
            bias_init: -0.7,
            seed: 0,
        }
    }
}

/// Errors raised while routing examples through the taxonomy.
///
/// Both variants indicate a broken pipeline-to-index contract and are fatal:
/// continuing would corrupt gradient accumulation or produce meaningless
/// predictions.
#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    /// A minibatch example's label index has no corresponding leaf.
    #[error("unknown label index {label}: no corresponding leaf")]
    UnknownLabel { label: usize },

    /// An inference traversal could not reach an indexed leaf.
    #[error("routing failed at node `{node}`: {reason}")]
    Routing { node: String, reason: String },
}

// ============================================================================
// Prediction records
// ============================================================================

/// One greedy inference step: the node stepped *into* and the cumulative
/// path probability after taking that step.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionStep {
    pub node: String,
    pub probability: f32,
}

/// The outcome of routing one example root-to-leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPrediction {
    /// Dense label index of the predicted leaf.
    pub label: usize,
    /// Sanitized name of the predicted leaf.
    pub leaf: String,
    /// Product of the per-step arg-max probabilities.
    pub probability: f32,
    /// The full decision path, root side first.
    pub steps: Vec<DecisionStep>,
}

/// Full softmax output of one visited node during a traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDistribution {
    /// Name of the node whose classifier produced the distribution.
    pub node: String,
    /// Probability per child, in child order.
    pub probabilities: Array1<f32>,
}

// ============================================================================
// TaxonomicBranch
// ============================================================================

/// The per-node classifier ensemble and its routing logic.
///
/// Input features arrive as an `[n_in, batch]` matrix, one column per
/// example. The branch owns the tree, the index, and every node classifier
/// for the duration of a run; the only other writer is the optimizer, via
/// [`visit_params_mut`](Self::visit_params_mut), strictly between
/// minibatches.
#[derive(Debug, Clone)]
pub struct TaxonomicBranch {
    tree: TaxonomyTree,
    index: TaxonomyIndex,
    /// One classifier per internal node, indexed by [`NodeId`]; `None` at
    /// leaf positions.
    classifiers: Vec<Option<NodeClassifier>>,
    cost: CrossEntropy,
    /// Batch input-gradient buffer, `[n_in, batch]`, rebuilt every fprop.
    deltas: Array2<f32>,
    n_in: usize,
}

impl TaxonomicBranch {
    /// Build one classifier per internal node.
    ///
    /// Each classifier's output width is that node's child count. The tree
    /// and index must come from the same construction; the index's paths
    /// reference tree node ids directly.
    pub fn new(
        tree: TaxonomyTree,
        index: TaxonomyIndex,
        n_in: usize,
        params: &BranchParams,
    ) -> Self {
        assert!(n_in > 0, "n_in must be positive");

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut classifiers = Vec::with_capacity(tree.n_nodes());
        for node in 0..tree.n_nodes() as NodeId {
            let n_children = tree.children(node).len();
            classifiers.push(if n_children == 0 {
                None
            } else {
                Some(NodeClassifier::new(
                    n_in,
                    n_children,
                    params.init_scale,
                    params.bias_init,
                    &mut rng,
                ))
            });
        }

        Self {
            tree,
            index,
            classifiers,
            cost: CrossEntropy,
            deltas: Array2::zeros((n_in, 0)),
            n_in,
        }
    }

    pub fn tree(&self) -> &TaxonomyTree {
        &self.tree
    }

    pub fn index(&self) -> &TaxonomyIndex {
        &self.index
    }

    pub fn n_in(&self) -> usize {
        self.n_in
    }

    /// The classifier at a node, if that node is internal.
    pub fn classifier(&self, node: NodeId) -> Option<&NodeClassifier> {
        self.classifiers.get(node as usize).and_then(Option::as_ref)
    }

    // ========================================================================
    // Training
    // ========================================================================

    /// Training forward/backward pass over one minibatch.
    ///
    /// `inputs` is `[n_in, batch]`, one column per example; `labels[i]` is
    /// example `i`'s true leaf-label index. For every example, each node on
    /// its root-to-leaf path is forward-propagated, costed against a one-hot
    /// target at the path's child index, and backward-propagated; the input
    /// gradient lands in column `i` of [`deltas`](Self::deltas) and the
    /// parameter gradients accumulate on the node classifiers.
    ///
    /// Per-example contributions are not normalized by path length.
    ///
    /// Returns the scalar total cost over the batch. An empty batch is a
    /// no-op returning zero.
    pub fn fprop(
        &mut self,
        inputs: ArrayView2<f32>,
        labels: &[usize],
    ) -> Result<f32, BranchError> {
        assert_eq!(inputs.nrows(), self.n_in, "input feature dimension mismatch");
        assert_eq!(inputs.ncols(), labels.len(), "one label per input column");

        for clf in self.classifiers.iter_mut().flatten() {
            clf.zero_grads();
        }
        self.deltas = Array2::zeros((self.n_in, labels.len()));

        let mut total_cost = 0.0f32;
        for (i, &label) in labels.iter().enumerate() {
            let path = self
                .index
                .path(label)
                .ok_or(BranchError::UnknownLabel { label })?;
            let input = inputs.column(i).to_owned();

            for step in path {
                let clf = self.classifiers[step.node as usize]
                    .as_mut()
                    .expect("path steps reference internal nodes with classifiers");

                let mut target = Array1::zeros(clf.n_out());
                target[step.child] = 1.0;

                let probs = clf.fprop(&input);
                total_cost += self.cost.value(&probs, &target);
                let delta = self.cost.delta(&probs, &target);
                let dx = clf.bprop(&delta);

                let mut column = self.deltas.column_mut(i);
                column += &dx;
            }
        }

        Ok(total_cost)
    }

    /// Batch input-gradient buffer from the most recent [`fprop`](Self::fprop),
    /// `[n_in, batch]`, for backpropagation into upstream layers.
    pub fn deltas(&self) -> ArrayView2<f32> {
        self.deltas.view()
    }

    // ========================================================================
    // Inference
    // ========================================================================

    /// Greedy inference over a batch, parallelized across examples.
    ///
    /// Each example walks from the root, taking the arg-max child at every
    /// node until a leaf is reached, and records the decision path with the
    /// running product of per-step probabilities. Greedy descent never
    /// backtracks, so it is not guaranteed to find the leaf with the highest
    /// total path probability; that would require scoring every root-to-leaf
    /// path.
    pub fn predict(&self, inputs: ArrayView2<f32>) -> Result<Vec<LeafPrediction>, BranchError> {
        assert_eq!(inputs.nrows(), self.n_in, "input feature dimension mismatch");

        (0..inputs.ncols())
            .into_par_iter()
            .map(|i| self.predict_one(inputs.column(i)))
            .collect()
    }

    /// Like [`predict`](Self::predict), but returns every visited node's
    /// full softmax output instead of only the chosen child.
    pub fn predict_distributions(
        &self,
        inputs: ArrayView2<f32>,
    ) -> Result<Vec<Vec<NodeDistribution>>, BranchError> {
        assert_eq!(inputs.nrows(), self.n_in, "input feature dimension mismatch");

        (0..inputs.ncols())
            .into_par_iter()
            .map(|i| {
                let mut distributions = Vec::new();
                self.traverse(inputs.column(i), Some(&mut distributions))?;
                Ok(distributions)
            })
            .collect()
    }

    fn predict_one(&self, input: ArrayView1<f32>) -> Result<LeafPrediction, BranchError> {
        self.traverse(input, None)
    }

    /// Core greedy traversal. Bounded by tree depth: the tree is finite and
    /// acyclic, so a walk that outlives the depth bound means corruption and
    /// fails instead of spinning.
    fn traverse(
        &self,
        input: ArrayView1<f32>,
        mut distributions: Option<&mut Vec<NodeDistribution>>,
    ) -> Result<LeafPrediction, BranchError> {
        let input = input.to_owned();
        let mut node = self.tree.root();
        let mut probability = 1.0f32;
        let mut steps = Vec::new();
        let mut hops = 0usize;

        while !self.tree.is_leaf(node) {
            if hops >= self.tree.depth() {
                return Err(BranchError::Routing {
                    node: self.tree.name(node).to_string(),
                    reason: format!("no leaf within tree depth {}", self.tree.depth()),
                });
            }

            let clf = self.classifiers[node as usize]
                .as_ref()
                .expect("internal nodes carry classifiers");
            let probs = clf.fprop_inference(&input);
            if let Some(out) = distributions.as_mut() {
                out.push(NodeDistribution {
                    node: self.tree.name(node).to_string(),
                    probabilities: probs.clone(),
                });
            }

            let (child_idx, p) = argmax(&probs);
            probability *= p;
            node = self.tree.children(node)[child_idx];
            steps.push(DecisionStep {
                node: self.tree.name(node).to_string(),
                probability,
            });
            hops += 1;
        }

        let label = self
            .index
            .label_of_node(node)
            .ok_or_else(|| BranchError::Routing {
                node: self.tree.name(node).to_string(),
                reason: "traversal ended on an unindexed leaf".to_string(),
            })?;

        Ok(LeafPrediction {
            label,
            leaf: self.tree.name(node).to_string(),
            probability,
            steps,
        })
    }

    // ========================================================================
    // Optimizer seam
    // ========================================================================

    /// Visit every parameter tensor read-only, in ascending node-id order.
    pub fn visit_params(&self, mut f: impl FnMut(NodeId, ParamTensor<'_>)) {
        for (id, clf) in self.classifiers.iter().enumerate() {
            if let Some(clf) = clf {
                clf.visit_params(&mut |tensor| f(id as NodeId, tensor));
            }
        }
    }

    /// Visit every parameter tensor mutably, in ascending node-id order.
    ///
    /// The visit order is deterministic, so an optimizer can keep per-tensor
    /// state (momentum velocities) in a flat list keyed by visit position.
    pub fn visit_params_mut(&mut self, mut f: impl FnMut(NodeId, ParamTensorMut<'_>)) {
        for (id, clf) in self.classifiers.iter_mut().enumerate() {
            if let Some(clf) = clf {
                clf.visit_params_mut(&mut |tensor| f(id as NodeId, tensor));
            }
        }
    }
}

fn argmax(probs: &Array1<f32>) -> (usize, f32) {
    let mut best = 0usize;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] {
            best = i;
        }
    }
    (best, probs[best])
}
