//! Per-node classifier: linear → bias → softmax.

use ndarray::Array1;
use rand::Rng;

use crate::layers::{Bias, Linear, ParamTensor, ParamTensorMut, Softmax, Stage};

/// The small classifier sitting at one internal taxonomy node.
///
/// Its output width equals the node's number of children: softmax output `i`
/// is the probability that the right continuation is child `i`. The pipeline
/// is a plain stage sequence; forward folds through it front to back,
/// backward in reverse.
#[derive(Debug, Clone)]
pub struct NodeClassifier {
    stages: Vec<Stage>,
    n_out: usize,
}

impl NodeClassifier {
    /// Build the standard pipeline with Gaussian weights and constant bias.
    pub fn new(
        n_in: usize,
        n_out: usize,
        init_scale: f32,
        bias_init: f32,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            stages: vec![
                Stage::Linear(Linear::new(n_in, n_out, init_scale, rng)),
                Stage::Bias(Bias::new(n_out, bias_init)),
                Stage::Softmax(Softmax),
            ],
            n_out,
        }
    }

    /// Output width (= the node's number of children).
    pub fn n_out(&self) -> usize {
        self.n_out
    }

    /// Training forward pass through every stage.
    pub fn fprop(&mut self, input: &Array1<f32>) -> Array1<f32> {
        let mut activation = input.clone();
        for stage in &mut self.stages {
            activation = stage.fprop(&activation);
        }
        activation
    }

    /// Inference forward pass; takes `&self` so traversals can fan out
    /// across examples without touching classifier state.
    pub fn fprop_inference(&self, input: &Array1<f32>) -> Array1<f32> {
        let mut activation = input.clone();
        for stage in &self.stages {
            activation = stage.fprop_inference(&activation);
        }
        activation
    }

    /// Backward pass through the stages in reverse, accumulating parameter
    /// gradients; returns the gradient with respect to the classifier input.
    pub fn bprop(&mut self, error: &Array1<f32>) -> Array1<f32> {
        let mut delta = error.clone();
        for stage in self.stages.iter_mut().rev() {
            delta = stage.bprop(&delta);
        }
        delta
    }

    /// Zero every stage's gradient accumulator.
    pub fn zero_grads(&mut self) {
        for stage in &mut self.stages {
            stage.zero_grads();
        }
    }

    /// Visit parameter tensors in pipeline order.
    pub fn visit_params(&self, f: &mut dyn FnMut(ParamTensor<'_>)) {
        for stage in &self.stages {
            stage.visit_params(f);
        }
    }

    /// Visit parameter tensors mutably, in pipeline order.
    pub fn visit_params_mut(&mut self, f: &mut dyn FnMut(ParamTensorMut<'_>)) {
        for stage in &mut self.stages {
            stage.visit_params_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn classifier() -> NodeClassifier {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        NodeClassifier::new(3, 2, 0.1, 0.0, &mut rng)
    }

    #[test]
    fn output_is_a_distribution_over_children() {
        let mut clf = classifier();
        let probs = clf.fprop(&array![1.0, -0.5, 0.25]);
        assert_eq!(probs.len(), 2);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bprop_returns_input_sized_gradient() {
        let mut clf = classifier();
        let probs = clf.fprop(&array![1.0, -0.5, 0.25]);
        let delta = &probs - &array![1.0, 0.0];
        let dx = clf.bprop(&delta);
        assert_eq!(dx.len(), 3);
    }

    #[test]
    fn zero_grads_clears_every_accumulator() {
        let mut clf = classifier();
        let probs = clf.fprop(&array![1.0, -0.5, 0.25]);
        let delta = &probs - &array![0.0, 1.0];
        clf.bprop(&delta);
        clf.zero_grads();

        clf.visit_params(&mut |tensor| match tensor {
            ParamTensor::Weights { grad, .. } => {
                assert_eq!(*grad, Array2::<f32>::zeros(grad.raw_dim()));
            }
            ParamTensor::Biases { grad, .. } => {
                assert!(grad.iter().all(|&g| g == 0.0));
            }
        });
    }

    #[test]
    fn visits_linear_then_bias() {
        let mut clf = classifier();
        let mut kinds = Vec::new();
        clf.visit_params_mut(&mut |tensor| {
            kinds.push(match tensor {
                ParamTensorMut::Weights { .. } => "weights",
                ParamTensorMut::Biases { .. } => "biases",
            });
        });
        assert_eq!(kinds, vec!["weights", "biases"]);
    }
}
