//! Gradient-accumulating linear and bias stages.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Fully-connected stage: `y = W·x`.
///
/// The weight gradient accumulates across invocations within a minibatch;
/// see the module docs for the zero-then-accumulate discipline.
#[derive(Debug, Clone)]
pub struct Linear {
    /// Weight matrix, shape `[n_out, n_in]`.
    weights: Array2<f32>,
    /// Accumulated weight gradient, same shape as `weights`.
    grad: Array2<f32>,
    /// Input cached by the most recent training forward pass.
    input: Array1<f32>,
}

impl Linear {
    /// Create a linear stage with Gaussian-initialized weights.
    pub fn new(n_in: usize, n_out: usize, scale: f32, rng: &mut impl Rng) -> Self {
        let weights = Array2::from_shape_fn((n_out, n_in), |_| {
            let z: f32 = rng.sample(StandardNormal);
            z * scale
        });
        Self {
            weights,
            grad: Array2::zeros((n_out, n_in)),
            input: Array1::zeros(n_in),
        }
    }

    /// Training forward pass: caches the input for the backward pass.
    pub fn fprop(&mut self, input: &Array1<f32>) -> Array1<f32> {
        self.input.assign(input);
        self.weights.dot(input)
    }

    /// Inference forward pass: no caching, usable from shared references.
    pub fn fprop_inference(&self, input: &Array1<f32>) -> Array1<f32> {
        self.weights.dot(input)
    }

    /// Backward pass.
    ///
    /// Accumulates `error ⊗ input` into the weight gradient and returns the
    /// input gradient `Wᵀ·error`.
    pub fn bprop(&mut self, error: &Array1<f32>) -> Array1<f32> {
        for (mut grad_row, &e) in self.grad.outer_iter_mut().zip(error.iter()) {
            grad_row.scaled_add(e, &self.input);
        }
        self.weights.t().dot(error)
    }

    /// Reset the gradient accumulator. Called once per minibatch.
    pub fn zero_grads(&mut self) {
        self.grad.fill(0.0);
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn grad(&self) -> &Array2<f32> {
        &self.grad
    }

    pub(crate) fn params_mut(&mut self) -> (&mut Array2<f32>, &Array2<f32>) {
        (&mut self.weights, &self.grad)
    }
}

/// Per-output bias stage: `y = x + b`.
///
/// Like [`Linear`], the bias gradient accumulates across invocations.
#[derive(Debug, Clone)]
pub struct Bias {
    bias: Array1<f32>,
    grad: Array1<f32>,
}

impl Bias {
    /// Create a bias stage with every component set to `init`.
    pub fn new(n_out: usize, init: f32) -> Self {
        Self {
            bias: Array1::from_elem(n_out, init),
            grad: Array1::zeros(n_out),
        }
    }

    pub fn fprop(&self, input: &Array1<f32>) -> Array1<f32> {
        input + &self.bias
    }

    /// Backward pass: accumulates the error into the bias gradient and
    /// passes it through unchanged.
    pub fn bprop(&mut self, error: &Array1<f32>) -> Array1<f32> {
        self.grad += error;
        error.clone()
    }

    pub fn zero_grads(&mut self) {
        self.grad.fill(0.0);
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    pub fn grad(&self) -> &Array1<f32> {
        &self.grad
    }

    pub(crate) fn params_mut(&mut self) -> (&mut Array1<f32>, &Array1<f32>) {
        (&mut self.bias, &self.grad)
    }
}
