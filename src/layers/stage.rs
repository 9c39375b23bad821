//! Tagged pipeline stage with a uniform forward/backward capability.

use ndarray::{Array1, Array2};

use super::{Bias, Linear, Softmax};

/// One stage of a node classifier's pipeline.
///
/// Enum dispatch keeps the stage set closed and the pipeline a plain
/// `Vec<Stage>` — no trait objects, no shared mutable base.
#[derive(Debug, Clone)]
pub enum Stage {
    Linear(Linear),
    Bias(Bias),
    Softmax(Softmax),
}

impl Stage {
    /// Training forward pass. Parameterized stages cache what their
    /// backward pass needs.
    pub fn fprop(&mut self, input: &Array1<f32>) -> Array1<f32> {
        match self {
            Stage::Linear(linear) => linear.fprop(input),
            Stage::Bias(bias) => bias.fprop(input),
            Stage::Softmax(softmax) => softmax.fprop(input),
        }
    }

    /// Inference forward pass: no caching, usable from shared references.
    pub fn fprop_inference(&self, input: &Array1<f32>) -> Array1<f32> {
        match self {
            Stage::Linear(linear) => linear.fprop_inference(input),
            Stage::Bias(bias) => bias.fprop(input),
            Stage::Softmax(softmax) => softmax.fprop(input),
        }
    }

    /// Backward pass: accumulates parameter gradients and returns the error
    /// with respect to this stage's input.
    pub fn bprop(&mut self, error: &Array1<f32>) -> Array1<f32> {
        match self {
            Stage::Linear(linear) => linear.bprop(error),
            Stage::Bias(bias) => bias.bprop(error),
            Stage::Softmax(softmax) => softmax.bprop(error),
        }
    }

    /// Reset any gradient accumulator. Called once per minibatch.
    pub fn zero_grads(&mut self) {
        match self {
            Stage::Linear(linear) => linear.zero_grads(),
            Stage::Bias(bias) => bias.zero_grads(),
            Stage::Softmax(_) => {}
        }
    }

    /// Visit this stage's parameter tensor, if it has one.
    pub fn visit_params(&self, f: &mut dyn FnMut(ParamTensor<'_>)) {
        match self {
            Stage::Linear(linear) => f(ParamTensor::Weights {
                value: linear.weights(),
                grad: linear.grad(),
            }),
            Stage::Bias(bias) => f(ParamTensor::Biases {
                value: bias.bias(),
                grad: bias.grad(),
            }),
            Stage::Softmax(_) => {}
        }
    }

    /// Visit this stage's parameter tensor mutably, if it has one.
    ///
    /// This is the optimizer seam: the callback receives the live weight
    /// tensor alongside its accumulated gradient and updates it in place.
    pub fn visit_params_mut(&mut self, f: &mut dyn FnMut(ParamTensorMut<'_>)) {
        match self {
            Stage::Linear(linear) => {
                let (value, grad) = linear.params_mut();
                f(ParamTensorMut::Weights { value, grad });
            }
            Stage::Bias(bias) => {
                let (value, grad) = bias.params_mut();
                f(ParamTensorMut::Biases { value, grad });
            }
            Stage::Softmax(_) => {}
        }
    }
}

/// Read-only view of one parameter tensor and its gradient accumulator.
#[derive(Debug)]
pub enum ParamTensor<'a> {
    Weights {
        value: &'a Array2<f32>,
        grad: &'a Array2<f32>,
    },
    Biases {
        value: &'a Array1<f32>,
        grad: &'a Array1<f32>,
    },
}

/// Mutable view of one parameter tensor and its gradient accumulator.
#[derive(Debug)]
pub enum ParamTensorMut<'a> {
    Weights {
        value: &'a mut Array2<f32>,
        grad: &'a Array2<f32>,
    },
    Biases {
        value: &'a mut Array1<f32>,
        grad: &'a Array1<f32>,
    },
}
