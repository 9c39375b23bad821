//! Classifier building blocks: affine stages, softmax, and the node cost.
//!
//! A per-node classifier is a short pipeline of [`Stage`]s (linear → bias →
//! softmax) paired with a [`CrossEntropy`] cost. The stages are dispatched
//! through an enum rather than trait objects, so the whole pipeline stays
//! inspectable and `Send`.
//!
//! # Gradient accumulation
//!
//! The parameterized stages accumulate into their gradient buffers
//! (`grad += contribution`) instead of overwriting them. A node shared by
//! several examples in one minibatch is forward/backward-propagated once per
//! example, and the training signal is the sum of all those contributions.
//! The buffers are zeroed exactly once per minibatch via
//! [`Stage::zero_grads`]; overwriting would drop contributions, and skipping
//! the zero would leak gradients into the next minibatch.

mod activation;
mod affine;
mod cost;
mod stage;

pub use activation::Softmax;
pub use affine::{Bias, Linear};
pub use cost::CrossEntropy;
pub use stage::{ParamTensor, ParamTensorMut, Stage};
