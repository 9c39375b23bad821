//! Node-local softmax cross-entropy cost.

use ndarray::Array1;

/// Probabilities are clamped away from zero before the log.
const LOG_EPS: f32 = 1e-7;

/// Multiclass cross-entropy against a one-hot target.
///
/// Paired with [`Softmax`](super::Softmax) outputs, the gradient at the
/// pre-activation collapses to `p - t`; [`CrossEntropy::delta`] returns that
/// fused form directly, which is why the softmax stage's backward pass is a
/// pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Scalar cost `-Σ tₖ·ln(pₖ)`.
    pub fn value(&self, probs: &Array1<f32>, target: &Array1<f32>) -> f32 {
        -probs
            .iter()
            .zip(target.iter())
            .map(|(&p, &t)| t * p.max(LOG_EPS).ln())
            .sum::<f32>()
    }

    /// Fused gradient `p - t` at the softmax pre-activation.
    pub fn delta(&self, probs: &Array1<f32>, target: &Array1<f32>) -> Array1<f32> {
        probs - target
    }
}
