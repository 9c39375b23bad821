//! Gradient descent with momentum over the branch parameter set.

use serde::{Deserialize, Serialize};

use crate::branch::TaxonomicBranch;
use crate::layers::ParamTensorMut;

/// Parameters for [`GradientDescentMomentum`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumParams {
    pub learning_rate: f32,
    pub momentum: f32,
    /// L2 weight decay, applied to every parameter tensor.
    pub weight_decay: f32,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.9,
            weight_decay: 0.0005,
        }
    }
}

/// Stochastic gradient descent with momentum and weight decay.
///
/// For each parameter `w` with accumulated gradient `g`:
///
/// ```text
/// v ← momentum·v − lr·(g + weight_decay·w)
/// w ← w + v
/// ```
///
/// Velocity buffers are keyed by the branch's deterministic parameter visit
/// order and allocated lazily on the first step. The optimizer runs strictly
/// between minibatches; it is the only writer of weights besides the branch
/// itself.
#[derive(Debug, Clone)]
pub struct GradientDescentMomentum {
    params: MomentumParams,
    velocities: Vec<Vec<f32>>,
}

impl GradientDescentMomentum {
    pub fn new(params: MomentumParams) -> Self {
        Self {
            params,
            velocities: Vec::new(),
        }
    }

    pub fn params(&self) -> &MomentumParams {
        &self.params
    }

    /// Apply one update to every parameter tensor in the branch.
    pub fn step(&mut self, branch: &mut TaxonomicBranch) {
        let params = self.params.clone();
        let velocities = &mut self.velocities;
        let mut slot = 0usize;

        branch.visit_params_mut(|_node, tensor| {
            if velocities.len() == slot {
                velocities.push(Vec::new());
            }
            let velocity = &mut velocities[slot];
            match tensor {
                ParamTensorMut::Weights { value, grad } => {
                    let n = value.len();
                    apply(&params, velocity, n, value.iter_mut(), grad.iter());
                }
                ParamTensorMut::Biases { value, grad } => {
                    let n = value.len();
                    apply(&params, velocity, n, value.iter_mut(), grad.iter());
                }
            }
            slot += 1;
        });
    }
}

fn apply<'a, 'b>(
    params: &MomentumParams,
    velocity: &mut Vec<f32>,
    n: usize,
    values: impl Iterator<Item = &'a mut f32>,
    grads: impl Iterator<Item = &'b f32>,
) {
    if velocity.len() != n {
        velocity.resize(n, 0.0);
    }
    for ((w, &g), v) in values.zip(grads).zip(velocity.iter_mut()) {
        *v = params.momentum * *v - params.learning_rate * (g + params.weight_decay * *w);
        *w += *v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_moves_against_gradient() {
        let params = MomentumParams {
            learning_rate: 0.1,
            momentum: 0.0,
            weight_decay: 0.0,
        };
        let mut velocity = Vec::new();
        let mut weights = [1.0f32, -1.0];
        let grads = [2.0f32, -2.0];

        apply(
            &params,
            &mut velocity,
            2,
            weights.iter_mut(),
            grads.iter(),
        );

        assert!((weights[0] - 0.8).abs() < 1e-6);
        assert!((weights[1] - (-0.8)).abs() < 1e-6);
    }

    #[test]
    fn momentum_carries_velocity_between_steps() {
        let params = MomentumParams {
            learning_rate: 0.1,
            momentum: 0.5,
            weight_decay: 0.0,
        };
        let mut velocity = Vec::new();
        let mut weight = [0.0f32];
        let grad = [1.0f32];

        apply(&params, &mut velocity, 1, weight.iter_mut(), grad.iter());
        // v = -0.1, w = -0.1
        apply(&params, &mut velocity, 1, weight.iter_mut(), grad.iter());
        // v = 0.5·(-0.1) − 0.1 = -0.15, w = -0.25
        assert!((weight[0] - (-0.25)).abs() < 1e-6);
    }

    #[test]
    fn weight_decay_shrinks_weights_without_gradient() {
        let params = MomentumParams {
            learning_rate: 0.1,
            momentum: 0.0,
            weight_decay: 0.5,
        };
        let mut velocity = Vec::new();
        let mut weight = [1.0f32];
        let grad = [0.0f32];

        apply(&params, &mut velocity, 1, weight.iter_mut(), grad.iter());
        assert!(weight[0] < 1.0);
    }
}
