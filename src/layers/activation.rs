//! Softmax activation stage.

use ndarray::Array1;

/// Softmax over a node classifier's outputs.
///
/// Forward is the usual max-subtracted exponential normalization. Backward
/// passes the error through unchanged: the paired [`CrossEntropy`] cost
/// already yields the fused gradient `p - t` at the pre-activation, so there
/// is nothing left to apply here.
///
/// [`CrossEntropy`]: super::CrossEntropy
#[derive(Debug, Clone, Copy, Default)]
pub struct Softmax;

impl Softmax {
    pub fn fprop(&self, input: &Array1<f32>) -> Array1<f32> {
        let max = input.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let mut exps = input.mapv(|v| (v - max).exp());
        let sum = exps.sum();
        exps /= sum;
        exps
    }

    pub fn bprop(&self, error: &Array1<f32>) -> Array1<f32> {
        error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn outputs_normalize_to_one() {
        let probs = Softmax.fprop(&array![1.0, 2.0, 3.0]);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn largest_input_gets_largest_probability() {
        let probs = Softmax.fprop(&array![0.1, 3.0, -1.0]);
        assert!(probs[1] > probs[0] && probs[1] > probs[2]);
    }

    #[test]
    fn large_inputs_do_not_overflow() {
        let probs = Softmax.fprop(&array![1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }
}
