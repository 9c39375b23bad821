//! Epoch driver for the taxonomic branch.

use ndarray::Array2;

use crate::branch::{BranchError, TaxonomicBranch};

use super::logger::{TrainingLogger, Verbosity};
use super::optimizer::GradientDescentMomentum;

/// One minibatch: an `[n_in, batch]` feature matrix (one column per example)
/// and the matching leaf-label indices.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Array2<f32>,
    pub labels: Vec<usize>,
}

/// Drives the branch through minibatches: forward/backward, then an
/// optimizer step after every batch.
///
/// The branch has its cost built into the final layer, so there is no
/// separate model-level cost here; the trainer just accumulates what the
/// branch reports.
#[derive(Debug)]
pub struct BranchTrainer {
    optimizer: GradientDescentMomentum,
    logger: TrainingLogger,
}

impl BranchTrainer {
    pub fn new(optimizer: GradientDescentMomentum, verbosity: Verbosity) -> Self {
        Self {
            optimizer,
            logger: TrainingLogger::new(verbosity),
        }
    }

    /// One pass over the minibatches.
    ///
    /// Returns the mean per-batch cost (a sum of per-batch totals divided by
    /// the number of batches, so batches of different sizes weigh equally).
    pub fn fit_epoch(
        &mut self,
        branch: &mut TaxonomicBranch,
        batches: &[Batch],
    ) -> Result<f32, BranchError> {
        let mut total_cost = 0.0f32;
        for (batch_idx, batch) in batches.iter().enumerate() {
            let cost = branch.fprop(batch.inputs.view(), &batch.labels)?;
            total_cost += cost;
            self.optimizer.step(branch);
            self.logger
                .debug(&format!("  batch {batch_idx:>4} | cost {cost:.6}"));
        }
        Ok(total_cost / batches.len().max(1) as f32)
    }

    /// Run `epochs` passes, logging one progress line per epoch.
    ///
    /// Returns the per-epoch mean costs, in order.
    pub fn fit(
        &mut self,
        branch: &mut TaxonomicBranch,
        batches: &[Batch],
        epochs: usize,
    ) -> Result<Vec<f32>, BranchError> {
        let mut costs = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mean_cost = self.fit_epoch(branch, batches)?;
            self.logger.log_epoch(epoch, mean_cost);
            costs.push(mean_cost);
        }
        Ok(costs)
    }
}
