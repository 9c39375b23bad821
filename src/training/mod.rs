//! Training infrastructure for the taxonomic branch.
//!
//! The branch computes costs and accumulates gradients; everything that
//! drives it lives here:
//!
//! - [`GradientDescentMomentum`]: the update rule applied between minibatches
//! - [`BranchTrainer`]: the epoch loop over minibatches
//! - [`TrainingLogger`] / [`Verbosity`]: lightweight progress logging

mod logger;
mod optimizer;
mod trainer;

pub use logger::{TrainingLogger, Verbosity};
pub use optimizer::{GradientDescentMomentum, MomentumParams};
pub use trainer::{Batch, BranchTrainer};
