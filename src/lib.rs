//! cladewise: taxonomic classification with per-node routed classifiers.
//!
//! Instead of one flat softmax over every leaf class, a small classifier
//! sits at each internal node of a class taxonomy. Training an example only
//! exercises the classifiers on its true root-to-leaf path; inference walks
//! the tree greedily from the root, one coarse-to-fine decision at a time.

pub mod branch;
pub mod layers;
pub mod taxonomy;
pub mod testing;
pub mod training;
