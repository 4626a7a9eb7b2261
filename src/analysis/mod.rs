//! Analysis modules.
//!
//! Normalization turns raw attributes into keys; aggregation groups
//! and buckets them into public datasets.

pub mod aggregator;
pub mod normalize;

pub use aggregator::*;
pub use normalize::*;
