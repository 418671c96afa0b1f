//! Aggregation pipeline.
//!
//! `aggregator` holds the pure computations; `pipeline` maps named views
//! onto them.

pub mod aggregator;
pub mod pipeline;

pub use aggregator::*;
pub use pipeline::{AggregationPipeline, Page, ViewName, DEFAULT_LEADERBOARD_SIZE};
