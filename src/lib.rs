//! ecomdash - analytics core for an e-commerce transaction dataset.
//!
//! Load a dataset once, describe what to look at with a [`FilterSelection`],
//! and ask an [`AggregationPipeline`] for any [`ViewName`]:
//!
//! ```no_run
//! use ecomdash::{dataset, AggregationPipeline, FilterSelection, ViewName};
//! use std::path::Path;
//!
//! let data = dataset::load_csv(Path::new("ecommerce.csv"), &Default::default())?;
//! let pipeline = AggregationPipeline::new(&data);
//! let _revenue = pipeline.compute(ViewName::TotalRevenue, &FilterSelection::new().with_gender("Female"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;

pub use analysis::{AggregationPipeline, Page, ViewName};
pub use dataset::Dataset;
pub use error::{LoadError, ValidationError};
pub use filter::{apply_filter, FilterSelection, FilteredSet};
pub use models::{Transaction, ViewResult};
