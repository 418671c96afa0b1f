//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and conversion into a filter selection.

use crate::analysis::{Page, ViewName};
use crate::filter::FilterSelection;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ecomdash - analytics over an e-commerce transaction dataset
///
/// Filter transactions by date, gender, age and product category, and
/// render dashboard indicators, distributions and leaderboards.
///
/// Examples:
///   ecomdash --data ecommerce.csv
///   ecomdash --data ecommerce.csv --page clients --gender Female --age 34
///   ecomdash --data ecommerce.csv --page purchase --category Книги,Дом --format json
///   ecomdash --data ecommerce.csv --view churn-rate,revenue-by-date --start-date 2023-01-01
///   ecomdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Transactions CSV file
    ///
    /// Can also be set via ECOMDASH_DATA env var or .ecomdash.toml config.
    #[arg(short, long, value_name = "FILE", env = "ECOMDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Dashboard page to render
    #[arg(short, long, value_name = "PAGE")]
    pub page: Option<Page>,

    /// Specific views to render (comma-separated); overrides --page
    ///
    /// Example: --view total-revenue,churn-rate
    #[arg(long, value_name = "VIEWS", value_delimiter = ',')]
    pub view: Vec<ViewName>,

    /// First purchase date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// Last purchase date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Only customers of this gender
    #[arg(short, long, value_name = "GENDER")]
    pub gender: Option<String>,

    /// Only customers of exactly this age
    #[arg(short, long, value_name = "YEARS")]
    pub age: Option<u32>,

    /// Product categories to include (comma-separated)
    #[arg(long, value_name = "CATEGORIES", value_delimiter = ',')]
    pub category: Vec<String>,

    /// Number of rows in leaderboards
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ecomdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ecomdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(top) = self.top {
            if top == 0 {
                return Err("Leaderboard size must be at least 1".to_string());
            }
        }

        if let Some(age) = self.age {
            if age == 0 {
                return Err("Age must be a positive number".to_string());
            }
        }

        if let Some(ref gender) = self.gender {
            if gender.trim().is_empty() {
                return Err("Gender must not be empty".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Dataset file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Dataset path is not a file: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Build the filter selection described by the flags.
    ///
    /// Date ordering is not checked here; the pipeline rejects inverted ranges.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            start_date: self.start_date,
            end_date: self.end_date,
            gender: self.gender.as_ref().map(|g| g.trim().to_string()),
            age: self.age,
            product_categories: self
                .category
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
