//! Data models for the analytics core.
//!
//! This module contains the transaction record, the field selectors used to
//! address its columns, and the result shapes handed back to callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single purchase made by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Customer identifier (one customer has many transactions).
    pub customer_id: String,
    /// Customer display name, repeated on every row of that customer.
    pub customer_name: String,
    /// Calendar date of the purchase.
    pub purchase_date: NaiveDate,
    /// Customer gender.
    pub gender: String,
    /// Customer age in years.
    pub age: u32,
    /// Product category (display label, after relabeling).
    pub product_category: String,
    /// Payment method used.
    pub payment_method: String,
    /// Total amount paid for this transaction.
    pub total_purchase_amount: f64,
    /// Whether this transaction was returned; `None` when the source left it blank.
    pub returns: Option<bool>,
    /// Whether the customer is considered churned.
    pub churn: bool,
}

/// Categorical field used for grouping and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CustomerId,
    Gender,
    Age,
    ProductCategory,
    PaymentMethod,
    Returns,
    Churn,
}

impl Dimension {
    /// Returns the value of this field for a transaction as a display key.
    ///
    /// Boolean fields render as labels ("Churn"/"No Churn", "Return"/"No Return").
    /// `None` means the value is unknown; groupings leave such rows out.
    pub fn key<'a>(&self, tx: &'a Transaction) -> Option<Cow<'a, str>> {
        let key = match self {
            Dimension::CustomerId => Cow::Borrowed(tx.customer_id.as_str()),
            Dimension::Gender => Cow::Borrowed(tx.gender.as_str()),
            Dimension::Age => Cow::Owned(tx.age.to_string()),
            Dimension::ProductCategory => Cow::Borrowed(tx.product_category.as_str()),
            Dimension::PaymentMethod => Cow::Borrowed(tx.payment_method.as_str()),
            Dimension::Returns => Cow::Borrowed(Flag::Returns.label(tx.returns?)),
            Dimension::Churn => Cow::Borrowed(Flag::Churn.label(tx.churn)),
        };
        Some(key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::CustomerId => write!(f, "Customer ID"),
            Dimension::Gender => write!(f, "Gender"),
            Dimension::Age => write!(f, "Age"),
            Dimension::ProductCategory => write!(f, "Product Category"),
            Dimension::PaymentMethod => write!(f, "Payment Method"),
            Dimension::Returns => write!(f, "Returns"),
            Dimension::Churn => write!(f, "Churn"),
        }
    }
}

/// Numeric field used for sums and means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    TotalPurchaseAmount,
    /// Returned transactions, counted as 1.0 each. Unknown counts as 0.
    Returns,
}

impl Measure {
    /// Returns the numeric value of this field for a transaction.
    pub fn value(&self, tx: &Transaction) -> f64 {
        match self {
            Measure::TotalPurchaseAmount => tx.total_purchase_amount,
            Measure::Returns => {
                if Flag::Returns.is_set(tx) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::TotalPurchaseAmount => write!(f, "Total Purchase Amount"),
            Measure::Returns => write!(f, "Returns"),
        }
    }
}

/// Boolean field of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    Returns,
    Churn,
}

impl Flag {
    /// Returns whether the flag is set on a transaction. Unknown is not set.
    pub fn is_set(&self, tx: &Transaction) -> bool {
        match self {
            Flag::Returns => tx.returns == Some(true),
            Flag::Churn => tx.churn,
        }
    }

    /// Display label for a flag value.
    pub fn label(&self, set: bool) -> &'static str {
        match (self, set) {
            (Flag::Returns, true) => "Return",
            (Flag::Returns, false) => "No Return",
            (Flag::Churn, true) => "Churn",
            (Flag::Churn, false) => "No Churn",
        }
    }
}

/// Sort direction for leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Largest value first (default)
    #[default]
    Descending,
    /// Smallest value first
    Ascending,
}

/// One bar of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Value of the primary dimension.
    pub category: String,
    /// Value of the secondary dimension, when the distribution is split.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Number of rows in this bucket.
    pub count: usize,
}

/// One point of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Grouping key (e.g. customer id).
    pub key: String,
    /// Human-readable name for the key, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Reduced metric value.
    pub value: f64,
}

impl LeaderboardEntry {
    /// Returns the label if present, otherwise the key.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// One slice of a percentage breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSlice {
    pub category: String,
    /// Share of the whole in `[0, 1]`.
    pub fraction: f64,
}

/// Count and mean of a measure for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub category: String,
    pub count: usize,
    pub mean: f64,
}

/// Result of a single pipeline computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewResult {
    Scalar {
        label: String,
        value: f64,
    },
    Distribution {
        primary: Dimension,
        #[serde(skip_serializing_if = "Option::is_none")]
        secondary: Option<Dimension>,
        entries: Vec<DistributionEntry>,
    },
    TimeSeries {
        value: Measure,
        points: Vec<TimePoint>,
    },
    Leaderboard {
        group_key: Dimension,
        value: Measure,
        entries: Vec<LeaderboardEntry>,
    },
    PercentageBreakdown {
        field: Dimension,
        slices: Vec<BreakdownSlice>,
    },
    Profile {
        group_key: Dimension,
        value: Measure,
        points: Vec<ProfilePoint>,
    },
}

impl ViewResult {
    /// Returns true when the result carries no data points.
    ///
    /// Scalars are never empty; a zero is still a value.
    pub fn is_empty(&self) -> bool {
        match self {
            ViewResult::Scalar { .. } => false,
            ViewResult::Distribution { entries, .. } => entries.is_empty(),
            ViewResult::TimeSeries { points, .. } => points.is_empty(),
            ViewResult::Leaderboard { entries, .. } => entries.is_empty(),
            ViewResult::PercentageBreakdown { slices, .. } => slices.is_empty(),
            ViewResult::Profile { points, .. } => points.is_empty(),
        }
    }
}
