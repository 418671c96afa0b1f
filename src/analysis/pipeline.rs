//! Named views and the pipeline that computes them.
//!
//! Every chart and indicator of the dashboard is one `ViewName`. The
//! pipeline applies a selection to its dataset and dispatches to the
//! matching computation in `aggregator`.

use super::aggregator::{
    category_profile, count_distinct, flagged_count_by, group_count, label_customers,
    percentage_breakdown, rate, sum_by_group, sum_field, time_series_sum, top_n,
};
use crate::dataset::Dataset;
use crate::error::ValidationError;
use crate::filter::{apply_filter, FilterSelection, FilteredSet};
use crate::models::{Dimension, Direction, Flag, Measure, ViewResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Default number of rows in a leaderboard.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;

/// Every view the pipeline can compute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ViewName {
    TotalCustomers,
    TotalRevenue,
    ChurnRate,
    RevenueByDate,
    ReturnsBreakdown,
    AgeDistribution,
    GenderDistribution,
    ChurnByGender,
    ChurnByAge,
    TopCustomersByPurchase,
    TopCustomersByReturns,
    SalesByCategory,
    RevenueByCategory,
    PaymentMethods,
    CategoryProfile,
}

impl ViewName {
    /// Every view, grouped by page.
    pub const ALL: [ViewName; 15] = [
        ViewName::TotalCustomers,
        ViewName::TotalRevenue,
        ViewName::ChurnRate,
        ViewName::RevenueByDate,
        ViewName::ReturnsBreakdown,
        ViewName::AgeDistribution,
        ViewName::GenderDistribution,
        ViewName::ChurnByGender,
        ViewName::ChurnByAge,
        ViewName::TopCustomersByPurchase,
        ViewName::TopCustomersByReturns,
        ViewName::SalesByCategory,
        ViewName::RevenueByCategory,
        ViewName::PaymentMethods,
        ViewName::CategoryProfile,
    ];

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            ViewName::TotalCustomers => "Customers",
            ViewName::TotalRevenue => "Revenue",
            ViewName::ChurnRate => "Churn rate (%)",
            ViewName::RevenueByDate => "Revenue by day",
            ViewName::ReturnsBreakdown => "Returns",
            ViewName::AgeDistribution => "Customers by age",
            ViewName::GenderDistribution => "Customers by gender",
            ViewName::ChurnByGender => "Churn by gender",
            ViewName::ChurnByAge => "Churn by age",
            ViewName::TopCustomersByPurchase => "Top customers by purchase amount",
            ViewName::TopCustomersByReturns => "Top customers by returns",
            ViewName::SalesByCategory => "Sales by product category",
            ViewName::RevenueByCategory => "Revenue by product category",
            ViewName::PaymentMethods => "Payment methods (%)",
            ViewName::CategoryProfile => "Average purchase vs. purchase count",
        }
    }

    /// The page this view belongs to.
    pub fn page(&self) -> Page {
        match self {
            ViewName::TotalCustomers
            | ViewName::TotalRevenue
            | ViewName::ChurnRate
            | ViewName::RevenueByDate
            | ViewName::ReturnsBreakdown => Page::Home,
            ViewName::AgeDistribution
            | ViewName::GenderDistribution
            | ViewName::ChurnByGender
            | ViewName::ChurnByAge
            | ViewName::TopCustomersByPurchase
            | ViewName::TopCustomersByReturns => Page::Clients,
            ViewName::SalesByCategory
            | ViewName::RevenueByCategory
            | ViewName::PaymentMethods
            | ViewName::CategoryProfile => Page::Purchase,
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewName::TotalCustomers => "total-customers",
            ViewName::TotalRevenue => "total-revenue",
            ViewName::ChurnRate => "churn-rate",
            ViewName::RevenueByDate => "revenue-by-date",
            ViewName::ReturnsBreakdown => "returns-breakdown",
            ViewName::AgeDistribution => "age-distribution",
            ViewName::GenderDistribution => "gender-distribution",
            ViewName::ChurnByGender => "churn-by-gender",
            ViewName::ChurnByAge => "churn-by-age",
            ViewName::TopCustomersByPurchase => "top-customers-by-purchase",
            ViewName::TopCustomersByReturns => "top-customers-by-returns",
            ViewName::SalesByCategory => "sales-by-category",
            ViewName::RevenueByCategory => "revenue-by-category",
            ViewName::PaymentMethods => "payment-methods",
            ViewName::CategoryProfile => "category-profile",
        };
        write!(f, "{}", name)
    }
}

/// A dashboard page: a fixed set of views sharing one set of filters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    /// Indicators, revenue by day, returns
    #[default]
    Home,
    /// Customer demographics, churn and leaderboards
    Clients,
    /// Product categories and payment methods
    Purchase,
}

impl Page {
    /// Views shown on this page, in display order.
    pub fn views(&self) -> Vec<ViewName> {
        ViewName::ALL
            .iter()
            .copied()
            .filter(|view| view.page() == *self)
            .collect()
    }

    /// Keep only the selection fields this page has controls for.
    ///
    /// Home and clients filter by date, gender and age; purchase filters by
    /// date and product category.
    pub fn scope(&self, selection: &FilterSelection) -> FilterSelection {
        match self {
            Page::Home | Page::Clients => selection.without_categories(),
            Page::Purchase => selection.without_demographics(),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Home => write!(f, "Home"),
            Page::Clients => write!(f, "Clients"),
            Page::Purchase => write!(f, "Products & Purchases"),
        }
    }
}

/// Computes views over one immutable dataset.
///
/// Holds no mutable state; a single pipeline can serve concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct AggregationPipeline<'a> {
    dataset: &'a Dataset,
    leaderboard_size: usize,
}

impl<'a> AggregationPipeline<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    /// Set how many rows leaderboards keep.
    #[must_use]
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Apply a selection to the dataset.
    pub fn filter(&self, selection: &FilterSelection) -> Result<FilteredSet<'a>, ValidationError> {
        apply_filter(self.dataset, selection)
    }

    /// Compute one view for a selection.
    pub fn compute(
        &self,
        view: ViewName,
        selection: &FilterSelection,
    ) -> Result<ViewResult, ValidationError> {
        let set = self.filter(selection)?;
        Ok(self.compute_on(view, &set))
    }

    /// Compute every view of a page.
    ///
    /// The selection is first narrowed to the fields the page exposes.
    pub fn compute_page(
        &self,
        page: Page,
        selection: &FilterSelection,
    ) -> Result<Vec<(ViewName, ViewResult)>, ValidationError> {
        let set = self.filter(&page.scope(selection))?;
        Ok(page
            .views()
            .into_iter()
            .map(|view| (view, self.compute_on(view, &set)))
            .collect())
    }

    /// Compute a view on an already filtered set.
    pub fn compute_on(&self, view: ViewName, set: &FilteredSet<'_>) -> ViewResult {
        debug!("Computing view {} over {} rows", view, set.filtered().len());

        let rows = set.filtered();
        match view {
            ViewName::TotalCustomers => count_distinct(rows, Dimension::CustomerId, view.title()),
            ViewName::TotalRevenue => sum_field(rows, Measure::TotalPurchaseAmount, view.title()),
            ViewName::ChurnRate => rate(rows, Flag::Churn, view.title()),
            ViewName::RevenueByDate => time_series_sum(rows, Measure::TotalPurchaseAmount),
            ViewName::ReturnsBreakdown => percentage_breakdown(rows, Dimension::Returns),
            ViewName::AgeDistribution => group_count(rows, Dimension::Age, Some(Dimension::Gender)),
            ViewName::GenderDistribution => group_count(rows, Dimension::Gender, None),
            ViewName::ChurnByGender => group_count(rows, Dimension::Churn, Some(Dimension::Gender)),
            // Age buckets come from the whole dataset so the axis stays
            // stable while filters change; churn counts come from the filter.
            ViewName::ChurnByAge => flagged_count_by(set.full(), rows, Dimension::Age, Flag::Churn),
            ViewName::TopCustomersByPurchase => label_customers(
                top_n(
                    rows,
                    Dimension::CustomerId,
                    Measure::TotalPurchaseAmount,
                    self.leaderboard_size,
                    Direction::Descending,
                ),
                rows,
            ),
            ViewName::TopCustomersByReturns => label_customers(
                top_n(
                    rows,
                    Dimension::CustomerId,
                    Measure::Returns,
                    self.leaderboard_size,
                    Direction::Descending,
                ),
                rows,
            ),
            ViewName::SalesByCategory => group_count(rows, Dimension::ProductCategory, None),
            ViewName::RevenueByCategory => ViewResult::Leaderboard {
                group_key: Dimension::ProductCategory,
                value: Measure::TotalPurchaseAmount,
                entries: sum_by_group(
                    rows,
                    Dimension::ProductCategory,
                    Measure::TotalPurchaseAmount,
                ),
            },
            ViewName::PaymentMethods => percentage_breakdown(rows, Dimension::PaymentMethod),
            ViewName::CategoryProfile => category_profile(rows),
        }
    }
}
