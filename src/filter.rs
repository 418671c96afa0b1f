//! Filter selection and its application to a dataset.

use crate::dataset::Dataset;
use crate::error::ValidationError;
use crate::models::Transaction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Constraints chosen by the user. An absent field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Inclusive lower bound; defaults to the dataset's earliest date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound; defaults to the dataset's latest date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Exact gender match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Exact age match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Allowed product categories. Empty matches everything.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub product_categories: BTreeSet<String>,
}

impl FilterSelection {
    /// Creates a selection with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Adds a product category to the allowed set.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.product_categories.insert(category.into());
        self
    }

    /// Returns true if the selection constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.product_categories.is_empty()
    }

    /// Check the selection for inconsistencies.
    ///
    /// Only explicitly given bounds are compared. A lone bound outside the
    /// dataset's range is valid and simply matches nothing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ValidationError::InvertedDateRange { start, end });
            }
        }
        Ok(())
    }

    /// Returns a copy keeping only the date range, gender and age.
    #[must_use]
    pub fn without_categories(&self) -> Self {
        Self {
            product_categories: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Returns a copy keeping only the date range and product categories.
    #[must_use]
    pub fn without_demographics(&self) -> Self {
        Self {
            gender: None,
            age: None,
            ..self.clone()
        }
    }

    fn matches(&self, tx: &Transaction, range: Option<(NaiveDate, NaiveDate)>) -> bool {
        if let Some((start, end)) = range {
            if tx.purchase_date < start || tx.purchase_date > end {
                return false;
            }
        }

        if let Some(ref gender) = self.gender {
            if &tx.gender != gender {
                return false;
            }
        }

        if let Some(age) = self.age {
            if tx.age != age {
                return false;
            }
        }

        self.product_categories.is_empty() || self.product_categories.contains(&tx.product_category)
    }
}

/// Both views of a dataset after a selection is applied.
///
/// Most metrics read `filtered()`. A few charts deliberately take their
/// shape from `full()` while counting from `filtered()`.
#[derive(Debug, Clone)]
pub struct FilteredSet<'a> {
    full: Vec<&'a Transaction>,
    filtered: Vec<&'a Transaction>,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl<'a> FilteredSet<'a> {
    /// Every row of the dataset, in load order.
    pub fn full(&self) -> &[&'a Transaction] {
        &self.full
    }

    /// Rows matching the selection, in load order.
    pub fn filtered(&self) -> &[&'a Transaction] {
        &self.filtered
    }

    /// The inclusive date range that was applied, after defaults.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }
}

/// Apply a selection to a dataset.
///
/// Missing date bounds default to the dataset's min/max. Fails only when the
/// selection's explicit start date lies after its end date.
pub fn apply_filter<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
) -> Result<FilteredSet<'a>, ValidationError> {
    selection.validate()?;

    let date_range = match (
        selection.start_date.or(dataset.min_date()),
        selection.end_date.or(dataset.max_date()),
    ) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };

    let full: Vec<&Transaction> = dataset.records().iter().collect();
    let filtered: Vec<&Transaction> = full
        .iter()
        .copied()
        .filter(|tx| selection.matches(tx, date_range))
        .collect();

    debug!(
        "Filter matched {} of {} rows (range: {:?})",
        filtered.len(),
        full.len(),
        date_range
    );

    Ok(FilteredSet {
        full,
        filtered,
        date_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: &str, day: u32, gender: &str, age: u32, category: &str) -> Transaction {
        Transaction {
            customer_id: id.to_string(),
            customer_name: format!("Customer {}", id),
            purchase_date: date(2023, 1, day),
            gender: gender.to_string(),
            age,
            product_category: category.to_string(),
            payment_method: "Cash".to_string(),
            total_purchase_amount: 100.0,
            returns: Some(false),
            churn: false,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            tx("1", 1, "Male", 30, "Книги"),
            tx("2", 5, "Female", 25, "Дом"),
            tx("3", 10, "Male", 25, "Одежда"),
            tx("4", 15, "Female", 40, "Книги"),
            tx("5", 20, "Male", 30, "Электроника"),
        ])
    }

    fn ids(set: &FilteredSet<'_>) -> Vec<String> {
        set.filtered().iter().map(|t| t.customer_id.clone()).collect()
    }

    #[test]
    fn test_empty_selection_matches_all() {
        let data = dataset();
        let set = apply_filter(&data, &FilterSelection::new()).unwrap();
        assert_eq!(set.filtered().len(), 5);
        assert_eq!(set.full().len(), 5);
        assert_eq!(set.date_range(), Some((date(2023, 1, 1), date(2023, 1, 20))));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let data = dataset();
        let selection = FilterSelection::new()
            .with_start_date(date(2023, 1, 5))
            .with_end_date(date(2023, 1, 15));
        let set = apply_filter(&data, &selection).unwrap();
        assert_eq!(ids(&set), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_rows_stay_within_range() {
        let data = dataset();
        for start in 1..=20 {
            for end in start..=20 {
                let (lo, hi) = (date(2023, 1, start), date(2023, 1, end));
                let selection = FilterSelection::new().with_start_date(lo).with_end_date(hi);
                let set = apply_filter(&data, &selection).unwrap();
                assert!(set
                    .filtered()
                    .iter()
                    .all(|t| t.purchase_date >= lo && t.purchase_date <= hi));
            }
        }
    }

    #[test]
    fn test_missing_bound_defaults_to_dataset() {
        let data = dataset();
        let selection = FilterSelection::new().with_start_date(date(2023, 1, 12));
        let set = apply_filter(&data, &selection).unwrap();
        assert_eq!(ids(&set), vec!["4", "5"]);
        assert_eq!(set.date_range(), Some((date(2023, 1, 12), date(2023, 1, 20))));
    }

    #[test]
    fn test_gender_and_age_compose() {
        let data = dataset();
        let selection = FilterSelection::new().with_gender("Male").with_age(30);
        let set = apply_filter(&data, &selection).unwrap();
        assert_eq!(ids(&set), vec!["1", "5"]);
        // The full view is untouched by the filter.
        assert_eq!(set.full().len(), 5);
    }

    #[test]
    fn test_category_membership() {
        let data = dataset();
        let selection = FilterSelection::new()
            .with_category("Книги")
            .with_category("Дом");
        let set = apply_filter(&data, &selection).unwrap();
        assert_eq!(ids(&set), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_empty_category_set_vs_unknown_category() {
        let data = dataset();

        let empty = FilterSelection::new();
        assert!(empty.product_categories.is_empty());
        assert_eq!(apply_filter(&data, &empty).unwrap().filtered().len(), 5);

        let unknown = FilterSelection::new().with_category("Игрушки");
        assert!(apply_filter(&data, &unknown).unwrap().filtered().is_empty());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let data = dataset();
        let selection = FilterSelection::new()
            .with_start_date(date(2023, 1, 10))
            .with_end_date(date(2023, 1, 9));
        let err = apply_filter(&data, &selection).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvertedDateRange {
                start: date(2023, 1, 10),
                end: date(2023, 1, 9),
            }
        );
    }

    #[test]
    fn test_only_inverted_range_is_invalid() {
        let data = dataset();
        let cases = vec![
            FilterSelection::new().with_start_date(date(2030, 1, 1)),
            FilterSelection::new().with_end_date(date(2000, 1, 1)),
            FilterSelection::new().with_gender("Unknown"),
            FilterSelection::new().with_age(999),
            FilterSelection::new().with_category("Nothing"),
            FilterSelection::new()
                .with_start_date(date(2023, 1, 3))
                .with_end_date(date(2023, 1, 3)),
        ];

        for selection in cases {
            assert!(apply_filter(&data, &selection).is_ok(), "{:?}", selection);
        }
    }

    #[test]
    fn test_empty_dataset() {
        let data = Dataset::new(Vec::new());
        let set = apply_filter(&data, &FilterSelection::new().with_gender("Male")).unwrap();
        assert!(set.filtered().is_empty());
        assert_eq!(set.date_range(), None);
    }

    #[test]
    fn test_page_projections() {
        let selection = FilterSelection::new()
            .with_gender("Male")
            .with_age(30)
            .with_category("Книги");

        let demographic = selection.without_categories();
        assert!(demographic.product_categories.is_empty());
        assert_eq!(demographic.gender.as_deref(), Some("Male"));

        let product = selection.without_demographics();
        assert!(product.gender.is_none());
        assert!(product.age.is_none());
        assert!(product.product_categories.contains("Книги"));
        assert!(FilterSelection::new().without_demographics().is_empty());
    }
}
