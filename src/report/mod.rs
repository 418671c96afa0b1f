//! Report assembly and rendering.

pub mod generator;

pub use generator::*;

use crate::analysis::{AggregationPipeline, Page, ViewName};
use crate::error::ValidationError;
use crate::filter::{FilterSelection, FilteredSet};
use crate::models::ViewResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the dataset the views were computed from.
    pub dataset: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of transactions in the dataset.
    pub total_transactions: usize,
    /// Number of transactions matching the selection.
    pub matched_transactions: usize,
    /// Earliest and latest purchase date in the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Selection the views were computed with.
    pub selection: FilterSelection,
}

/// One computed view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSection {
    pub view: ViewName,
    pub page: Page,
    pub title: String,
    pub result: ViewResult,
}

impl ViewSection {
    pub fn new(view: ViewName, result: ViewResult) -> Self {
        Self {
            view,
            page: view.page(),
            title: view.title().to_string(),
            result,
        }
    }
}

/// A complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub views: Vec<ViewSection>,
}

impl Report {
    /// Compute every view of a page.
    ///
    /// The page narrows the selection to its own filters; the narrowed
    /// selection is the one recorded in the metadata.
    pub fn for_page(
        pipeline: &AggregationPipeline<'_>,
        dataset: &str,
        page: Page,
        selection: &FilterSelection,
    ) -> Result<Self, ValidationError> {
        let scoped = page.scope(selection);
        let set = pipeline.filter(&scoped)?;
        let views = page
            .views()
            .into_iter()
            .map(|view| ViewSection::new(view, pipeline.compute_on(view, &set)))
            .collect();

        Ok(Self::assemble(pipeline, dataset, scoped, &set, views))
    }

    /// Compute the given views with the whole selection.
    ///
    /// Repeated view names are rendered once, at their first position.
    pub fn for_views(
        pipeline: &AggregationPipeline<'_>,
        dataset: &str,
        views: &[ViewName],
        selection: &FilterSelection,
    ) -> Result<Self, ValidationError> {
        let set = pipeline.filter(selection)?;
        let views = dedup_views(views)
            .into_iter()
            .map(|view| ViewSection::new(view, pipeline.compute_on(view, &set)))
            .collect();

        Ok(Self::assemble(
            pipeline,
            dataset,
            selection.clone(),
            &set,
            views,
        ))
    }

    fn assemble(
        pipeline: &AggregationPipeline<'_>,
        dataset: &str,
        selection: FilterSelection,
        set: &FilteredSet<'_>,
        views: Vec<ViewSection>,
    ) -> Self {
        let data = pipeline.dataset();
        Self {
            metadata: ReportMetadata {
                dataset: dataset.to_string(),
                generated_at: Utc::now(),
                total_transactions: data.len(),
                matched_transactions: set.filtered().len(),
                date_range: data.min_date().zip(data.max_date()),
                selection,
            },
            views,
        }
    }
}

fn dedup_views(views: &[ViewName]) -> Vec<ViewName> {
    let mut seen = Vec::with_capacity(views.len());
    for view in views {
        if !seen.contains(view) {
            seen.push(*view);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::Transaction;

    fn tx(id: &str, gender: &str, category: &str, amount: f64) -> Transaction {
        Transaction {
            customer_id: id.to_string(),
            customer_name: format!("Customer {}", id),
            purchase_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            gender: gender.to_string(),
            age: 30,
            product_category: category.to_string(),
            payment_method: "Cash".to_string(),
            total_purchase_amount: amount,
            returns: Some(false),
            churn: false,
        }
    }

    fn create_test_dataset() -> Dataset {
        Dataset::new(vec![
            tx("1", "Male", "Книги", 10.0),
            tx("2", "Female", "Книги", 20.0),
            tx("3", "Female", "Дом", 30.0),
        ])
    }

    #[test]
    fn test_page_report_records_scoped_selection() {
        let data = create_test_dataset();
        let pipeline = AggregationPipeline::new(&data);
        let selection = FilterSelection::new()
            .with_gender("Female")
            .with_category("Книги");

        let report = Report::for_page(&pipeline, "tx.csv", Page::Purchase, &selection).unwrap();
        assert_eq!(report.metadata.selection.gender, None);
        assert!(report.metadata.selection.product_categories.contains("Книги"));
        assert_eq!(report.metadata.total_transactions, 3);
        assert_eq!(report.metadata.matched_transactions, 2);
        assert_eq!(report.views.len(), Page::Purchase.views().len());

        let markdown = generate_markdown_report(&report);
        assert!(!markdown.contains("**Gender:**"));
        assert!(markdown.contains("- **Categories:** Книги"));
        assert!(markdown.contains("- **Matching transactions:** 2"));
    }

    #[test]
    fn test_view_report_keeps_whole_selection() {
        let data = create_test_dataset();
        let pipeline = AggregationPipeline::new(&data);
        let selection = FilterSelection::new()
            .with_gender("Female")
            .with_category("Книги");
        let views = [
            ViewName::TotalRevenue,
            ViewName::SalesByCategory,
            ViewName::TotalRevenue,
        ];

        let report = Report::for_views(&pipeline, "tx.csv", &views, &selection).unwrap();
        let names: Vec<_> = report.views.iter().map(|v| v.view).collect();
        assert_eq!(names, vec![ViewName::TotalRevenue, ViewName::SalesByCategory]);
        assert_eq!(report.metadata.selection, selection);
        assert_eq!(report.metadata.matched_transactions, 1);
    }

    #[test]
    fn test_inverted_range_fails_report() {
        let data = create_test_dataset();
        let pipeline = AggregationPipeline::new(&data);
        let selection = FilterSelection::new()
            .with_start_date(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap())
            .with_end_date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());

        assert!(Report::for_page(&pipeline, "tx.csv", Page::Home, &selection).is_err());
        assert!(Report::for_views(&pipeline, "tx.csv", &[ViewName::ChurnRate], &selection).is_err());
    }
}
