//! Markdown and JSON report generation.
//!
//! This module renders computed views as a Markdown document (one table
//! per view) or as pretty-printed JSON.

use super::{Report, ReportMetadata, ViewSection};
use crate::filter::FilterSelection;
use crate::models::ViewResult;
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# E-commerce Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_filter_section(&report.metadata.selection));

    let mut current_page = None;
    for section in &report.views {
        if current_page != Some(section.page) {
            output.push_str(&format!("## {}\n\n", section.page));
            current_page = Some(section.page);
        }
        output.push_str(&generate_view_section(section));
    }

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Dataset\n\n");
    section.push_str(&format!("- **File:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Transactions:** {}\n",
        metadata.total_transactions
    ));
    section.push_str(&format!(
        "- **Matching transactions:** {}\n",
        metadata.matched_transactions
    ));
    if let Some((start, end)) = metadata.date_range {
        section.push_str(&format!("- **Period:** {} to {}\n", start, end));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the applied-filter section.
fn generate_filter_section(selection: &FilterSelection) -> String {
    let mut section = String::new();

    section.push_str("## Filters\n\n");

    if selection.is_empty() {
        section.push_str("No filters applied.\n\n");
        return section;
    }

    if let Some(start) = selection.start_date {
        section.push_str(&format!("- **From:** {}\n", start));
    }
    if let Some(end) = selection.end_date {
        section.push_str(&format!("- **To:** {}\n", end));
    }
    if let Some(ref gender) = selection.gender {
        section.push_str(&format!("- **Gender:** {}\n", gender));
    }
    if let Some(age) = selection.age {
        section.push_str(&format!("- **Age:** {}\n", age));
    }
    if !selection.product_categories.is_empty() {
        let categories: Vec<&str> = selection
            .product_categories
            .iter()
            .map(String::as_str)
            .collect();
        section.push_str(&format!("- **Categories:** {}\n", categories.join(", ")));
    }
    section.push('\n');

    section
}

/// Generate the block for a single view.
fn generate_view_section(section: &ViewSection) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", section.title));

    if section.result.is_empty() {
        block.push_str("No data for the current filter.\n\n");
        return block;
    }

    match &section.result {
        ViewResult::Scalar { value, .. } => {
            block.push_str(&format!("**{}**\n", format_number(*value)));
        }
        ViewResult::Distribution {
            primary,
            secondary,
            entries,
        } => match secondary {
            Some(secondary) => {
                block.push_str(&format!("| {} | {} | Count |\n", primary, secondary));
                block.push_str("|:---|:---|---:|\n");
                for entry in entries {
                    block.push_str(&format!(
                        "| {} | {} | {} |\n",
                        entry.category,
                        entry.group.as_deref().unwrap_or("-"),
                        entry.count
                    ));
                }
            }
            None => {
                block.push_str(&format!("| {} | Count |\n", primary));
                block.push_str("|:---|---:|\n");
                for entry in entries {
                    block.push_str(&format!("| {} | {} |\n", entry.category, entry.count));
                }
            }
        },
        ViewResult::TimeSeries { value, points } => {
            block.push_str(&format!("| Date | {} |\n", value));
            block.push_str("|:---|---:|\n");
            for point in points {
                block.push_str(&format!(
                    "| {} | {} |\n",
                    point.date,
                    format_number(point.amount)
                ));
            }
        }
        ViewResult::Leaderboard {
            group_key,
            value,
            entries,
        } => {
            block.push_str(&format!("| # | {} | {} |\n", group_key, value));
            block.push_str("|---:|:---|---:|\n");
            for (i, entry) in entries.iter().enumerate() {
                let name = match entry.label {
                    Some(ref label) => format!("{} ({})", label, entry.key),
                    None => entry.key.clone(),
                };
                block.push_str(&format!(
                    "| {} | {} | {} |\n",
                    i + 1,
                    name,
                    format_number(entry.value)
                ));
            }
        }
        ViewResult::PercentageBreakdown { field, slices } => {
            block.push_str(&format!("| {} | Share |\n", field));
            block.push_str("|:---|---:|\n");
            for slice in slices {
                block.push_str(&format!(
                    "| {} | {:.1}% |\n",
                    slice.category,
                    slice.fraction * 100.0
                ));
            }
        }
        ViewResult::Profile {
            group_key,
            value,
            points,
        } => {
            block.push_str(&format!("| {} | Purchases | Average {} |\n", group_key, value));
            block.push_str("|:---|---:|---:|\n");
            for point in points {
                block.push_str(&format!(
                    "| {} | {} | {} |\n",
                    point.category,
                    point.count,
                    format_number(point.mean)
                ));
            }
        }
    }
    block.push('\n');

    block
}

/// Whole numbers without decimals, everything else with two.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ViewName;
    use crate::models::{
        BreakdownSlice, Dimension, DistributionEntry, LeaderboardEntry, Measure, ProfilePoint,
        TimePoint,
    };
    use chrono::{NaiveDate, Utc};

    fn create_test_report() -> Report {
        Report {
            metadata: ReportMetadata {
                dataset: "ecommerce.csv".to_string(),
                generated_at: Utc::now(),
                total_transactions: 250000,
                matched_transactions: 120000,
                date_range: Some((
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2023, 9, 13).unwrap(),
                )),
                selection: FilterSelection::new().with_gender("Female"),
            },
            views: vec![
                ViewSection::new(
                    ViewName::TotalRevenue,
                    ViewResult::Scalar {
                        label: "Revenue".to_string(),
                        value: 1234.5,
                    },
                ),
                ViewSection::new(
                    ViewName::TopCustomersByPurchase,
                    ViewResult::Leaderboard {
                        group_key: Dimension::CustomerId,
                        value: Measure::TotalPurchaseAmount,
                        entries: vec![LeaderboardEntry {
                            key: "44605".to_string(),
                            label: Some("John Rivera".to_string()),
                            value: 9000.0,
                        }],
                    },
                ),
                ViewSection::new(
                    ViewName::PaymentMethods,
                    ViewResult::PercentageBreakdown {
                        field: Dimension::PaymentMethod,
                        slices: vec![],
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# E-commerce Dashboard"));
        assert!(markdown.contains("## Dataset"));
        assert!(markdown.contains("- **Matching transactions:** 120000"));
        assert!(markdown.contains("- **Gender:** Female"));
        assert!(markdown.contains("## Home"));
        assert!(markdown.contains("## Clients"));
        assert!(markdown.contains("**1234.50**"));
        assert!(markdown.contains("| 1 | John Rivera (44605) | 9000 |"));
        assert!(markdown.contains("No data for the current filter."));
    }

    #[test]
    fn test_filter_section_without_filters() {
        let section = generate_filter_section(&FilterSelection::new());
        assert!(section.contains("No filters applied."));
    }

    #[test]
    fn test_breakdown_renders_percentages() {
        let section = ViewSection::new(
            ViewName::ReturnsBreakdown,
            ViewResult::PercentageBreakdown {
                field: Dimension::Returns,
                slices: vec![
                    BreakdownSlice {
                        category: "No Return".to_string(),
                        fraction: 0.75,
                    },
                    BreakdownSlice {
                        category: "Return".to_string(),
                        fraction: 0.25,
                    },
                ],
            },
        );

        let block = generate_view_section(&section);
        assert!(block.contains("| No Return | 75.0% |"));
        assert!(block.contains("| Return | 25.0% |"));
    }

    #[test]
    fn test_split_distribution_renders_group_column() {
        let section = ViewSection::new(
            ViewName::AgeDistribution,
            ViewResult::Distribution {
                primary: Dimension::Age,
                secondary: Some(Dimension::Gender),
                entries: vec![
                    DistributionEntry {
                        category: "31".to_string(),
                        group: Some("Female".to_string()),
                        count: 4,
                    },
                    DistributionEntry {
                        category: "31".to_string(),
                        group: Some("Male".to_string()),
                        count: 2,
                    },
                ],
            },
        );

        let block = generate_view_section(&section);
        assert!(block.contains("| Age | Gender | Count |"));
        assert!(block.contains("| 31 | Female | 4 |"));
        assert!(block.contains("| 31 | Male | 2 |"));
    }

    #[test]
    fn test_time_series_renders_one_row_per_date() {
        let section = ViewSection::new(
            ViewName::RevenueByDate,
            ViewResult::TimeSeries {
                value: Measure::TotalPurchaseAmount,
                points: vec![
                    TimePoint {
                        date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                        amount: 120.0,
                    },
                    TimePoint {
                        date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
                        amount: 80.25,
                    },
                ],
            },
        );

        let block = generate_view_section(&section);
        assert!(block.contains("### Revenue by day"));
        assert!(block.contains("| Date | Total Purchase Amount |"));
        assert!(block.contains("| 2023-01-02 | 120 |"));
        assert!(block.contains("| 2023-01-05 | 80.25 |"));
    }

    #[test]
    fn test_profile_renders_count_and_mean() {
        let section = ViewSection::new(
            ViewName::CategoryProfile,
            ViewResult::Profile {
                group_key: Dimension::ProductCategory,
                value: Measure::TotalPurchaseAmount,
                points: vec![ProfilePoint {
                    category: "Книги".to_string(),
                    count: 3,
                    mean: 150.5,
                }],
            },
        );

        let block = generate_view_section(&section);
        assert!(block.contains("| Product Category | Purchases | Average Total Purchase Amount |"));
        assert!(block.contains("| Книги | 3 | 150.50 |"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(0.126), "0.13");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"dataset\""));
        assert!(json.contains("\"views\""));
        assert!(json.contains("\"kind\": \"leaderboard\""));
        assert!(json.contains("\"view\": \"total-revenue\""));
    }
}
