//! Transaction aggregation and statistics.
//!
//! This module provides the pure computations behind every view: counts,
//! sums, rates, grouped distributions, rankings and breakdowns. Each
//! function takes a row set (usually `FilteredSet::filtered()`) and never
//! fails; an empty row set yields a zero or empty result. Rows whose
//! grouping key is unknown are left out of groupings and breakdowns.

use crate::models::{
    BreakdownSlice, Dimension, Direction, DistributionEntry, Flag, LeaderboardEntry, Measure,
    ProfilePoint, TimePoint, Transaction, ViewResult,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Groups keyed by string, iterated in first-seen order.
struct OrderedGroups<V> {
    index: HashMap<String, usize>,
    groups: Vec<(String, V)>,
}

impl<V: Default> OrderedGroups<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.index.insert(key.to_string(), idx);
                self.groups.push((key.to_string(), V::default()));
                idx
            }
        };
        &mut self.groups[idx].1
    }

    fn into_vec(self) -> Vec<(String, V)> {
        self.groups
    }
}

/// Count unique values of a field.
pub fn count_distinct(rows: &[&Transaction], field: Dimension, label: &str) -> ViewResult {
    let distinct: HashSet<_> = rows.iter().filter_map(|tx| field.key(tx)).collect();

    ViewResult::Scalar {
        label: label.to_string(),
        value: distinct.len() as f64,
    }
}

/// Sum a numeric field.
pub fn sum_field(rows: &[&Transaction], field: Measure, label: &str) -> ViewResult {
    ViewResult::Scalar {
        label: label.to_string(),
        value: rows.iter().map(|tx| field.value(tx)).sum(),
    }
}

/// Percentage of rows with the flag set. Zero rows give 0.
pub fn rate(rows: &[&Transaction], flag: Flag, label: &str) -> ViewResult {
    ViewResult::Scalar {
        label: label.to_string(),
        value: rate_value(rows, flag),
    }
}

fn rate_value(rows: &[&Transaction], flag: Flag) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let set = rows.iter().filter(|tx| flag.is_set(tx)).count();
    (set as f64 / rows.len() as f64) * 100.0
}

/// Count rows per value of `primary`, optionally split by `secondary`.
///
/// Buckets appear in the order their first row appears.
pub fn group_count(
    rows: &[&Transaction],
    primary: Dimension,
    secondary: Option<Dimension>,
) -> ViewResult {
    let mut groups: OrderedGroups<usize> = OrderedGroups::new();
    let mut split: Vec<(String, Option<String>)> = Vec::new();
    let mut split_index: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut split_counts: Vec<usize> = Vec::new();

    for tx in rows {
        let Some(category) = primary.key(tx) else {
            continue;
        };
        match secondary {
            None => *groups.entry(&category) += 1,
            Some(dim) => {
                let Some(group) = dim.key(tx) else {
                    continue;
                };
                let key = (category.into_owned(), Some(group.into_owned()));
                let idx = *split_index.entry(key.clone()).or_insert_with(|| {
                    split.push(key);
                    split_counts.push(0);
                    split_counts.len() - 1
                });
                split_counts[idx] += 1;
            }
        }
    }

    let entries = if secondary.is_some() {
        split
            .into_iter()
            .zip(split_counts)
            .map(|((category, group), count)| DistributionEntry {
                category,
                group,
                count,
            })
            .collect()
    } else {
        groups
            .into_vec()
            .into_iter()
            .map(|(category, count)| DistributionEntry {
                category,
                group: None,
                count,
            })
            .collect()
    };

    ViewResult::Distribution {
        primary,
        secondary,
        entries,
    }
}

/// Count flagged rows per value of `primary`, using `shape` for the buckets.
///
/// Bucket order and membership come from `shape` (typically the full
/// dataset); counts come from `rows`. Buckets with no flagged rows in
/// `rows` are reported with a count of zero.
pub fn flagged_count_by(
    shape: &[&Transaction],
    rows: &[&Transaction],
    primary: Dimension,
    flag: Flag,
) -> ViewResult {
    let mut groups: OrderedGroups<usize> = OrderedGroups::new();
    for key in shape.iter().filter_map(|tx| primary.key(tx)) {
        groups.entry(&key);
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for tx in rows.iter().filter(|tx| flag.is_set(tx)) {
        if let Some(key) = primary.key(tx) {
            *counts.entry(key.into_owned()).or_default() += 1;
        }
    }

    let entries = groups
        .into_vec()
        .into_iter()
        .map(|(category, _)| {
            let count = counts.get(&category).copied().unwrap_or(0);
            DistributionEntry {
                category,
                group: Some(flag.label(true).to_string()),
                count,
            }
        })
        .collect();

    ViewResult::Distribution {
        primary,
        secondary: Some(match flag {
            Flag::Returns => Dimension::Returns,
            Flag::Churn => Dimension::Churn,
        }),
        entries,
    }
}

/// Sum `value` per purchase date, oldest first. Dates without rows are omitted.
pub fn time_series_sum(rows: &[&Transaction], value: Measure) -> ViewResult {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for tx in rows {
        *by_date.entry(tx.purchase_date).or_insert(0.0) += value.value(tx);
    }

    ViewResult::TimeSeries {
        value,
        points: by_date
            .into_iter()
            .map(|(date, amount)| TimePoint { date, amount })
            .collect(),
    }
}

/// Sum `value` per group, in first-seen group order.
pub fn sum_by_group(
    rows: &[&Transaction],
    group_key: Dimension,
    value: Measure,
) -> Vec<LeaderboardEntry> {
    let mut groups: OrderedGroups<f64> = OrderedGroups::new();
    for tx in rows {
        if let Some(key) = group_key.key(tx) {
            *groups.entry(&key) += value.value(tx);
        }
    }

    groups
        .into_vec()
        .into_iter()
        .map(|(key, value)| LeaderboardEntry {
            key,
            label: None,
            value,
        })
        .collect()
}

/// Top `n` groups by summed `value`.
///
/// The sort is stable, so ties keep the grouping order.
pub fn top_n(
    rows: &[&Transaction],
    group_key: Dimension,
    value: Measure,
    n: usize,
    direction: Direction,
) -> ViewResult {
    let mut entries = sum_by_group(rows, group_key, value);

    match direction {
        Direction::Descending => entries.sort_by(|a, b| b.value.total_cmp(&a.value)),
        Direction::Ascending => entries.sort_by(|a, b| a.value.total_cmp(&b.value)),
    }
    entries.truncate(n);

    ViewResult::Leaderboard {
        group_key,
        value,
        entries,
    }
}

/// Attach customer names to a leaderboard keyed by customer id.
///
/// The first name seen for each id wins.
pub fn label_customers(result: ViewResult, rows: &[&Transaction]) -> ViewResult {
    match result {
        ViewResult::Leaderboard {
            group_key: Dimension::CustomerId,
            value,
            entries,
        } => {
            let mut names: HashMap<&str, &str> = HashMap::new();
            for tx in rows {
                names
                    .entry(tx.customer_id.as_str())
                    .or_insert(tx.customer_name.as_str());
            }

            let entries = entries
                .into_iter()
                .map(|entry| LeaderboardEntry {
                    label: names.get(entry.key.as_str()).map(|n| n.to_string()),
                    ..entry
                })
                .collect();

            ViewResult::Leaderboard {
                group_key: Dimension::CustomerId,
                value,
                entries,
            }
        }
        other => other,
    }
}

/// Share of rows per value of `field`.
///
/// Shares are taken over the rows where `field` is known, so they sum to 1.
/// Empty when no such rows exist.
pub fn percentage_breakdown(rows: &[&Transaction], field: Dimension) -> ViewResult {
    let mut groups: OrderedGroups<usize> = OrderedGroups::new();
    let mut total = 0usize;
    for key in rows.iter().filter_map(|tx| field.key(tx)) {
        *groups.entry(&key) += 1;
        total += 1;
    }

    let total = total as f64;
    let slices = groups
        .into_vec()
        .into_iter()
        .map(|(category, count)| BreakdownSlice {
            category,
            fraction: count as f64 / total,
        })
        .collect();

    ViewResult::PercentageBreakdown { field, slices }
}

/// Row count and mean `value` per group, in first-seen order.
pub fn mean_by_group(rows: &[&Transaction], group_key: Dimension, value: Measure) -> ViewResult {
    let mut groups: OrderedGroups<(usize, f64)> = OrderedGroups::new();
    for tx in rows {
        let Some(key) = group_key.key(tx) else {
            continue;
        };
        let (count, sum) = groups.entry(&key);
        *count += 1;
        *sum += value.value(tx);
    }

    let points = groups
        .into_vec()
        .into_iter()
        .map(|(category, (count, sum))| ProfilePoint {
            category,
            count,
            mean: sum / count as f64,
        })
        .collect();

    ViewResult::Profile {
        group_key,
        value,
        points,
    }
}

/// Purchase count and average purchase amount per product category.
pub fn category_profile(rows: &[&Transaction]) -> ViewResult {
    mean_by_group(rows, Dimension::ProductCategory, Measure::TotalPurchaseAmount)
}
