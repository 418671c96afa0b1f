//! Dataset loading and the immutable transaction collection.
//!
//! A dataset is read once from CSV, passed through a single relabel step
//! that turns raw category codes into display labels, and then frozen.

use crate::error::{LoadError, Result};
use crate::models::Transaction;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const COL_CUSTOMER_ID: &str = "Customer ID";
const COL_CUSTOMER_NAME: &str = "Customer Name";
const COL_PURCHASE_DATE: &str = "Purchase Date";
const COL_GENDER: &str = "Gender";
const COL_AGE: &str = "Age";
const COL_CUSTOMER_AGE: &str = "Customer Age";
const COL_PRODUCT_CATEGORY: &str = "Product Category";
const COL_PAYMENT_METHOD: &str = "Payment Method";
const COL_TOTAL_AMOUNT: &str = "Total Purchase Amount";
const COL_RETURNS: &str = "Returns";
const COL_CHURN: &str = "Churn";

/// Immutable, ordered collection of transactions.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Transaction>,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build a dataset from already-parsed records, keeping their order.
    pub fn new(records: Vec<Transaction>) -> Self {
        let dates = records.iter().map(|r| r.purchase_date);
        let date_range = dates.clone().min().zip(dates.max());

        Self {
            records,
            date_range,
        }
    }

    /// All records in load order.
    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest purchase date, if any rows exist.
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.date_range.map(|(lo, _)| lo)
    }

    /// Latest purchase date, if any rows exist.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.date_range.map(|(_, hi)| hi)
    }
}

/// Mapping from raw category codes to display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLabels {
    labels: BTreeMap<String, String>,
}

impl CategoryLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// An empty mapping; every value passes through unchanged.
    pub fn identity() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    /// Translate a raw value. Unmapped values are returned as-is.
    pub fn relabel(&self, raw: &str) -> String {
        self.labels
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self::new(default_category_labels())
    }
}

/// Display labels used by the dashboard for the source data's category codes.
pub fn default_category_labels() -> BTreeMap<String, String> {
    [
        ("Books", "Книги"),
        ("Electronics", "Электроника"),
        ("Home", "Дом"),
        ("Clothing", "Одежда"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Options for loading a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Category relabel step applied to every row.
    pub category_labels: CategoryLabels,
    /// Whether to show a progress spinner.
    pub show_progress: bool,
}

/// Column positions resolved from the header row.
struct Columns {
    customer_id: usize,
    customer_name: usize,
    purchase_date: usize,
    gender: usize,
    age: usize,
    product_category: usize,
    payment_method: usize,
    total_amount: usize,
    returns: usize,
    churn: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();

        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })
        };

        let age = match find(COL_AGE) {
            Some(idx) => idx,
            None => require(COL_CUSTOMER_AGE)?,
        };

        Ok(Self {
            customer_id: require(COL_CUSTOMER_ID)?,
            customer_name: require(COL_CUSTOMER_NAME)?,
            purchase_date: require(COL_PURCHASE_DATE)?,
            gender: require(COL_GENDER)?,
            age,
            product_category: require(COL_PRODUCT_CATEGORY)?,
            payment_method: require(COL_PAYMENT_METHOD)?,
            total_amount: require(COL_TOTAL_AMOUNT)?,
            returns: require(COL_RETURNS)?,
            churn: require(COL_CHURN)?,
        })
    }
}

/// Load a dataset from a CSV file.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| LoadError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Loading dataset: {}", path.display());

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Reading transactions...");
        Some(pb)
    } else {
        None
    };

    let result = read_records(file, path, &options.category_labels, spinner.as_ref());

    if let Some(pb) = spinner {
        match &result {
            Ok(dataset) => pb.finish_with_message(format!("Loaded {} transactions", dataset.len())),
            Err(_) => pb.abandon_with_message("Failed to load dataset"),
        }
    }

    let dataset = result?;
    info!(
        "Loaded {} transactions ({} to {})",
        dataset.len(),
        dataset
            .min_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        dataset
            .max_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
    );

    Ok(dataset)
}

/// Parse CSV content from any reader. Rows are numbered from 1, excluding the header.
pub fn read_records<R: std::io::Read>(
    reader: R,
    path: &Path,
    labels: &CategoryLabels,
    progress: Option<&ProgressBar>,
) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let csv_err = |e: csv::Error| LoadError::CsvParse {
        path: path.to_path_buf(),
        source: e,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = Columns::resolve(&headers, path)?;

    let mut records = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let row = idx + 1;
        records.push(parse_row(&record, &columns, row, labels)?);

        if let Some(pb) = progress {
            if row % 10_000 == 0 {
                pb.set_message(format!("Reading transactions... {}", row));
            }
        }
    }

    debug!("Parsed {} rows from {}", records.len(), path.display());
    Ok(Dataset::new(records))
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    row: usize,
    labels: &CategoryLabels,
) -> Result<Transaction> {
    let cell = |idx: usize| record.get(idx).unwrap_or("");
    let invalid = |column: &str, value: &str| LoadError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        row,
    };

    let customer_id = cell(columns.customer_id);
    if customer_id.is_empty() {
        return Err(invalid(COL_CUSTOMER_ID, customer_id));
    }

    let raw_date = cell(columns.purchase_date);
    let purchase_date = parse_date(raw_date).ok_or_else(|| invalid(COL_PURCHASE_DATE, raw_date))?;

    let raw_age = cell(columns.age);
    let age = parse_age(raw_age).ok_or_else(|| invalid(COL_AGE, raw_age))?;

    let raw_amount = cell(columns.total_amount);
    let total_purchase_amount = raw_amount
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| invalid(COL_TOTAL_AMOUNT, raw_amount))?;

    // A blank returns cell means unknown; a blank churn cell means not churned.
    let raw_returns = cell(columns.returns);
    let returns = if raw_returns.is_empty() {
        None
    } else {
        Some(parse_flag(raw_returns).ok_or_else(|| invalid(COL_RETURNS, raw_returns))?)
    };

    let raw_churn = cell(columns.churn);
    let churn = !raw_churn.is_empty()
        && parse_flag(raw_churn).ok_or_else(|| invalid(COL_CHURN, raw_churn))?;

    Ok(Transaction {
        customer_id: customer_id.to_string(),
        customer_name: cell(columns.customer_name).to_string(),
        purchase_date,
        gender: cell(columns.gender).to_string(),
        age,
        product_category: labels.relabel(cell(columns.product_category)),
        payment_method: cell(columns.payment_method).to_string(),
        total_purchase_amount,
        returns,
        churn,
    })
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, dropping any time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn parse_age(value: &str) -> Option<u32> {
    value
        .parse::<u32>()
        .ok()
        .or_else(|| {
            // Some exports write integer columns as floats ("34.0").
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
                .map(|v| v as u32)
        })
        .filter(|age| *age > 0)
}

/// Parse a 0/1 flag.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "0" | "0.0" | "false" => Some(false),
        "1" | "1.0" | "true" => Some(true),
        _ => None,
    }
}
