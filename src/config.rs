//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ecomdash.toml` files.

use crate::analysis::{Page, DEFAULT_LEADERBOARD_SIZE};
use crate::cli::OutputFormat;
use crate::dataset::{default_category_labels, CategoryLabels};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".ecomdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path. Printed to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the transactions CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Raw product category code -> display label.
    #[serde(default = "default_category_labels")]
    pub category_labels: BTreeMap<String, String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            category_labels: default_category_labels(),
        }
    }
}

impl DataConfig {
    /// The relabel step described by this configuration.
    pub fn labels(&self) -> CategoryLabels {
        CategoryLabels::new(self.category_labels.clone())
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows kept in leaderboards.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Page rendered when no views are requested.
    #[serde(default)]
    pub page: Page,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            page: Page::default(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    DEFAULT_LEADERBOARD_SIZE
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = Some(data.clone());
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(page) = args.page {
            self.report.page = page;
        }

        if let Some(top) = args.top {
            self.report.leaderboard_size = top;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.leaderboard_size, 5);
        assert_eq!(config.report.page, Page::Home);
        assert_eq!(
            config.data.category_labels.get("Books").map(String::as_str),
            Some("Книги")
        );
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "dashboard.md"
format = "json"

[data]
path = "data/ecommerce.csv"

[data.category_labels]
Books = "Books"

[report]
leaderboard_size = 10
page = "purchase"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, Some(PathBuf::from("dashboard.md")));
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.data.path, Some(PathBuf::from("data/ecommerce.csv")));
        assert_eq!(config.data.labels().relabel("Books"), "Books");
        assert_eq!(config.data.labels().relabel("Home"), "Home");
        assert_eq!(config.report.leaderboard_size, 10);
        assert_eq!(config.report.page, Page::Purchase);
    }

    #[test]
    fn test_old_verbose_key_is_ignored() {
        let config: Config = toml::from_str("[general]\nverbose = true\nformat = \"json\"\n").unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);

        let toml_str = Config::default_toml();
        assert!(!toml_str.contains("verbose"));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config: Config = toml::from_str("[report]\nleaderboard_size = 10\n").unwrap();
        let args = Args::parse_from(["ecomdash", "--data", "tx.csv", "--page", "clients"]);

        config.merge_with_args(&args);
        assert_eq!(config.data.path, Some(PathBuf::from("tx.csv")));
        assert_eq!(config.report.page, Page::Clients);
        // Not given on the command line, so the file value stays.
        assert_eq!(config.report.leaderboard_size, 10);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data.category_labels]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.report.leaderboard_size, 5);
    }
}
