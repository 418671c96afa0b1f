//! ecomdash - e-commerce dashboard analytics from the command line
//!
//! Loads a transactions CSV, applies the requested filters and prints the
//! dashboard views as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, dataset, inverted date range)

use anyhow::{bail, Context, Result};
use ecomdash::analysis::AggregationPipeline;
use ecomdash::cli::{Args, OutputFormat};
use ecomdash::config::{Config, CONFIG_FILE_NAME};
use ecomdash::dataset::{self, LoadOptions};
use ecomdash::report::{self, Report};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ecomdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ecomdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the dataset path, category labels and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report printed to stdout stays clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the dataset, compute the requested views and write the report.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(data_path) = config.data.path.clone() else {
        bail!("No dataset given. Use --data or set [data] path in {}", CONFIG_FILE_NAME);
    };

    let options = LoadOptions {
        category_labels: config.data.labels(),
        show_progress: !args.quiet,
    };
    let data = dataset::load_csv(&data_path, &options)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    if data.is_empty() {
        warn!("Dataset {} contains no transactions", data_path.display());
    }

    let pipeline =
        AggregationPipeline::new(&data).with_leaderboard_size(config.report.leaderboard_size);
    let selection = args.selection();
    let dataset_name = data_path.display().to_string();

    // Explicit views keep the whole selection; a page narrows it to its own filters.
    let report = if args.view.is_empty() {
        info!("Rendering page: {}", config.report.page);
        Report::for_page(&pipeline, &dataset_name, config.report.page, &selection)?
    } else {
        Report::for_views(&pipeline, &dataset_name, &args.view, &selection)?
    };
    info!(
        "Selection matched {} of {} transactions",
        report.metadata.matched_transactions, report.metadata.total_transactions
    );

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
