//! eTenders scraper CLI
//!
//! Local execution entry point.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tender_scraper::{
    error::{AppError, Result},
    models::{Config, LoggingConfig, RunReport},
    pipeline,
    services::{BrowserDriver, ListingDriver},
    storage::{LocalStorage, TenderStorage},
};

/// eTenders opportunity scraper
#[derive(Parser, Debug)]
#[command(
    name = "tender-scraper",
    version,
    about = "Scrapes eTenders opportunities into a cumulative register"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the listing and export the results
    Scrape {
        /// Override scraping.date_from (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<NaiveDate>,

        /// Override scraping.date_to (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<NaiveDate>,

        /// Run Chrome without a window
        #[arg(long)]
        headless: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the cumulative store and the last run
    Info,
}

/// Writes log lines to stderr and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize logging from the configured level, raised by `--verbose`.
fn init_logging(verbose: bool, logging: Option<&LoggingConfig>) {
    let level = match (verbose, logging) {
        (true, _) => "debug",
        (false, Some(logging)) => logging.level.as_str(),
        (false, None) => "info",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    if let Some(path) = logging.and_then(|l| l.file.as_deref()) {
        match open_log_file(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
            }
            Err(e) => eprintln!("Could not open log file {}: {e}", path.display()),
        }
    }

    builder.init();
}

async fn scrape(
    mut config: Config,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    headless: bool,
) -> Result<()> {
    if let Some(date) = date_from {
        config.scraping.date_from = date;
    }
    if let Some(date) = date_to {
        config.scraping.date_to = date;
    }
    if headless {
        config.browser.headless = true;
    }
    config.validate()?;

    let storage = LocalStorage::from_config(&config.output);
    let driver = BrowserDriver::launch(&config.browser, &config.selectors, &config.timing).await?;

    let outcome = tokio::select! {
        result = pipeline::run_scraper(&config, &driver, &storage) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Err(e) = driver.close().await {
        log::warn!("Error closing browser: {e}");
    }

    match outcome {
        Some(Ok(Some(_))) => log::info!("Scraping completed successfully"),
        Some(Ok(None)) => log::warn!("Scraping finished without tenders"),
        Some(Err(e)) => {
            log::error!("Scraping failed: {e}");
            return Err(e);
        }
        None => log::warn!("Scraping interrupted by user, nothing was exported"),
    }
    Ok(())
}

async fn info(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    log::info!("Configuration: {}", config_path.display());
    log::info!("Output directory: {}", config.output.dir.display());

    let storage = LocalStorage::from_config(&config.output);
    let cumulative = storage.load_cumulative().await?;
    match cumulative.first() {
        Some(newest) => {
            log::info!("Cumulative store: {} tenders", cumulative.len());
            log::info!("Newest tender: {}", newest.summary_line());
        }
        None => log::info!("No cumulative store found yet."),
    }

    let report_path = config.output_path(&config.output.stats_file);
    match fs::read_to_string(&report_path) {
        Ok(content) => {
            let report: RunReport = serde_json::from_str(&content)?;
            log::info!("Last run finished: {}", report.end_time);
            log::info!(
                "Last run window: {} to {}",
                report.window.from,
                report.window.to
            );
            log::info!(
                "Last run: {} extracted, {} added to the store",
                report.stats.accepted,
                report.cumulative_added
            );
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => log::info!("No run report found yet."),
        Err(e) => return Err(AppError::Io(e)),
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    init_logging(cli.verbose, loaded.as_ref().ok().map(|c| &c.logging));

    match cli.command {
        Command::Scrape {
            date_from,
            date_to,
            headless,
        } => {
            let config = loaded.inspect_err(|e| log::error!("{e}"))?;
            log::info!("Loaded configuration from {}", cli.config.display());
            scrape(config, date_from, date_to, headless).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config)?;
            log::info!("All validations passed!");
        }

        Command::Info => info(&cli.config).await?,
    }

    Ok(())
}
