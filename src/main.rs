use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use listing_scraper::app::collect_use_case::{CollectReport, CollectUseCase};
use listing_scraper::browser::{Browser, SnapshotBrowser, WebDriverBrowser};
use listing_scraper::app::ports::ExportPort;
use listing_scraper::config::{Config, ExportFormat, PacingConfig};
use listing_scraper::infra::csv_output_adapter::CsvOutputAdapter;
use listing_scraper::infra::xlsx_output_adapter::XlsxOutputAdapter;
use listing_scraper::logging;
use listing_scraper::observability::metrics;
use listing_scraper::pipeline::{StopSignal, TraversalController};

#[derive(Parser)]
#[command(name = "listing_scraper")]
#[command(about = "Paginated product-listing scraper")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./listing_scraper.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every result page for a search term and export the records
    Run {
        /// Search term; several words are joined with spaces
        #[arg(required = true)]
        term: Vec<String>,
        /// Directory for the exported file
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,
        /// Replay saved pages from this directory instead of opening a browser
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Collect and report, but do not write any file
        #[arg(long)]
        no_export: bool,
        /// Export file format
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        /// Record run counters and write them here in Prometheus text format.
        /// Without it no metrics are recorded.
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Print the effective selector configuration
    Selectors,
}

async fn collect<B: Browser>(
    browser: B,
    config: &Config,
    use_case: &CollectUseCase,
    term: &str,
    stop: StopSignal,
) -> CollectReport {
    let controller = TraversalController::from_config(browser, config, stop);
    use_case.execute(controller, term).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(&config.run.log_dir);

    match cli.command {
        Commands::Run {
            term,
            output_dir,
            max_pages,
            replay,
            no_export,
            format,
            metrics_file,
        } => {
            if let Some(dir) = output_dir {
                config.run.output_dir = dir;
            }
            if max_pages.is_some() {
                config.run.max_pages = max_pages;
            }
            if let Some(format) = format {
                config.run.export_format = format;
            }
            config.validate()?;

            let metrics_handle = match &metrics_file {
                Some(_) => Some(metrics::install_recorder()?),
                None => None,
            };

            let term = term.join(" ");
            let stop = StopSignal::new();
            let signal = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received; stopping after the current step");
                    signal.trigger();
                }
            });

            let use_case = if no_export {
                CollectUseCase::without_export()
            } else {
                let output_dir = &config.run.output_dir;
                let suffix = config.site.file_suffix.as_str();
                let adapter: Box<dyn ExportPort> = match config.run.export_format {
                    ExportFormat::Csv => Box::new(CsvOutputAdapter::new(output_dir, suffix)),
                    ExportFormat::Xlsx => Box::new(XlsxOutputAdapter::new(output_dir, suffix)),
                };
                CollectUseCase::new(adapter)
            };

            println!("🔄 Scraping listings for '{}'...", term);
            let report = match replay {
                Some(dir) => {
                    info!("Replaying saved pages from {}", dir.display());
                    let browser = SnapshotBrowser::from_dir(&dir)?;
                    config.pacing = PacingConfig::disabled();
                    collect(browser, &config, &use_case, &term, stop).await
                }
                None => {
                    let browser = WebDriverBrowser::connect(&config.browser)
                        .await
                        .context("Failed to start the browser session")?;
                    collect(browser, &config, &use_case, &term, stop).await
                }
            };

            println!("\n📊 {}", report);
            if let (Some(handle), Some(path)) = (&metrics_handle, &metrics_file) {
                if let Err(e) = metrics::write_snapshot(handle, path) {
                    warn!("Failed to write metrics: {}", e);
                }
            }
            if !report.is_success() {
                bail!("records were collected but could not be written");
            }
        }
        Commands::Selectors => {
            let s = &config.selectors;
            println!("cards:          {}", s.cards);
            println!("link:           {}", s.link);
            println!("name:           {}", s.name);
            println!("price:          {}", s.price);
            println!("consent:        {}", s.consent);
            println!("next_page:      {}", s.next_page);
            println!("next_page_link: {}", s.next_page_link);
        }
    }

    Ok(())
}
