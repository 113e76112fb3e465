//! Site-Trawler main entry point
//!
//! This is the command-line interface for the Site-Trawler crawler.

use anyhow::Context;
use clap::Parser;
use site_trawler::config::{compute_config_hash, parse_config, validate, Config};
use site_trawler::extract::HtmlExtractor;
use site_trawler::output::print_statistics;
use site_trawler::CrawlScheduler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Trawler: a polite single-site crawler
///
/// Site-Trawler seeds from the site's sitemap (or the base URL), follows links
/// within depth and page budgets, respects robots.txt and per-host delays, and
/// extracts a structured record from every page it fetches.
#[derive(Parser, Debug)]
#[command(name = "site-trawler")]
#[command(version)]
#[command(about = "A polite single-site crawler", long_about = None)]
struct Cli {
    /// Base URL to crawl (overrides `base-url` from the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<u32>,

    /// Delay between requests to the same host, in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Only follow links on the base URL's host
    #[arg(long)]
    restrict_domain: bool,

    /// Number of concurrent fetch workers
    #[arg(long)]
    workers: Option<u32>,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Where to write the visited URL list
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Write extracted results as JSON lines to this file
    #[arg(long, value_name = "FILE")]
    results: Option<String>,

    /// Write extracted results as CSV to this file
    #[arg(long, value_name = "FILE")]
    csv: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            interrupt.cancel();
        }
    });

    let scheduler = CrawlScheduler::new(config.crawler.clone(), Arc::new(HtmlExtractor::new()))
        .context("Failed to start crawler")?;
    let output = scheduler
        .run_with_cancellation(cancel)
        .await
        .context("Crawl aborted")?;

    output
        .write_files(&config.output)
        .context("Failed to write crawl output")?;

    if !cli.quiet {
        println!();
        print_statistics(&output.stats);
    }

    // Per-page failures are reported above and never change the exit code
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_trawler=info,warn"),
            1 => EnvFilter::new("site_trawler=debug,info"),
            2 => EnvFilter::new("site_trawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads a config file without validating it; CLI overrides come first
fn load_file(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let config = parse_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let hash = compute_config_hash(path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let crawler = &mut config.crawler;
    if let Some(url) = &cli.url {
        crawler.base_url = url.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        crawler.max_depth = max_depth;
    }
    if let Some(max_pages) = cli.max_pages {
        crawler.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        crawler.request_delay_seconds = delay;
    }
    if let Some(user_agent) = &cli.user_agent {
        crawler.user_agent = user_agent.clone();
    }
    if cli.restrict_domain {
        crawler.restrict_to_base_domain = true;
    }
    if let Some(workers) = cli.workers {
        crawler.workers = workers;
    }
    if let Some(timeout) = cli.timeout {
        crawler.request_timeout_seconds = timeout;
    }

    let output = &mut config.output;
    if let Some(path) = &cli.output {
        output.urls_path = path.clone();
    }
    if let Some(path) = &cli.results {
        output.results_path = Some(path.clone());
    }
    if let Some(path) = &cli.csv {
        output.csv_path = Some(path.clone());
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn print_dry_run(config: &Config) {
    let crawler = &config.crawler;
    println!("=== Site-Trawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", crawler.base_url);
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Restrict to base domain: {}", crawler.restrict_to_base_domain);
    println!("  Request delay: {}s", crawler.request_delay_seconds);
    println!("  Request timeout: {}s", crawler.request_timeout_seconds);
    println!("  Workers: {}", crawler.workers);
    println!("  User agent: {}", crawler.user_agent);

    println!("\nOutput:");
    println!("  URL list: {}", config.output.urls_path);
    if let Some(path) = &config.output.results_path {
        println!("  JSON lines: {}", path);
    }
    if let Some(path) = &config.output.csv_path {
        println!("  CSV: {}", path);
    }

    println!("\n✓ Configuration is valid");
}
