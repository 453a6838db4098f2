//! Jewel-Scout main entry point
//!
//! This is the command-line interface for the Jewel-Scout listing scraper.

use chrono::Utc;
use clap::Parser;
use jewel_scout::config::{load_config_with_hash, Config, SiteEntry};
use jewel_scout::crawler::{build_http_client, CrawlTarget, ProxyStrategy};
use jewel_scout::listing::{
    download_images, process_row, row_from_listing, DownloadOptions, ImageRequest,
    ListingCursor, ListingSelectors, ProductRecord, COL_IMAGE_PATH, COL_IMAGE_URL,
};
use jewel_scout::normalize::{extract_diawt_value, extract_kt_value};
use jewel_scout::robots::RobotsPolicy;
use jewel_scout::ScoutError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Jewel-Scout: robots-aware jewellery listing scraper
///
/// Jewel-Scout loads each configured storefront listing through an ordered
/// pair of browser proxies, extracts the product grid, normalizes metal and
/// diamond weight from product names, and appends one JSON record per product.
#[derive(Parser, Debug)]
#[command(name = "jewel-scout")]
#[command(version = "1.0.0")]
#[command(about = "A robots-aware jewellery listing scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without opening a browser
    #[arg(long, conflicts_with_all = ["robots", "normalize"])]
    dry_run: bool,

    /// Show the robots verdict for a URL and exit
    #[arg(long, value_name = "URL", conflicts_with_all = ["dry_run", "normalize"])]
    robots: Option<String>,

    /// Show the normalized metal and diamond weight for a product name and exit
    #[arg(long, value_name = "TEXT", conflicts_with_all = ["dry_run", "robots"])]
    normalize: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(url) = cli.robots.as_deref() {
        handle_robots(&config, url).await?;
    } else if let Some(text) = cli.normalize.as_deref() {
        handle_normalize(text);
    } else {
        handle_scrape(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jewel_scout=info,warn"),
            1 => EnvFilter::new("jewel_scout=debug,info"),
            2 => EnvFilter::new("jewel_scout=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Jewel-Scout Dry Run ===\n");

    println!("User Agent: {}", config.user_agent.header_value());

    println!("\nProxies:");
    println!("  Attach endpoint: {}", display_or_unset(&config.proxy.attach.endpoint));
    println!("  Launch server: {}", display_or_unset(&config.proxy.launch.server));
    println!(
        "  Launch credentials: {}",
        if config.proxy.launch.username.is_empty() {
            "none"
        } else {
            "set"
        }
    );
    println!("  Launch headless: {}", config.proxy.launch.headless);

    println!("\nNavigation:");
    println!("  Max attempts: {}", config.navigation.max_attempts);
    println!(
        "  Navigation timeout: {}s",
        config.navigation.navigation_timeout_secs
    );
    println!("  Marker timeout: {}s", config.navigation.marker_timeout_secs);
    println!(
        "  Retry jitter: {}-{}ms",
        config.navigation.jitter_min_ms, config.navigation.jitter_max_ms
    );

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Images: {}", config.images.directory);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
        println!("    * ready: {}", site.ready_selector);
        println!("    * item: {}", site.item_selector);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} listing pages", config.sites.len());
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

/// Handles the --robots mode: prints the verdict and the origin's patterns
async fn handle_robots(config: &Config, url: &str) -> Result<(), ScoutError> {
    let parsed = Url::parse(url)?;
    let client = build_http_client(&config.user_agent)?;
    let policy = RobotsPolicy::new(client, Duration::from_secs(config.robots.timeout_secs));

    let verdict = policy.verdict(&parsed).await;

    println!("URL: {}", parsed);
    println!("Origin: {}", parsed.origin().ascii_serialization());
    println!(
        "Verdict: {}",
        if verdict.disallowed {
            "disallowed (launch proxy first)"
        } else {
            "allowed (attach proxy first)"
        }
    );
    println!("\nDisallow patterns ({}):", verdict.patterns.len());
    for pattern in verdict.patterns.iter() {
        println!("  - {}", pattern);
    }

    Ok(())
}

/// Handles the --normalize mode
fn handle_normalize(text: &str) {
    println!("Text: {}", text);
    println!("Metal: {}", extract_kt_value(text).as_deref().unwrap_or("NA"));
    println!(
        "Diamond weight: {}",
        extract_diawt_value(text).as_deref().unwrap_or("NA")
    );
}

/// Handles the main scrape: every site in order, one at a time
async fn handle_scrape(config: &Config) -> Result<(), ScoutError> {
    tracing::info!("Scraping {} sites", config.sites.len());

    let strategy = ProxyStrategy::from_config(config)?;
    let client = build_http_client(&config.user_agent)?;
    let images = DownloadOptions::from(&config.images);
    let records_path = Path::new(&config.output.records_path);

    let mut total = 0;
    let mut failed = 0;
    for site in &config.sites {
        match scrape_site(&strategy, &client, &images, records_path, site).await {
            Ok(count) => {
                tracing::info!("{}: {} products", site.name, count);
                total += count;
            }
            Err(e) => {
                tracing::error!("{}: scrape failed: {}", site.name, e);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Scrape complete: {} products from {} sites ({} failed), {} robots.txt origins fetched",
        total,
        config.sites.len() - failed,
        failed,
        strategy.robots().origins_fetched().await
    );

    Ok(())
}

/// Scrapes one listing page and appends its records
async fn scrape_site(
    strategy: &ProxyStrategy,
    client: &reqwest::Client,
    images: &DownloadOptions,
    records_path: &Path,
    site: &SiteEntry,
) -> Result<usize, ScoutError> {
    let selectors = ListingSelectors::from_site(site)?;
    let base_url = Url::parse(&site.url)?;
    let target = CrawlTarget::new(&site.url, &site.ready_selector).with_wait_until(site.wait_until);

    let session = strategy.acquire_target(&target).await?;
    let content = session.page().content().await;

    // The session is released before any content error propagates
    if let Err(e) = session.close().await {
        tracing::warn!("{}: failed to close browser session: {}", site.name, e);
    }
    let html = content?;

    let scraped_at = Utc::now();
    let mut rows: Vec<Vec<String>> = ListingCursor::new()
        .advance(&html, &selectors, &base_url)
        .iter()
        .filter(|raw| !raw.name.is_empty())
        .map(|raw| process_row(row_from_listing(&site.name, raw, scraped_at)))
        .collect();

    let stem_prefix = file_stem_prefix(&site.name, scraped_at);
    let requests = rows
        .iter()
        .enumerate()
        .map(|(index, row)| ImageRequest {
            url: Some(row[COL_IMAGE_URL].clone()).filter(|url| !url.is_empty()),
            file_stem: format!("{}-{}", stem_prefix, index),
        })
        .collect();

    let paths = download_images(client, requests, images).await;
    for (row, path) in rows.iter_mut().zip(paths) {
        row[COL_IMAGE_PATH] = path;
    }

    append_records(records_path, &rows).await?;
    Ok(rows.len())
}

fn file_stem_prefix(site: &str, scraped_at: chrono::DateTime<Utc>) -> String {
    let slug: String = site
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}", slug, scraped_at.format("%Y%m%d%H%M%S"))
}

async fn append_records(path: &Path, rows: &[Vec<String>]) -> Result<(), ScoutError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let now = Utc::now();
    for row in rows {
        let line = ProductRecord::from_row(row, now).to_json_line()?;
        file.write_all(line.as_bytes()).await?;
    }
    file.flush().await?;

    Ok(())
}
