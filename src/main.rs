//! Email-Scout main entry point
//!
//! This is the command-line interface for the Email-Scout crawler.

use anyhow::{bail, Context};
use clap::Parser;
use email_scout::config::{load_config_with_hash, Config};
use email_scout::crawler::build_scheduler;
use email_scout::output::{export_cache_csv, print_cache_stats, write_report};
use email_scout::VisitedUrlCache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Email-Scout: a polite contact-address crawler
///
/// Email-Scout crawls each seed site within page, depth and domain limits,
/// extracts and scores email addresses, and remembers crawled seeds so that
/// re-runs skip them.
#[derive(Parser, Debug)]
#[command(name = "email-scout")]
#[command(version)]
#[command(about = "A polite contact-address crawler", long_about = None)]
struct Cli {
    /// Seed URLs to crawl
    #[arg(value_name = "SEEDS")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File with one seed URL per line; `#` starts a comment
    #[arg(long, value_name = "FILE")]
    seeds_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl seeds even if they were crawled before
    #[arg(long)]
    force: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Show visited-URL cache statistics and exit
    #[arg(long)]
    cache_stats: bool,

    /// Export the visited-URL cache as CSV and exit
    #[arg(long, value_name = "FILE")]
    export_cache: Option<PathBuf>,

    /// Remove every entry from the visited-URL cache and exit
    #[arg(long)]
    clear_cache: bool,

    /// Remove one URL from the visited-URL cache and exit
    #[arg(long, value_name = "URL")]
    forget: Option<String>,

    /// Remove cache entries not visited for this many days and exit
    #[arg(long, value_name = "DAYS")]
    cleanup_days: Option<u32>,
}

impl Cli {
    fn is_cache_command(&self) -> bool {
        self.cache_stats
            || self.export_cache.is_some()
            || self.clear_cache
            || self.forget.is_some()
            || self.cleanup_days.is_some()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if cli.force {
        config.crawler.force_rescrape = true;
    }

    if cli.is_cache_command() {
        return handle_cache_commands(&cli, &config);
    }

    let seeds = collect_seeds(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    if seeds.is_empty() {
        bail!("No seed URLs given; pass URLs as arguments or use --seeds-file");
    }

    handle_crawl(config, config_hash, seeds).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("email_scout=info,warn"),
            1 => EnvFilter::new("email_scout=debug,info"),
            2 => EnvFilter::new("email_scout=trace,debug"),
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

/// Gathers seeds from the command line and the seeds file, in that order
fn collect_seeds(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut seeds = cli.seeds.clone();
    if let Some(path) = &cli.seeds_file {
        seeds.extend(read_seeds_file(path)?);
    }
    Ok(seeds)
}

fn read_seeds_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seeds file {}", path.display()))?;

    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Handles the cache maintenance flags; each one runs and the process exits
fn handle_cache_commands(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let cache = VisitedUrlCache::open(&config.cache);
    println!("Cache: {}\n", cache.describe());

    if let Some(url) = &cli.forget {
        if cache.remove(url) {
            println!("✓ Removed {}", url);
        } else {
            println!("{} was not in the cache", url);
        }
    }

    if let Some(days) = cli.cleanup_days {
        let removed = cache.cleanup_older_than(days);
        println!("✓ Removed {} entries older than {} days", removed, days);
    }

    if cli.clear_cache {
        let removed = cache.clear();
        println!("✓ Cleared {} entries", removed);
    }

    if let Some(path) = &cli.export_cache {
        export_cache_csv(&cache.export_snapshot(), path)
            .with_context(|| format!("Failed to export cache to {}", path.display()))?;
        println!("✓ Exported {} entries to {}", cache.len(), path.display());
    }

    if cli.cache_stats {
        print_cache_stats(&cache.stats());
    }

    cache.flush().context("Failed to save URL cache")?;
    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Email-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages per site: {}", config.crawler.max_pages_per_site);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Max concurrent sites: {}", config.crawler.max_concurrent_sites);
    println!("  Max links per page: {}", config.crawler.max_links_per_page);
    println!("  Force rescrape: {}", config.crawler.force_rescrape);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nUser Agent: {}", config.user_agent.user_agent_string());

    println!("\nExtraction:");
    println!("  Min confidence: {:.2}", config.extraction.min_confidence);
    println!("  Validate DNS: {}", config.extraction.validate_dns);
    println!("  Exclude patterns: {}", config.extraction.exclude_patterns.len());
    println!("  Disposable domains: {}", config.extraction.disposable_domains.len());

    println!("\nCache: {} ({:?})", config.cache.path.display(), config.cache.backend);
    println!(
        "Output: {} ({})",
        config.output.directory.display(),
        config.output.format.extension()
    );

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: Option<String>, seeds: Vec<String>) -> anyhow::Result<()> {
    tracing::info!("Total seed URLs: {}", seeds.len());

    let cache = Arc::new(VisitedUrlCache::open(&config.cache));
    let scheduler = build_scheduler(&config, Arc::clone(&cache)).context("Invalid crawler configuration")?;

    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing running site crawls");
            shutdown.trigger();
        }
    });

    let report = scheduler.run_all(seeds.as_slice()).await;

    let paths = write_report(&report, &config.output, config_hash.as_deref())
        .context("Failed to write report")?;

    println!(
        "✓ {} unique emails from {} sites ({} failed, {} cached)",
        report.emails.len(),
        report.outcomes.len(),
        report.sites_failed(),
        report.sites_from_cache()
    );
    println!("✓ Report written to: {}", paths.report.display());
    if let Some(summary) = paths.summary {
        println!("✓ Summary written to: {}", summary.display());
    }
    if !report.not_started.is_empty() {
        println!("! {} seeds not started because of the interrupt", report.not_started.len());
    }

    Ok(())
}
