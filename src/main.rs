//! Lead Harvester main entry point
//!
//! This is the command-line interface for the Lead Harvester contact scanner.

use clap::Parser;
use lead_harvester::config::{load_config_with_hash, Config, MAX_LEAD_QUOTA, MAX_WORKERS};
use lead_harvester::crawler::{run_scan, ScanRequest};
use lead_harvester::output::{
    export_table_summary, load_leads, print_statistics, ContactDistribution,
};
use lead_harvester::LeadRecord;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lead Harvester: keyword-driven contact discovery
///
/// Searches the web for a keyword, renders each result in headless Chromium
/// and collects emails, phone numbers and WhatsApp links into a lead table.
#[derive(Parser, Debug)]
#[command(name = "lead-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Keyword-driven contact discovery", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search keyword, e.g. "garment buying house dhaka"
    #[arg(short, long, required_unless_present_any = ["dry_run", "stats", "export_summary"])]
    keyword: Option<String>,

    /// Stop after this many leads
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=MAX_LEAD_QUOTA as i64))]
    max_leads: Option<u32>,

    /// Capture a frame per visited page and assemble a video
    #[arg(long, conflicts_with = "no_record")]
    record: bool,

    /// Disable recording even if the config enables it
    #[arg(long, conflicts_with = "record")]
    no_record: bool,

    /// Number of parallel browser sessions
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_WORKERS as i64))]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what a scan would do without scanning
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show contact statistics from the existing lead table and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from the existing lead table and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

impl Cli {
    fn record_override(&self) -> Option<bool> {
        if self.record {
            Some(true)
        } else if self.no_record {
            Some(false)
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let prior_leads = load_prior_leads(&config);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli, prior_leads.as_deref());
    } else if cli.stats {
        handle_stats(&config, prior_leads.as_deref());
    } else if cli.export_summary {
        handle_export_summary(&config, prior_leads.as_deref())?;
    } else {
        handle_scan(&config, &cli, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_harvester=info,warn"),
            1 => EnvFilter::new("lead_harvester=debug,info"),
            2 => EnvFilter::new("lead_harvester=trace,debug"),
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

/// Loads the lead table left by a previous scan, if any
fn load_prior_leads(config: &Config) -> Option<Vec<LeadRecord>> {
    let path = Path::new(&config.output.leads_path);
    if !path.exists() {
        return None;
    }

    match load_leads(path) {
        Ok(leads) => {
            tracing::info!("Loaded {} existing leads from {}", leads.len(), path.display());
            Some(leads)
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable lead table {}: {}", path.display(), e);
            None
        }
    }
}

/// Handles the --dry-run mode: validates config and shows what a scan would do
fn handle_dry_run(config: &Config, cli: &Cli, prior_leads: Option<&[LeadRecord]>) {
    println!("=== Lead Harvester Dry Run ===\n");

    println!("Scan:");
    match &cli.keyword {
        Some(keyword) => println!("  Keyword: {}", keyword),
        None => println!("  Keyword: (not given)"),
    }
    println!(
        "  Lead quota: {}",
        cli.max_leads.unwrap_or(config.crawler.max_leads)
    );
    println!(
        "  Workers: {}",
        cli.workers.unwrap_or(config.crawler.workers)
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Settle delay: {}ms", config.crawler.settle_delay_ms);

    println!("\nSearch:");
    println!("  Endpoint: {}", config.search.endpoint);
    println!("  Result selector: {}", config.search.result_selector);
    println!("  Redirect parameter: {}", config.search.redirect_param);

    println!("\nBrowser:");
    println!(
        "  Window: {}x{} ({})",
        config.browser.window_width,
        config.browser.window_height,
        if config.browser.headless {
            "headless"
        } else {
            "headed"
        }
    );
    match &config.browser.executable {
        Some(path) => println!("  Executable: {}", path),
        None => println!("  Executable: auto-detect"),
    }

    println!("\nExtractor:");
    println!("  Phone pattern: {}", config.extractor.phone_pattern);
    println!("  Handle pattern: {}", config.extractor.handle_pattern);
    println!(
        "  Email blacklist: {}",
        config.extractor.email_blacklist.join(", ")
    );

    let record = cli.record_override().unwrap_or(config.capture.enabled);
    println!("\nCapture:");
    println!("  Recording: {}", if record { "on" } else { "off" });
    if record {
        println!("  Frames: {}", config.capture.frames_dir);
        println!(
            "  Video: {} at {} fps",
            config.capture.video_path, config.capture.frame_rate
        );
    }

    println!("\nOutput:");
    println!("  Lead table: {}", config.output.leads_path);
    println!("  Summary: {}", config.output.summary_path);
    if let Some(leads) = prior_leads {
        println!("  Existing leads: {}", leads.len());
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows contact statistics from the lead table
fn handle_stats(config: &Config, prior_leads: Option<&[LeadRecord]>) {
    println!("Lead table: {}\n", config.output.leads_path);

    let leads = prior_leads.unwrap_or_default();
    print_statistics(&ContactDistribution::from_leads(leads));
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(
    config: &Config,
    prior_leads: Option<&[LeadRecord]>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Exporting Lead Summary ===\n");
    println!("Lead table: {}", config.output.leads_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let leads = prior_leads.unwrap_or_default();

    tracing::info!("Generating markdown summary...");
    export_table_summary(
        leads,
        Path::new(&config.output.leads_path),
        Path::new(&config.output.summary_path),
    )?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main scan operation
async fn handle_scan(
    config: &Config,
    cli: &Cli,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ScanRequest {
        keyword: cli.keyword.clone().unwrap_or_default(),
        max_leads: cli.max_leads,
        record: cli.record_override(),
        workers: cli.workers,
    };

    tracing::info!("Starting scan for '{}'", request.keyword);

    match run_scan(config, request, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Scan completed: {} leads in {}s",
                report.leads.len(),
                report.duration_seconds()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            Err(e.into())
        }
    }
}
