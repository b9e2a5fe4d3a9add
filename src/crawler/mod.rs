//! Crawler module for seed discovery, page fetching and scan coordination
//!
//! This module contains the core scan logic, including:
//! - Seed discovery from a search engine result page
//! - Browser fetching with timeout, settle delay and cancellation
//! - The FIFO frontier and visited set
//! - Overall scan coordination and progress reporting

mod coordinator;
mod fetcher;
mod progress;
mod scheduler;
mod search;

pub use coordinator::{Coordinator, CrawlSettings, RunReport, StopReason};
pub use fetcher::{fetch_page, FetchError, FetchOptions, FetchedPage};
pub use progress::{CrawlObserver, LogObserver, ObservedEvents, RecordingObserver};
pub use scheduler::{progress_percent, Frontier};
pub use search::{parse_results, DiscoveryError, SeedDiscovery};

use std::path::Path;

use crate::browser::{ChromeLauncher, SessionFactory};
use crate::capture::{assemble_video, load_frames, FrameDirectory};
use crate::config::{validate_quota, validate_workers, Config};
use crate::extract::Extractor;
use crate::output::{generate_markdown_summary, write_leads};
use crate::{ConfigError, HarvestError};

/// Inputs of one scan, overriding the config where set
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub keyword: String,

    /// Lead quota; falls back to `crawler.max-leads`
    pub max_leads: Option<u32>,

    /// Capture frames; falls back to `capture.enabled`
    pub record: Option<bool>,

    /// Browser sessions; falls back to `crawler.workers`
    pub workers: Option<u32>,
}

impl ScanRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }
}

/// Runs a complete scan with headless Chromium
///
/// This is the main entry point for a scan. It will:
/// 1. Validate the request against the config limits
/// 2. Launch the browser sessions (failure is fatal)
/// 3. Discover seeds for the keyword
/// 4. Fetch and extract until the quota or the queue runs out
/// 5. Write the lead table, the video and the markdown summary
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `request` - Keyword and per-run overrides
/// * `config_hash` - Hash recorded in the summary
///
/// # Returns
///
/// * `Ok(RunReport)` - The scan finished; leads may be empty
/// * `Err(HarvestError)` - Invalid request, browser launch or lead table write failed
pub async fn run_scan(
    config: &Config,
    request: ScanRequest,
    config_hash: &str,
) -> Result<RunReport, HarvestError> {
    let launcher = ChromeLauncher::new(config.browser.clone());
    run_scan_with(config, request, config_hash, &launcher).await
}

/// Same as [`run_scan`] with a caller-provided browser
pub async fn run_scan_with(
    config: &Config,
    request: ScanRequest,
    config_hash: &str,
    factory: &dyn SessionFactory,
) -> Result<RunReport, HarvestError> {
    let keyword = request.keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(HarvestError::InvalidRequest(
            "keyword must not be empty".to_string(),
        ));
    }

    let quota = request.max_leads.unwrap_or(config.crawler.max_leads);
    validate_quota(quota)?;
    let workers = request.workers.unwrap_or(config.crawler.workers);
    validate_workers(workers)?;
    let record = request.record.unwrap_or(config.capture.enabled);

    let extractor = Extractor::new(&config.extractor)
        .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

    let mut settings = CrawlSettings::from_config(config);
    settings.quota = quota as usize;
    settings.workers = workers as usize;

    let discovery = match SeedDiscovery::new(&config.search, &config.browser.user_agent) {
        Ok(discovery) => Some(discovery),
        Err(e) => {
            tracing::warn!("Seed discovery unavailable: {}", e);
            None
        }
    };

    let mut coordinator = Coordinator::start(settings, extractor, factory).await?;

    // Earlier frames are only cleared once the browser is known to work
    let frames = if record {
        let frames = FrameDirectory::new(&config.capture.frames_dir);
        match frames.reset() {
            Ok(()) => Some(frames),
            Err(e) => {
                tracing::warn!(
                    "Cannot prepare frames directory {}, recording disabled: {}",
                    frames.path().display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };
    if let Some(frames) = &frames {
        coordinator = coordinator.with_capture(Box::new(frames.clone()));
    }

    let seeds = match &discovery {
        Some(discovery) => discovery.discover(&keyword).await,
        None => Vec::new(),
    };

    let report = coordinator.run(&keyword, seeds).await;

    let leads_path = Path::new(&config.output.leads_path);
    if report.leads.is_empty() {
        tracing::info!(
            "No leads found, leaving {} untouched",
            leads_path.display()
        );
    } else {
        write_leads(leads_path, &report.leads).map_err(HarvestError::Persistence)?;
        tracing::info!(
            "Wrote {} leads to {}",
            report.leads.len(),
            leads_path.display()
        );
    }

    if let Some(frames) = &frames {
        if report.frames_captured > 0 {
            record_video(frames, config.capture.frame_rate, &config.capture.video_path).await;
        } else {
            tracing::info!("No frames captured, skipping video");
        }
    }

    let summary_path = Path::new(&config.output.summary_path);
    if let Err(e) = generate_markdown_summary(&report, config_hash, summary_path) {
        tracing::warn!("Failed to write summary {}: {}", summary_path.display(), e);
    }

    Ok(report)
}

async fn record_video(frames: &FrameDirectory, frame_rate: u32, video_path: &str) {
    let buffers = match load_frames(frames.path()) {
        Ok(buffers) => buffers,
        Err(e) => {
            tracing::warn!("Failed to load frames: {}", e);
            return;
        }
    };

    match assemble_video(&buffers, frame_rate, Path::new(video_path)).await {
        Ok(true) => tracing::info!("Recording saved to {}", video_path),
        Ok(false) => tracing::info!("No frames to encode"),
        Err(e) => tracing::warn!("Video assembly failed: {:#}", e),
    }
}
