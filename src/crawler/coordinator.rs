//! Crawler coordinator - main scan orchestration logic
//!
//! The coordinator is the single owner of the run state: the frontier, the
//! lead list with its quota, the frame counter and the per-run counters.
//! Fetches run as tokio tasks, one per idle browser session, and their
//! results come back here to be extracted and appended. Because every append
//! goes through this one loop, the quota check and the append cannot race.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::browser::{BrowserError, BrowserSession, SessionFactory};
use crate::capture::CaptureSink;
use crate::config::Config;
use crate::crawler::fetcher::{fetch_page, FetchError, FetchOptions, FetchedPage};
use crate::crawler::progress::{CrawlObserver, LogObserver};
use crate::crawler::scheduler::{progress_percent, Frontier};
use crate::extract::Extractor;
use crate::state::{CandidateUrl, LeadRecord};
use crate::url::truncate_for_display;
use crate::HarvestError;

/// Status lines show at most this many characters of the URL
const STATUS_URL_CHARS: usize = 50;

/// Limits and fetch settings for one scan
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Stop once this many leads have been collected
    pub quota: usize,

    /// Number of browser sessions fetching in parallel
    pub workers: usize,

    pub fetch: FetchOptions,
}

impl CrawlSettings {
    /// Settings from the `[crawler]` section
    pub fn from_config(config: &Config) -> Self {
        Self {
            quota: config.crawler.max_leads as usize,
            workers: config.crawler.workers as usize,
            fetch: FetchOptions {
                timeout: std::time::Duration::from_secs(config.crawler.fetch_timeout_secs),
                settle_delay: std::time::Duration::from_millis(config.crawler.settle_delay_ms),
                capture: false,
            },
        }
    }
}

/// Why a scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaReached,
    QueueExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::QuotaReached => "quota reached",
            StopReason::QueueExhausted => "queue exhausted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a scan
#[derive(Debug, Clone)]
pub struct RunReport {
    pub keyword: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Seeds handed to the coordinator, before deduplication
    pub seeds: usize,

    /// URLs dispatched to a fetcher
    pub processed: usize,

    /// Leads in discovery order
    pub leads: Vec<LeadRecord>,

    /// Candidates still queued when the scan stopped
    pub remaining: usize,

    pub stop_reason: StopReason,
    pub fetch_timeouts: usize,
    pub fetch_failures: usize,

    /// Fetches aborted by the quota cancel signal
    pub cancelled: usize,

    /// Pages that loaded but yielded no contact channel
    pub empty_pages: usize,

    pub duplicate_leads: usize,
    pub frames_captured: u64,
    pub capture_failures: usize,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Mutable state of a running scan, owned by [`Coordinator::run`]
struct RunState {
    quota: usize,
    leads: Vec<LeadRecord>,
    lead_keys: HashSet<String>,
    frame_counter: u64,
    processed: usize,
    fetch_timeouts: usize,
    fetch_failures: usize,
    cancelled: usize,
    empty_pages: usize,
    duplicate_leads: usize,
    capture_failures: usize,
}

impl RunState {
    fn new(quota: usize) -> Self {
        Self {
            quota,
            leads: Vec::new(),
            lead_keys: HashSet::new(),
            frame_counter: 0,
            processed: 0,
            fetch_timeouts: 0,
            fetch_failures: 0,
            cancelled: 0,
            empty_pages: 0,
            duplicate_leads: 0,
            capture_failures: 0,
        }
    }

    fn quota_reached(&self) -> bool {
        self.leads.len() >= self.quota
    }
}

type FetchOutcome = (
    Box<dyn BrowserSession>,
    CandidateUrl,
    Result<FetchedPage, FetchError>,
);

/// Main scan coordinator
pub struct Coordinator {
    settings: CrawlSettings,
    extractor: Extractor,
    sessions: Vec<Box<dyn BrowserSession>>,
    capture: Option<Box<dyn CaptureSink>>,
    observer: Box<dyn CrawlObserver>,
}

impl Coordinator {
    /// Opens one browser session per worker
    ///
    /// A session that fails to launch aborts the scan before any seed is
    /// fetched; sessions already opened are closed first.
    ///
    /// # Arguments
    ///
    /// * `settings` - Quota, worker count and fetch options
    /// * `extractor` - Compiled extraction patterns
    /// * `factory` - Source of browser sessions
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - All sessions are ready
    /// * `Err(HarvestError::Browser)` - A session could not be launched
    pub async fn start(
        settings: CrawlSettings,
        extractor: Extractor,
        factory: &dyn SessionFactory,
    ) -> Result<Self, HarvestError> {
        let workers = settings.workers.max(1);
        let mut sessions: Vec<Box<dyn BrowserSession>> = Vec::with_capacity(workers);

        for worker in 0..workers {
            match factory.open_session().await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::error!("Failed to launch browser session {}: {}", worker, e);
                    for session in sessions.iter_mut() {
                        session.close().await;
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Started {} browser session(s)", sessions.len());

        Ok(Self {
            settings,
            extractor,
            sessions,
            capture: None,
            observer: Box::new(LogObserver),
        })
    }

    /// Enables screenshots, storing each frame in `sink`
    pub fn with_capture(mut self, sink: Box<dyn CaptureSink>) -> Self {
        self.settings.fetch.capture = true;
        self.capture = Some(sink);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Drains the seeds until the queue is empty or the quota is reached
    ///
    /// Per-URL failures are logged and counted; the leads collected so far
    /// are always returned.
    pub async fn run(mut self, keyword: &str, seeds: Vec<CandidateUrl>) -> RunReport {
        let started_at = Utc::now();
        let seed_count = seeds.len();
        let mut frontier = Frontier::from_seeds(seeds);
        let mut state = RunState::new(self.settings.quota);

        tracing::info!(
            "Scanning {} candidate URLs for '{}' (quota {}, {} worker(s))",
            frontier.len(),
            keyword,
            self.settings.quota,
            self.sessions.len()
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut idle = std::mem::take(&mut self.sessions);
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();

        loop {
            while !state.quota_reached() && !idle.is_empty() && !frontier.is_empty() {
                let (Some(mut session), Some(candidate)) = (idle.pop(), frontier.next()) else {
                    break;
                };

                state.processed += 1;
                let progress = progress_percent(state.processed, seed_count);
                self.observer.on_status(
                    &format!(
                        "VISITING: {}",
                        truncate_for_display(candidate.url.as_str(), STATUS_URL_CHARS)
                    ),
                    progress,
                );

                let options = self.settings.fetch.clone();
                let mut cancel = cancel_rx.clone();
                in_flight.spawn(async move {
                    let result = fetch_page(
                        session.as_mut(),
                        candidate.url.as_str(),
                        &options,
                        &mut cancel,
                    )
                    .await;
                    (session, candidate, result)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok((session, candidate, result)) => {
                    idle.push(session);
                    self.handle_outcome(&mut state, candidate, result);

                    if state.quota_reached() && !cancel_tx.send_replace(true) {
                        tracing::info!(
                            "Lead quota of {} reached, cancelling {} in-flight fetch(es)",
                            state.quota,
                            in_flight.len()
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Fetch task failed: {}", e);
                    state.fetch_failures += 1;
                }
            }
        }

        for session in idle.iter_mut() {
            session.close().await;
        }

        let stop_reason = if state.quota_reached() {
            StopReason::QuotaReached
        } else {
            StopReason::QueueExhausted
        };

        self.observer.on_status(
            &format!("COMPLETE: {} leads ({})", state.leads.len(), stop_reason),
            100,
        );

        let report = RunReport {
            keyword: keyword.to_string(),
            started_at,
            finished_at: Utc::now(),
            seeds: seed_count,
            processed: state.processed,
            leads: state.leads,
            remaining: frontier.len(),
            stop_reason,
            fetch_timeouts: state.fetch_timeouts,
            fetch_failures: state.fetch_failures,
            cancelled: state.cancelled,
            empty_pages: state.empty_pages,
            duplicate_leads: state.duplicate_leads,
            frames_captured: state.frame_counter,
            capture_failures: state.capture_failures,
        };

        self.observer.on_complete(&report);
        report
    }

    fn handle_outcome(
        &mut self,
        state: &mut RunState,
        candidate: CandidateUrl,
        result: Result<FetchedPage, FetchError>,
    ) {
        let page = match result {
            Ok(page) => page,
            Err(e) if e.is_cancelled() => {
                tracing::debug!("{}", e);
                state.cancelled += 1;
                return;
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("{}", e);
                state.fetch_timeouts += 1;
                return;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                state.fetch_failures += 1;
                return;
            }
        };

        if let Some(frame) = page.frame {
            self.record_frame(state, frame);
        }

        let entities = self
            .extractor
            .extract(&page.snapshot.text, &page.snapshot.raw_markup);

        let Some(lead) = LeadRecord::from_extraction(&candidate, entities) else {
            tracing::debug!("No contact channels on {}", candidate.url);
            state.empty_pages += 1;
            return;
        };

        if state.quota_reached() {
            tracing::debug!("Quota already reached, dropping lead from {}", candidate.url);
            return;
        }

        if !state.lead_keys.insert(candidate.key.clone()) {
            tracing::debug!("Duplicate lead for {}", candidate.url);
            state.duplicate_leads += 1;
            return;
        }

        self.observer.on_hit(&lead);
        state.leads.push(lead);
    }

    fn record_frame(&mut self, state: &mut RunState, frame: Result<Vec<u8>, BrowserError>) {
        let Some(sink) = self.capture.as_mut() else {
            return;
        };

        let result = frame
            .map_err(|e| e.to_string())
            .and_then(|png| {
                sink.capture(state.frame_counter, &png)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => state.frame_counter += 1,
            Err(e) => {
                tracing::warn!("Frame {} not captured: {}", state.frame_counter, e);
                state.capture_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{ScriptedBrowser, ScriptedPage};
    use crate::capture::FrameDirectory;
    use crate::crawler::progress::RecordingObserver;
    use std::time::Duration;
    use tempfile::TempDir;

    fn settings(quota: usize, workers: usize) -> CrawlSettings {
        CrawlSettings {
            quota,
            workers,
            fetch: FetchOptions {
                timeout: Duration::from_millis(200),
                settle_delay: Duration::from_millis(0),
                capture: false,
            },
        }
    }

    fn seeds(urls: &[&str]) -> Vec<CandidateUrl> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| CandidateUrl::seed(url, format!("Company {}", i)).unwrap())
            .collect()
    }

    fn lead_page(email: &str) -> ScriptedPage {
        ScriptedPage::new(format!("Contact us at {}", email), "<html></html>")
    }

    #[tokio::test]
    async fn test_collects_leads_in_discovery_order() {
        let browser = ScriptedBrowser::new()
            .with_page("https://a.test/", lead_page("a@a.test"))
            .with_page("https://b.test/", ScriptedPage::new("no contacts", ""))
            .with_page("https://c.test/", lead_page("c@c.test"));

        let observer = RecordingObserver::new();
        let coordinator = Coordinator::start(settings(10, 1), Extractor::default(), &browser)
            .await
            .unwrap()
            .with_observer(Box::new(observer.clone()));

        let report = coordinator
            .run("test", seeds(&["https://a.test/", "https://b.test/", "https://c.test/"]))
            .await;

        let websites: Vec<&str> = report.leads.iter().map(|l| l.website.as_str()).collect();
        assert_eq!(websites, vec!["https://a.test/", "https://c.test/"]);
        assert_eq!(report.processed, 3);
        assert_eq!(report.empty_pages, 1);
        assert_eq!(report.stop_reason, StopReason::QueueExhausted);
        assert_eq!(report.remaining, 0);

        let events = observer.events();
        assert_eq!(events.hits, websites);
        assert_eq!(events.statuses.len(), 4);
        assert!(events.statuses[0].0.starts_with("VISITING: https://a.test/"));
        assert_eq!(events.statuses[0].1, 7);
        assert_eq!(events.statuses.last().unwrap().1, 100);
        assert!(events.completed);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let browser = ScriptedBrowser::new()
            .with_page(
                "https://slow.test/",
                lead_page("x@slow.test").with_delay(Duration::from_secs(5)),
            )
            .with_page("https://broken.test/", ScriptedPage::default().failing_navigation())
            .with_page("https://ok.test/", lead_page("ok@ok.test"));

        let coordinator = Coordinator::start(settings(10, 1), Extractor::default(), &browser)
            .await
            .unwrap();

        let report = coordinator
            .run(
                "test",
                seeds(&[
                    "https://slow.test/",
                    "https://broken.test/",
                    "https://missing.test/",
                    "https://ok.test/",
                ]),
            )
            .await;

        assert_eq!(report.leads.len(), 1);
        assert_eq!(report.fetch_timeouts, 1);
        assert_eq!(report.fetch_failures, 2);
        assert_eq!(report.processed, 4);
    }

    #[tokio::test]
    async fn test_quota_stops_early() {
        let mut browser = ScriptedBrowser::new();
        let urls: Vec<String> = (0..5).map(|i| format!("https://lead{}.test/", i)).collect();
        for (i, url) in urls.iter().enumerate() {
            browser = browser.with_page(url, lead_page(&format!("info@lead{}.test", i)));
        }
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let coordinator = Coordinator::start(settings(1, 1), Extractor::default(), &browser)
            .await
            .unwrap();
        let report = coordinator.run("test", seeds(&url_refs)).await;

        assert_eq!(report.leads.len(), 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.remaining, 4);
        assert_eq!(report.stop_reason, StopReason::QuotaReached);
        assert_eq!(browser.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_holds_with_many_workers() {
        let mut browser = ScriptedBrowser::new();
        let urls: Vec<String> = (0..12).map(|i| format!("https://w{}.test/", i)).collect();
        for (i, url) in urls.iter().enumerate() {
            let page = lead_page(&format!("hello@w{}.test", i))
                .with_delay(Duration::from_millis(5 * (i as u64 % 3)));
            browser = browser.with_page(url, page);
        }
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let coordinator = Coordinator::start(settings(3, 4), Extractor::default(), &browser)
            .await
            .unwrap();
        let report = coordinator.run("test", seeds(&url_refs)).await;

        assert_eq!(browser.sessions_opened(), 4);
        assert_eq!(report.leads.len(), 3);
        assert!(report.processed <= 12);
        assert_eq!(report.stop_reason, StopReason::QuotaReached);
    }

    #[tokio::test]
    async fn test_quota_cancels_in_flight_fetches() {
        let browser = ScriptedBrowser::new()
            .with_page("https://fast.test/", lead_page("sales@fast.test"))
            .with_page(
                "https://slow.test/",
                lead_page("sales@slow.test").with_delay(Duration::from_secs(3)),
            );

        let mut settings = settings(1, 2);
        settings.fetch.timeout = Duration::from_secs(10);

        let coordinator = Coordinator::start(settings, Extractor::default(), &browser)
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let report = coordinator
            .run("test", seeds(&["https://fast.test/", "https://slow.test/"]))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(report.leads.len(), 1);
        assert_eq!(report.leads[0].website, "https://fast.test/");
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.fetch_timeouts, 0);
        assert_eq!(report.processed, 2);
        assert_eq!(report.stop_reason, StopReason::QuotaReached);
        assert!(elapsed < Duration::from_secs(1), "run took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_duplicate_seeds_visited_once() {
        let browser =
            ScriptedBrowser::new().with_page("https://acme.test/", lead_page("hi@acme.test"));

        let coordinator = Coordinator::start(settings(10, 1), Extractor::default(), &browser)
            .await
            .unwrap();
        let report = coordinator
            .run(
                "test",
                seeds(&["https://acme.test/", "https://www.acme.test/?utm_source=x"]),
            )
            .await;

        assert_eq!(report.seeds, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.leads.len(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let browser = ScriptedBrowser::new().failing_launch();
        let result = Coordinator::start(settings(1, 2), Extractor::default(), &browser).await;
        assert!(matches!(result, Err(HarvestError::Browser(_))));
    }

    #[tokio::test]
    async fn test_capture_frames_counted_independently_of_leads() {
        let temp = TempDir::new().unwrap();
        let frames = FrameDirectory::new(temp.path());

        let browser = ScriptedBrowser::new()
            .with_page("https://a.test/", lead_page("a@a.test"))
            .with_page("https://b.test/", ScriptedPage::new("nothing here", ""))
            .with_page(
                "https://c.test/",
                lead_page("c@c.test").failing_screenshot(),
            );

        let coordinator = Coordinator::start(settings(10, 1), Extractor::default(), &browser)
            .await
            .unwrap()
            .with_capture(Box::new(frames.clone()));

        let report = coordinator
            .run("test", seeds(&["https://a.test/", "https://b.test/", "https://c.test/"]))
            .await;

        assert_eq!(report.frames_captured, 2);
        assert_eq!(report.capture_failures, 1);
        assert_eq!(report.leads.len(), 2);
        assert!(frames.frame_path(0).exists());
        assert!(frames.frame_path(1).exists());
        assert!(!frames.frame_path(2).exists());
    }
}
