//! Page fetcher
//!
//! This module performs a single navigation through a browser session and
//! returns the rendered content. It handles:
//! - A hard timeout over navigation, settle delay and content reads
//! - The fixed settle delay after the page loads
//! - Optional screenshot capture, which never fails the fetch
//! - Cooperative cancellation through a run-level watch flag

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::browser::{BrowserError, BrowserSession};
use crate::state::PageSnapshot;

/// Per-fetch settings derived from `[crawler]` and `[capture]`
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound on the whole fetch
    pub timeout: Duration,

    /// Pause between navigation and reading the page
    pub settle_delay: Duration,

    /// Take a screenshot after the settle delay
    pub capture: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(1000),
            capture: false,
        }
    }
}

/// Why a single URL could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Failed to read {url}: {message}")]
    Read { url: String, message: String },

    #[error("Fetch of {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

/// Rendered page plus the screenshot outcome, if one was requested
#[derive(Debug)]
pub struct FetchedPage {
    pub snapshot: PageSnapshot,

    /// `None` when capture is disabled
    pub frame: Option<Result<Vec<u8>, BrowserError>>,
}

/// Fetches a URL through `session`
///
/// # Arguments
///
/// * `session` - The browser session owned by the calling worker
/// * `url` - The URL to navigate to
/// * `options` - Timeout, settle delay and capture settings
/// * `cancel` - Run-level cancel flag; once it reads `true` the fetch stops
///
/// # Returns
///
/// * `Ok(FetchedPage)` - Rendered text and markup, plus the frame if requested
/// * `Err(FetchError)` - The item should be skipped
pub async fn fetch_page(
    session: &mut dyn BrowserSession,
    url: &str,
    options: &FetchOptions,
    cancel: &mut watch::Receiver<bool>,
) -> Result<FetchedPage, FetchError> {
    if *cancel.borrow() {
        return Err(FetchError::Cancelled {
            url: url.to_string(),
        });
    }

    let load = load_page(session, url, options);

    tokio::select! {
        biased;

        _ = wait_for_cancel(cancel) => Err(FetchError::Cancelled {
            url: url.to_string(),
        }),

        result = tokio::time::timeout(options.timeout, load) => match result {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: options.timeout,
            }),
        },
    }
}

async fn load_page(
    session: &mut dyn BrowserSession,
    url: &str,
    options: &FetchOptions,
) -> Result<FetchedPage, FetchError> {
    session
        .navigate(url, options.timeout)
        .await
        .map_err(|e| classify_navigation_error(url, e))?;

    tokio::time::sleep(options.settle_delay).await;

    let frame = if options.capture {
        Some(session.screenshot().await)
    } else {
        None
    };

    let text = session.current_text().await.map_err(|e| FetchError::Read {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let markup = session.current_markup().await.map_err(|e| FetchError::Read {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(FetchedPage {
        snapshot: PageSnapshot::new(text, markup),
        frame,
    })
}

fn classify_navigation_error(url: &str, error: BrowserError) -> FetchError {
    match error {
        BrowserError::NavigationTimeout { timeout, .. } => FetchError::Timeout {
            url: url.to_string(),
            timeout,
        },
        BrowserError::Content(message) => FetchError::Read {
            url: url.to_string(),
            message,
        },
        other => FetchError::Navigation {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

/// Resolves once the flag is set; never resolves if the sender is gone
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    let sender_dropped = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if sender_dropped {
        std::future::pending::<()>().await;
    }
}
