//! Browser capability used by the fetcher
//!
//! A [`BrowserSession`] is one tab-like context that can navigate, expose the
//! rendered text and markup of the current page, and take a screenshot.
//! Sessions are not shared between concurrent fetches: each crawl worker owns
//! one session obtained from a [`SessionFactory`].
//!
//! Two implementations ship with the crate:
//! - [`ChromeLauncher`] / [`ChromeSession`]: headless Chromium over CDP
//! - [`ScriptedBrowser`]: in-memory pages with scripted delays and failures

mod chrome;
mod scripted;

pub use chrome::{find_browser_executable, ChromeLauncher, ChromeSession};
pub use scripted::{ScriptedBrowser, ScriptedPage};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by browser sessions
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Failed to capture screenshot: {0}")]
    Screenshot(String),
}

/// A single browsing context
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url`, waiting at most `timeout` for the load to finish
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Visible text of the current page body
    async fn current_text(&mut self) -> Result<String, BrowserError>;

    /// Serialized DOM of the current page
    async fn current_markup(&mut self) -> Result<String, BrowserError>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError>;

    /// Releases the underlying browser resources
    async fn close(&mut self) {}
}

/// Opens browser sessions for crawl workers
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
