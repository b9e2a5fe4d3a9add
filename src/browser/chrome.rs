//! Headless Chromium sessions over the DevTools protocol

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::{BrowserError, BrowserSession, SessionFactory};
use crate::config::BrowserConfig;

/// Counter giving every session its own profile directory
static SESSION_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Finds a Chrome/Chromium executable on this machine
///
/// `CHROMIUM_PATH` wins over the platform search paths; on Unix `which` is
/// consulted last.
pub fn find_browser_executable() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Some(path);
        }
        tracing::warn!(
            "CHROMIUM_PATH points to a missing file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(path) = candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    {
        tracing::info!("Found browser at: {}", path.display());
        return Some(path);
    }

    if cfg!(target_os = "windows") {
        return None;
    }

    for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
        let Ok(output) = Command::new("which").arg(cmd).output() else {
            continue;
        };
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                tracing::info!("Found browser using 'which': {}", path);
                return Some(PathBuf::from(path));
            }
        }
    }

    None
}

/// Downloads a managed Chromium build into the temp directory
async fn download_managed_browser() -> Result<PathBuf, BrowserError> {
    tracing::info!("No local Chrome found, downloading managed Chromium...");

    let cache_dir = std::env::temp_dir().join("lead_harvester_chromium");
    std::fs::create_dir_all(&cache_dir)
        .map_err(|e| BrowserError::Launch(format!("Failed to create cache dir: {}", e)))?;

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .map_err(|e| BrowserError::Launch(format!("Invalid fetcher options: {}", e)))?;

    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .map_err(|e| BrowserError::Launch(format!("Failed to download Chromium: {}", e)))?;

    tracing::info!("Downloaded Chromium to: {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

/// Launches one headless Chromium process per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    async fn resolve_executable(&self) -> Result<PathBuf, BrowserError> {
        if let Some(path) = &self.config.executable {
            return Ok(PathBuf::from(path));
        }
        match find_browser_executable() {
            Some(path) => Ok(path),
            None => download_managed_browser().await,
        }
    }

    fn build_config(
        &self,
        executable: PathBuf,
        user_data_dir: PathBuf,
    ) -> Result<CdpConfig, BrowserError> {
        let builder = CdpConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(user_data_dir)
            .window_size(self.config.window_width, self.config.window_height)
            .request_timeout(Duration::from_secs(30))
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!(
                "--window-size={},{}",
                self.config.window_width, self.config.window_height
            ))
            .arg(format!("--user-agent={}", self.config.user_agent));

        let builder = if self.config.headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("Invalid browser config: {}", e)))
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let executable = self.resolve_executable().await?;

        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        let user_data_dir = std::env::temp_dir().join(format!(
            "lead_harvester_chrome_{}_{}",
            std::process::id(),
            seq
        ));
        std::fs::create_dir_all(&user_data_dir).map_err(|e| {
            BrowserError::Launch(format!("Failed to create user data dir: {}", e))
        })?;

        let cdp_config = self.build_config(executable, user_data_dir.clone())?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler must be polled for the connection to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("Failed to open page: {}", e)))?;

        tracing::debug!("Browser session {} ready", seq);

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler,
            user_data_dir: Some(user_data_dir),
        }))
    }
}

/// A Chromium process with a single page
///
/// Dropping the session aborts the CDP handler task and removes the profile
/// directory; [`BrowserSession::close`] additionally waits for the process to
/// exit.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl ChromeSession {
    fn cleanup_profile(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                tracing::warn!(
                    "Failed to remove browser profile {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn current_text(&mut self) -> Result<String, BrowserError> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))?;

        let text = body
            .inner_text()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))?;

        Ok(text.unwrap_or_default())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        };

        self.page
            .screenshot(params)
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser wait failed: {}", e);
        }
        self.handler.abort();
        self.cleanup_profile();
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
        self.cleanup_profile();
    }
}
