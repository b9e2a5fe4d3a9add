//! In-memory browser with scripted pages
//!
//! Used by the test suites in place of a real browser. Pages are keyed by
//! their normalized URL so that `https://acme.test` and `https://acme.test/`
//! resolve to the same entry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserError, BrowserSession, SessionFactory};
use crate::url::normalize_url;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A page served by [`ScriptedBrowser`]
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub text: String,
    pub markup: String,
    /// Time the navigation takes before the page is "loaded"
    pub delay: Duration,
    pub fail_navigation: bool,
    pub fail_screenshot: bool,
}

impl ScriptedPage {
    pub fn new(text: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: markup.into(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_screenshot(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    pages: HashMap<String, ScriptedPage>,
    fail_launch: bool,
    sessions_opened: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

/// Session factory serving scripted pages
#[derive(Debug, Clone, Default)]
pub struct ScriptedBrowser {
    state: Arc<ScriptState>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page; must be called before the browser is shared
    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            state.pages.insert(page_key(url), page);
        }
        self
    }

    /// Makes every `open_session` call fail
    pub fn failing_launch(mut self) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            state.fail_launch = true;
        }
        self
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    /// URLs passed to `navigate`, in call order
    pub fn navigations(&self) -> Vec<String> {
        self.state
            .navigations
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

fn page_key(url: &str) -> String {
    normalize_url(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl SessionFactory for ScriptedBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.state.fail_launch {
            return Err(BrowserError::Launch(
                "scripted browser configured to fail".to_string(),
            ));
        }
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            current: None,
        }))
    }
}

struct ScriptedSession {
    state: Arc<ScriptState>,
    current: Option<(String, ScriptedPage)>,
}

impl ScriptedSession {
    fn current_page(&self) -> Result<&(String, ScriptedPage), BrowserError> {
        self.current
            .as_ref()
            .ok_or_else(|| BrowserError::Content("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        if let Ok(mut urls) = self.state.navigations.lock() {
            urls.push(url.to_string());
        }
        self.current = None;

        let page = self
            .state
            .pages
            .get(&page_key(url))
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })?;

        if page.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(page.delay).await;

        if page.fail_navigation {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        self.current = Some((url.to_string(), page));
        Ok(())
    }

    async fn current_text(&mut self) -> Result<String, BrowserError> {
        Ok(self.current_page()?.1.text.clone())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        Ok(self.current_page()?.1.markup.clone())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        let (url, page) = self.current_page()?;
        if page.fail_screenshot {
            return Err(BrowserError::Screenshot(format!(
                "capture failed for {}",
                url
            )));
        }
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(url.as_bytes());
        Ok(bytes)
    }
}
