//! Seed discovery from a search engine result page
//!
//! One GET against the configured endpoint, then the result anchors are
//! resolved to their final destinations. Failures never abort a scan: they
//! are logged and degrade to an empty seed list.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::config::SearchConfig;
use crate::state::CandidateUrl;
use crate::url::{resolve_href, unwrap_redirect};

/// Errors raised while discovering seeds
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Invalid search endpoint: {0}")]
    Endpoint(String),

    #[error("Invalid result selector: {0}")]
    Selector(String),

    #[error("No search results matched '{0}'")]
    NoResults(String),
}

/// Search client bound to one endpoint and result layout
#[derive(Debug, Clone)]
pub struct SeedDiscovery {
    client: Client,
    endpoint: Url,
    selector: Selector,
    redirect_param: String,
}

impl SeedDiscovery {
    /// Builds the HTTP client and compiles the result selector
    ///
    /// The search is sent with the browser's user agent; the HTML endpoint
    /// serves a degraded page to unknown clients.
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self, DiscoveryError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| DiscoveryError::Endpoint(format!("{}: {}", config.endpoint, e)))?;

        let selector = Selector::parse(&config.result_selector).map_err(|e| {
            DiscoveryError::Selector(format!("{}: {:?}", config.result_selector, e))
        })?;

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            selector,
            redirect_param: config.redirect_param.clone(),
        })
    }

    /// Returns the seeds for `keyword`, or an empty list if the search failed
    pub async fn discover(&self, keyword: &str) -> Vec<CandidateUrl> {
        match self.try_discover(keyword).await {
            Ok(seeds) => {
                tracing::info!("Discovered {} seed URLs for '{}'", seeds.len(), keyword);
                seeds
            }
            Err(e) => {
                tracing::warn!("Seed discovery for '{}' failed: {}", keyword, e);
                Vec::new()
            }
        }
    }

    /// Like [`discover`](Self::discover) but surfaces the failure
    pub async fn try_discover(&self, keyword: &str) -> Result<Vec<CandidateUrl>, DiscoveryError> {
        let url = self.search_url(keyword);
        tracing::debug!("Searching: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let seeds = parse_results(&body, &url, &self.selector, &self.redirect_param);

        if seeds.is_empty() {
            return Err(DiscoveryError::NoResults(keyword.to_string()));
        }
        Ok(seeds)
    }

    fn search_url(&self, keyword: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", keyword);
        url
    }
}

/// Extracts seed candidates from a result page
///
/// Hrefs are resolved against `base`, redirect wrappers carrying
/// `redirect_param` are replaced by their destination, non-HTTP results are
/// skipped and duplicates (by normalized URL) keep the first occurrence.
pub fn parse_results(
    html: &str,
    base: &Url,
    selector: &Selector,
    redirect_param: &str,
) -> Vec<CandidateUrl> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for anchor in document.select(selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_href(href, base) else {
            tracing::debug!("Skipping search result href: {}", href);
            continue;
        };

        // A wrapper whose destination is not HTTP(S) is dropped, not followed
        let wrapped = resolved.query_pairs().any(|(key, _)| key == redirect_param);
        let destination = unwrap_redirect(resolved.clone(), redirect_param);
        if wrapped && destination == resolved {
            tracing::debug!("Skipping non-HTTP search result: {}", href);
            continue;
        }
        let title = anchor
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match CandidateUrl::new(destination, title, 1) {
            Ok(candidate) => {
                if seen.insert(candidate.key.clone()) {
                    seeds.push(candidate);
                }
            }
            Err(e) => tracing::debug!("Skipping search result {}: {}", href, e),
        }
    }

    seeds
}
