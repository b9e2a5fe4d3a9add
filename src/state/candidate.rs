//! Candidate URLs and the page snapshots fetched for them

use chrono::{DateTime, Utc};
use url::Url;

use crate::url::normalize_url;
use crate::UrlError;

/// A URL waiting to be visited
///
/// Created by seed discovery and consumed exactly once by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// The absolute URL to navigate to
    pub url: Url,

    /// Normalized form used for visited-set and lead deduplication
    pub key: String,

    /// Title of the search result that produced this URL
    pub source_title: String,

    /// Link distance from the search results page
    pub depth: u32,
}

impl CandidateUrl {
    /// Builds a candidate, computing its deduplication key
    pub fn new(url: Url, source_title: impl Into<String>, depth: u32) -> Result<Self, UrlError> {
        let key = normalize_url(url.as_str())?.to_string();
        Ok(Self {
            url,
            key,
            source_title: source_title.into(),
            depth,
        })
    }

    /// Parses and builds a seed candidate (depth 1)
    pub fn seed(url: &str, source_title: impl Into<String>) -> Result<Self, UrlError> {
        let url = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::new(url, source_title, 1)
    }
}

/// Rendered content of a page, handed from the fetcher to the extractor
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// Visible text of the rendered body
    pub text: String,

    /// Serialized DOM after client-side rendering
    pub raw_markup: String,

    pub fetched_at: DateTime<Utc>,
}

impl PageSnapshot {
    pub fn new(text: String, raw_markup: String) -> Self {
        Self {
            text,
            raw_markup,
            fetched_at: Utc::now(),
        }
    }
}
