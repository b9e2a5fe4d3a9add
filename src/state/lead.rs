//! Lead records produced by a scan

use std::collections::BTreeSet;
use std::fmt;

use crate::extract::ExtractedEntities;
use crate::state::CandidateUrl;

/// Verification status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    /// At least one contact channel was extracted from the rendered page
    Verified,
}

impl LeadStatus {
    /// Label written to the `Status` column of the lead table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "Verified",
        }
    }

    /// Parses a `Status` column value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Verified" => Some(Self::Verified),
            _ => None,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page with at least one extracted contact channel
///
/// Never constructed with all three channel sets empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRecord {
    pub company: String,
    /// Unique key within a run
    pub website: String,
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub messaging_handles: BTreeSet<String>,
    pub status: LeadStatus,
}

impl LeadRecord {
    /// Materializes a lead for `candidate`, or `None` if nothing was extracted
    pub fn from_extraction(candidate: &CandidateUrl, entities: ExtractedEntities) -> Option<Self> {
        Self::new(
            candidate.source_title.clone(),
            candidate.url.to_string(),
            entities.emails,
            entities.phones,
            entities.handles,
        )
    }

    /// Builds a verified lead, or `None` if every channel set is empty
    pub fn new(
        company: String,
        website: String,
        emails: BTreeSet<String>,
        phones: BTreeSet<String>,
        messaging_handles: BTreeSet<String>,
    ) -> Option<Self> {
        if emails.is_empty() && phones.is_empty() && messaging_handles.is_empty() {
            return None;
        }

        Some(Self {
            company,
            website,
            emails,
            phones,
            messaging_handles,
            status: LeadStatus::Verified,
        })
    }

    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn has_phone(&self) -> bool {
        !self.phones.is_empty()
    }

    pub fn has_messaging(&self) -> bool {
        !self.messaging_handles.is_empty()
    }
}
