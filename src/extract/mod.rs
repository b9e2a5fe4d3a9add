//! Entity extraction over rendered page content
//!
//! The extractor is a pure function of its inputs: it holds only compiled
//! patterns and the email blacklist, performs no I/O, and returns ordered sets
//! so repeated calls on the same page produce identical output.
//!
//! - Emails are matched in the rendered text and filtered by the blacklist.
//! - Phone numbers are matched in the rendered text after removing hyphens and
//!   spaces; the pattern's first capture group is the normalized number.
//!   A match touching another digit is part of a longer number and is skipped.
//! - Messaging handles are matched in the raw markup, since click-to-chat links
//!   are usually hidden behind icons rather than shown as text.

mod filters;

use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::ExtractorConfig;
use filters::EmailFilter;

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

/// Contact channels found on a single page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub handles: BTreeSet<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty() && self.handles.is_empty()
    }

    /// Total number of distinct values across all channels
    pub fn len(&self) -> usize {
        self.emails.len() + self.phones.len() + self.handles.len()
    }
}

/// Compiled extraction patterns
#[derive(Debug, Clone)]
pub struct Extractor {
    email_regex: Regex,
    phone_regex: Regex,
    handle_regex: Regex,
    email_filter: EmailFilter,
}

impl Extractor {
    /// Compiles the configured patterns
    ///
    /// Patterns are checked during config validation, so this only fails for
    /// configs built in code without going through `validate`.
    pub fn new(config: &ExtractorConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            email_regex: Regex::new(EMAIL_PATTERN)?,
            phone_regex: Regex::new(&config.phone_pattern)?,
            handle_regex: Regex::new(&config.handle_pattern)?,
            email_filter: EmailFilter::new(&config.email_blacklist),
        })
    }

    /// Extracts all contact channels from a page
    ///
    /// Empty input yields empty sets.
    pub fn extract(&self, text: &str, markup: &str) -> ExtractedEntities {
        let entities = ExtractedEntities {
            emails: self.extract_emails(text),
            phones: self.extract_phones(text),
            handles: self.extract_handles(markup),
        };

        debug!(
            "Extracted {} emails, {} phones, {} handles",
            entities.emails.len(),
            entities.phones.len(),
            entities.handles.len()
        );
        entities
    }

    /// Matches emails in rendered text, dropping blacklisted matches
    pub fn extract_emails(&self, text: &str) -> BTreeSet<String> {
        self.email_regex
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|email| self.email_filter.accepts(email))
            .map(str::to_string)
            .collect()
    }

    /// Matches mobile numbers after stripping hyphens and spaces from the text
    pub fn extract_phones(&self, text: &str) -> BTreeSet<String> {
        let compact = compact_digits(text);
        digit_bounded_values(&self.phone_regex, &compact)
    }

    /// Matches messaging handles in raw markup
    pub fn extract_handles(&self, markup: &str) -> BTreeSet<String> {
        capture_group_values(&self.handle_regex, markup)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        // The default patterns are constants and always compile
        Self::new(&ExtractorConfig::default()).expect("default extractor patterns are valid")
    }
}

/// Removes the separators people put inside phone numbers
fn compact_digits(text: &str) -> String {
    text.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

/// Like [`capture_group_values`] but drops matches that sit inside a longer
/// run of digits
///
/// A rejected match resumes the search one character later, so a real number
/// overlapping a rejected window is still found.
fn digit_bounded_values(regex: &Regex, haystack: &str) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    let mut pos = 0;

    while pos <= haystack.len() {
        let Some(captures) = regex.captures_at(haystack, pos) else {
            break;
        };
        let Some(whole) = captures.get(0) else {
            break;
        };
        let digit_before = haystack[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        let digit_after = haystack[whole.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());

        if digit_before || digit_after {
            pos = next_char_boundary(haystack, whole.start());
            continue;
        }

        if let Some(value) = captures.get(1) {
            values.insert(value.as_str().to_string());
        }
        pos = if whole.is_empty() {
            next_char_boundary(haystack, whole.end())
        } else {
            whole.end()
        };
    }

    values
}

fn next_char_boundary(haystack: &str, index: usize) -> usize {
    haystack[index..]
        .chars()
        .next()
        .map_or(haystack.len() + 1, |c| index + c.len_utf8())
}

fn capture_group_values(regex: &Regex, haystack: &str) -> BTreeSet<String> {
    regex
        .captures_iter(haystack)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
