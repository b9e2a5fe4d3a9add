//! Progress reporting for a running scan

use std::sync::{Arc, Mutex};

use crate::crawler::RunReport;
use crate::state::LeadRecord;
use crate::url::truncate_for_display;

/// Company names are shortened to this many characters in hit lines
const HIT_COMPANY_CHARS: usize = 20;

/// Receives progress from the coordinator
///
/// All callbacks run on the coordinator's task, in processing order.
pub trait CrawlObserver: Send {
    /// Called once per dispatched URL with the current progress percentage
    fn on_status(&mut self, line: &str, progress: u8);

    /// Called once per lead appended to the result set
    fn on_hit(&mut self, lead: &LeadRecord);

    fn on_complete(&mut self, _report: &RunReport) {}
}

/// Observer that writes everything to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl CrawlObserver for LogObserver {
    fn on_status(&mut self, line: &str, progress: u8) {
        tracing::info!("[{:>3}%] {}", progress, line);
    }

    fn on_hit(&mut self, lead: &LeadRecord) {
        tracing::info!(
            "HIT: {} ({} emails, {} phones, {} WhatsApp)",
            truncate_for_display(&lead.company, HIT_COMPANY_CHARS),
            lead.emails.len(),
            lead.phones.len(),
            lead.messaging_handles.len()
        );
    }

    fn on_complete(&mut self, report: &RunReport) {
        tracing::info!(
            "Scan for '{}' finished ({}): {} leads from {} pages, {} left in queue",
            report.keyword,
            report.stop_reason,
            report.leads.len(),
            report.processed,
            report.remaining
        );
    }
}

/// Everything a [`RecordingObserver`] has seen
#[derive(Debug, Default, Clone)]
pub struct ObservedEvents {
    /// `(line, progress)` per status callback
    pub statuses: Vec<(String, u8)>,

    /// Website of each hit, in order
    pub hits: Vec<String>,

    pub completed: bool,
}

/// Observer that keeps every callback in memory
///
/// Clones share the same event log, so a clone kept by the caller can inspect
/// what the coordinator reported.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<ObservedEvents>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> ObservedEvents {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl CrawlObserver for RecordingObserver {
    fn on_status(&mut self, line: &str, progress: u8) {
        if let Ok(mut events) = self.events.lock() {
            events.statuses.push((line.to_string(), progress));
        }
    }

    fn on_hit(&mut self, lead: &LeadRecord) {
        if let Ok(mut events) = self.events.lock() {
            events.hits.push(lead.website.clone());
        }
    }

    fn on_complete(&mut self, _report: &RunReport) {
        if let Ok(mut events) = self.events.lock() {
            events.completed = true;
        }
    }
}
