//! Data model for a scan: candidate URLs, page snapshots and lead records

mod candidate;
mod lead;

pub use candidate::{CandidateUrl, PageSnapshot};
pub use lead::{LeadRecord, LeadStatus};
