//! Output module for lead tables and scan reports
//!
//! This module handles:
//! - Writing and loading the lead table (CSV)
//! - Contact channel analytics over a set of leads
//! - Generating markdown summaries of a scan or an existing table

mod leads_csv;
mod markdown;
pub mod stats;

pub use leads_csv::{load_leads, write_leads, LEADS_HEADER};
pub use markdown::{
    export_table_summary, format_markdown_summary, format_table_summary,
    generate_markdown_summary,
};
pub use stats::{print_statistics, ContactDistribution};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
