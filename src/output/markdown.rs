//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a scan,
//! including run counters, contact channel analytics and the lead list.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::crawler::RunReport;
use crate::output::stats::ContactDistribution;
use crate::output::OutputResult;
use crate::state::LeadRecord;

/// Leads listed in a summary before the rest is elided
const MAX_LISTED_LEADS: usize = 50;

/// Writes the summary of a finished scan to `output_path`
///
/// # Arguments
///
/// * `report` - The scan report
/// * `config_hash` - Hash of the configuration the scan ran with
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    report: &RunReport,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    write_file(output_path, &format_markdown_summary(report, config_hash))
}

/// Writes a summary of an existing lead table to `output_path`
pub fn export_table_summary(
    leads: &[LeadRecord],
    source: &Path,
    output_path: &Path,
) -> OutputResult<()> {
    write_file(output_path, &format_table_summary(leads, source))
}

fn write_file(path: &Path, markdown: &str) -> OutputResult<()> {
    let mut file = File::create(path)?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

/// Formats a scan report as markdown
pub fn format_markdown_summary(report: &RunReport, config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# Lead Harvester Scan Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Keyword**: {}\n", report.keyword));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        report.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.duration_seconds()
    ));
    md.push_str(&format!("- **Stopped Because**: {}\n", report.stop_reason));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    md.push_str("## Scan Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Seeds | {} |\n", report.seeds));
    md.push_str(&format!("| Pages Visited | {} |\n", report.processed));
    md.push_str(&format!("| Leads | {} |\n", report.leads.len()));
    md.push_str(&format!("| Left in Queue | {} |\n", report.remaining));
    md.push_str(&format!("| Timeouts | {} |\n", report.fetch_timeouts));
    md.push_str(&format!("| Failed Fetches | {} |\n", report.fetch_failures));
    md.push_str(&format!("| Cancelled Fetches | {} |\n", report.cancelled));
    md.push_str(&format!("| Pages Without Contacts | {} |\n", report.empty_pages));
    md.push_str(&format!("| Duplicate Leads | {} |\n", report.duplicate_leads));
    md.push_str(&format!("| Frames Captured | {} |\n", report.frames_captured));
    md.push_str(&format!(
        "| Frames Failed | {} |\n\n",
        report.capture_failures
    ));

    push_leads(&mut md, &report.leads);
    md
}

/// Formats an existing lead table as markdown
pub fn format_table_summary(leads: &[LeadRecord], source: &Path) -> String {
    let mut md = String::new();

    md.push_str("# Lead Harvester Table Summary\n\n");
    md.push_str(&format!("- **Source**: {}\n", source.display()));
    md.push_str(&format!("- **Total Leads**: {}\n\n", leads.len()));

    push_leads(&mut md, leads);
    md
}

fn push_leads(md: &mut String, leads: &[LeadRecord]) {
    let distribution = ContactDistribution::from_leads(leads);

    md.push_str("## Contact Methods\n\n");
    md.push_str("| Channel | Leads | Share |\n");
    md.push_str("|---------|-------|-------|\n");
    for (label, count, percentage) in distribution.rows() {
        md.push_str(&format!("| {} | {} | {:.1}% |\n", label, count, percentage));
    }
    md.push('\n');

    if leads.is_empty() {
        return;
    }

    md.push_str("## Leads\n\n");
    md.push_str("| Company | Website | Emails | Phones | WhatsApp |\n");
    md.push_str("|---------|---------|--------|--------|----------|\n");
    for lead in leads.iter().take(MAX_LISTED_LEADS) {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(&lead.company),
            lead.website,
            lead.emails.len(),
            lead.phones.len(),
            lead.messaging_handles.len()
        ));
    }
    if leads.len() > MAX_LISTED_LEADS {
        md.push_str(&format!(
            "\n... and {} more\n",
            leads.len() - MAX_LISTED_LEADS
        ));
    }
    md.push('\n');
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
