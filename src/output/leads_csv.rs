//! Lead table persistence
//!
//! One row per lead with the columns of [`LEADS_HEADER`]. Multi-value cells
//! are joined with `", "`; the file is UTF-8.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::output::{OutputError, OutputResult};
use crate::state::{LeadRecord, LeadStatus};

/// Column names of the lead table, in order
pub const LEADS_HEADER: [&str; 6] = ["Company", "Website", "Emails", "Phones", "WhatsApp", "Status"];

const VALUE_SEPARATOR: &str = ", ";

/// Writes `leads` to `path`, replacing any existing table
///
/// # Arguments
///
/// * `path` - Destination CSV file
/// * `leads` - Leads in discovery order
///
/// # Returns
///
/// * `Ok(())` - Table written and flushed
/// * `Err(OutputError)` - The file could not be created or written
pub fn write_leads(path: &Path, leads: &[LeadRecord]) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(LEADS_HEADER)?;

    for lead in leads {
        let emails = join_values(&lead.emails);
        let phones = join_values(&lead.phones);
        let handles = join_values(&lead.messaging_handles);
        writer.write_record([
            lead.company.as_str(),
            lead.website.as_str(),
            emails.as_str(),
            phones.as_str(),
            handles.as_str(),
            lead.status.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Loads a table written by [`write_leads`]
///
/// Rows without any contact channel are skipped with a warning.
pub fn load_leads(path: &Path) -> OutputResult<Vec<LeadRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns: Vec<&str> = headers.iter().collect();
    if columns != LEADS_HEADER {
        return Err(OutputError::Format(format!(
            "unexpected lead table header: {}",
            columns.join(",")
        )));
    }

    let mut leads = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default();

        let status = LeadStatus::parse(field(5)).ok_or_else(|| {
            OutputError::Format(format!("row {}: unknown status '{}'", line + 1, field(5)))
        })?;

        match LeadRecord::new(
            field(0).to_string(),
            field(1).to_string(),
            split_values(field(2)),
            split_values(field(3)),
            split_values(field(4)),
        ) {
            Some(mut lead) => {
                lead.status = status;
                leads.push(lead);
            }
            None => tracing::warn!("Skipping row {} without contact channels", line + 1),
        }
    }

    Ok(leads)
}

fn join_values(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

fn split_values(cell: &str) -> BTreeSet<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_leads() -> Vec<LeadRecord> {
        vec![
            LeadRecord::new(
                "Acme, Ltd".to_string(),
                "https://acme.test/".to_string(),
                set(&["sales@acme.test", "info@acme.test"]),
                set(&["01712345678"]),
                set(&[]),
            )
            .unwrap(),
            LeadRecord::new(
                "Globex".to_string(),
                "https://globex.test/contact".to_string(),
                set(&[]),
                set(&[]),
                set(&["8801812345678"]),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_write_leads_layout() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("leads.csv");

        write_leads(&path, &sample_leads()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "Company,Website,Emails,Phones,WhatsApp,Status");
        assert_eq!(
            lines[1],
            r#""Acme, Ltd",https://acme.test/,"info@acme.test, sales@acme.test",01712345678,,Verified"#
        );
        assert_eq!(
            lines[2],
            "Globex,https://globex.test/contact,,,8801812345678,Verified"
        );
    }

    #[test]
    fn test_load_leads_restores_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("leads.csv");
        let leads = sample_leads();

        write_leads(&path, &leads).unwrap();
        let loaded = load_leads(&path).unwrap();

        assert_eq!(loaded, leads);
    }

    #[test]
    fn test_load_rejects_foreign_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("other.csv");
        fs::write(&path, "url,status\nhttps://a.test,200\n").unwrap();

        assert!(matches!(load_leads(&path), Err(OutputError::Format(_))));
    }

    #[test]
    fn test_load_skips_rows_without_contacts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("leads.csv");
        fs::write(
            &path,
            "Company,Website,Emails,Phones,WhatsApp,Status\n\
             Empty,https://empty.test/,,,,Verified\n\
             Full,https://full.test/,a@full.test,,,Verified\n",
        )
        .unwrap();

        let loaded = load_leads(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].company, "Full");
    }
}
