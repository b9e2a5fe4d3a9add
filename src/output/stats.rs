//! Contact channel analytics over a lead table
//!
//! Counts how many leads can be reached by email, phone and WhatsApp. The
//! same figures are printed by `--stats` and written into the summary.

use crate::state::LeadRecord;

/// Per-channel lead counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactDistribution {
    pub total: usize,
    pub with_email: usize,
    pub with_phone: usize,
    pub with_whatsapp: usize,
}

impl ContactDistribution {
    pub fn from_leads(leads: &[LeadRecord]) -> Self {
        Self {
            total: leads.len(),
            with_email: leads.iter().filter(|lead| lead.has_email()).count(),
            with_phone: leads.iter().filter(|lead| lead.has_phone()).count(),
            with_whatsapp: leads.iter().filter(|lead| lead.has_messaging()).count(),
        }
    }

    /// Share of all leads, 0.0 for an empty table
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }

    pub fn email_percentage(&self) -> f64 {
        self.percentage(self.with_email)
    }

    pub fn phone_percentage(&self) -> f64 {
        self.percentage(self.with_phone)
    }

    pub fn whatsapp_percentage(&self) -> f64 {
        self.percentage(self.with_whatsapp)
    }

    /// `(label, count, percentage)` rows, largest channel first
    pub fn rows(&self) -> Vec<(&'static str, usize, f64)> {
        let mut rows = vec![
            ("Email", self.with_email, self.email_percentage()),
            ("WhatsApp", self.with_whatsapp, self.whatsapp_percentage()),
            ("Phone", self.with_phone, self.phone_percentage()),
        ];
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}

/// Prints the distribution to stdout in a formatted manner
///
/// # Arguments
///
/// * `distribution` - Channel counts of the loaded table
pub fn print_statistics(distribution: &ContactDistribution) {
    println!("=== Lead Statistics ===\n");

    println!("Overview:");
    println!("  Total leads: {}", distribution.total);
    println!();

    if distribution.total == 0 {
        println!("No leads in the table yet.");
        return;
    }

    println!("Contact Methods:");
    for (label, count, percentage) in distribution.rows() {
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
}
