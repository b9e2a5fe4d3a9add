/// Substring blacklist applied to email matches
#[derive(Debug, Clone, Default)]
pub struct EmailFilter {
    blacklist: Vec<String>,
}

impl EmailFilter {
    pub fn new(blacklist: &[String]) -> Self {
        Self {
            blacklist: blacklist.iter().map(|entry| entry.to_lowercase()).collect(),
        }
    }

    /// Returns false if the email contains any blacklisted fragment (case-insensitive)
    pub fn accepts(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        !self.blacklist.iter().any(|fragment| email.contains(fragment))
    }
}
