use crate::models::AuditResult;

/// Subject and plain-text body of the alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertReport {
    pub subject: String,
    pub body: String,
}

impl AlertReport {
    pub fn new(workspace: &str, flagged: &AuditResult) -> Self {
        let subject = format!(
            "{} {} members do not have 2SV enabled",
            flagged.len(),
            workspace
        );

        let body = flagged
            .iter()
            .map(|member| format!("{} - {}\n", member.display_name, member.handle))
            .collect();

        Self { subject, body }
    }
}

impl std::fmt::Display for AlertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.subject)?;
        write!(f, "{}", self.body)
    }
}
