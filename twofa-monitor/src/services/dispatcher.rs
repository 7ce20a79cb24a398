//! Per-recipient fan-out of the alert email.
//!
//! Every recipient gets its own send so a single rejected address cannot
//! sink delivery to the rest. Failures are collected and logged once after
//! all attempts; they never abort the batch.

use crate::services::metrics::record_email;
use crate::services::providers::{EmailMessage, EmailProvider, ProviderError};
use lettre::message::Mailbox;
use std::sync::Arc;
use thiserror::Error;

/// Reasons the message could not be sent to anyone.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid sender address {address:?}: {reason}")]
    InvalidSender { address: String, reason: String },

    #[error("email subject must not be empty")]
    EmptySubject,

    #[error("email transport is not enabled")]
    TransportDisabled,
}

/// What happened during one `send` call.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    recipients_attempted: Vec<String>,
    recipients_failed: Vec<(String, ProviderError)>,
}

impl DispatchOutcome {
    /// Distinct addresses a delivery was attempted for, in first-seen order.
    pub fn recipients_attempted(&self) -> &[String] {
        &self.recipients_attempted
    }

    pub fn recipients_failed(&self) -> &[(String, ProviderError)] {
        &self.recipients_failed
    }

    pub fn failed_addresses(&self) -> Vec<&str> {
        self.recipients_failed
            .iter()
            .map(|(address, _)| address.as_str())
            .collect()
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.recipients_failed.last().map(|(_, err)| err)
    }

    pub fn is_success(&self) -> bool {
        self.recipients_failed.is_empty()
    }

    fn record_attempt(&mut self, address: &str) {
        if !self.recipients_attempted.iter().any(|a| a == address) {
            self.recipients_attempted.push(address.to_string());
        }
    }
}

pub struct NotificationDispatcher {
    provider: Arc<dyn EmailProvider>,
    sender: String,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>, sender: impl Into<String>) -> Self {
        Self {
            provider,
            sender: sender.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Send `subject`/`body` to each recipient independently.
    ///
    /// Only a message that cannot be built for anyone is an error; per-recipient
    /// failures are reported through the returned [`DispatchOutcome`].
    #[tracing::instrument(skip_all, fields(recipients = recipients.len(), subject = %subject))]
    pub async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = DispatchOutcome::default();
        if recipients.is_empty() {
            return Ok(outcome);
        }

        self.validate(subject)?;

        for address in recipients {
            outcome.record_attempt(address);

            let message = EmailMessage {
                from: self.sender.clone(),
                to: address.clone(),
                subject: subject.to_string(),
                body_text: body.to_string(),
            };

            match self.provider.send(&message).await {
                Ok(response) => {
                    record_email("sent");
                    tracing::info!(
                        to = %address,
                        message_id = response.provider_id.as_deref().unwrap_or("-"),
                        "Alert message sent"
                    );
                }
                Err(e) => {
                    record_email("failed");
                    tracing::debug!(to = %address, error = %e, "Alert message failed");
                    outcome.recipients_failed.push((address.clone(), e));
                }
            }
        }

        if let Some(last_error) = outcome.last_error() {
            tracing::warn!(
                from = %self.sender,
                failed = %outcome.failed_addresses().join(", "),
                error = %last_error,
                "Error sending 2SV monitor email"
            );
        }

        Ok(outcome)
    }

    fn validate(&self, subject: &str) -> Result<(), DispatchError> {
        if !self.provider.is_enabled() {
            return Err(DispatchError::TransportDisabled);
        }

        self.sender
            .parse::<Mailbox>()
            .map_err(|e| DispatchError::InvalidSender {
                address: self.sender.clone(),
                reason: e.to_string(),
            })?;

        if subject.trim().is_empty() {
            return Err(DispatchError::EmptySubject);
        }

        Ok(())
    }
}
