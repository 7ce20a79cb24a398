use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct SmtpProvider {
    content_type: ContentType,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpProvider {
    pub fn new(config: &SmtpConfig) -> Result<Self, ProviderError> {
        if config.user.is_empty() || config.password.expose_secret().is_empty() {
            return Err(ProviderError::Configuration(
                "SMTP credentials are not configured".to_string(),
            ));
        }

        let content_type = ContentType::parse(&format!("text/plain; charset={}", config.charset))
            .map_err(|e| {
                ProviderError::Configuration(format!(
                    "Invalid charset {:?}: {}",
                    config.charset, e
                ))
            })?;

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            content_type,
            transport,
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        let from_mailbox: Mailbox = email
            .from
            .parse()
            .map_err(|e| ProviderError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject)
            .header(self.content_type.clone())
            .body(email.body_text.clone())
            .map_err(|e| ProviderError::SendFailed(format!("Failed to build message: {}", e)))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to send email: {}", e)))?;

        let provider_id = response.message().next().map(|s| s.to_string());

        tracing::debug!(
            to = %email.to,
            code = %response.code(),
            "SMTP relay accepted message"
        );

        Ok(ProviderResponse::success(provider_id))
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Mock email provider for testing and dry runs.
///
/// Addresses registered with [`MockEmailProvider::failing_for`] are rejected;
/// everything else is recorded as sent.
pub struct MockEmailProvider {
    enabled: bool,
    send_count: AtomicU64,
    failing: HashSet<String>,
    attempts: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            failing: HashSet::new(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for<I, A>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.failing.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Number of messages accepted.
    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Every message handed to `send`, accepted or not, in call order.
    pub fn attempts(&self) -> Vec<EmailMessage> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(email.clone());
        }

        if self.failing.contains(&email.to) {
            return Err(ProviderError::InvalidRecipient(format!(
                "mock rejected {}",
                email.to
            )));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::success(Some(format!("mock-email-{}", count))))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
