//! One monitor run: audit the workspace, then alert.
//!
//! `Application` owns the fully built collaborators so a run is a single
//! `run().await`. Tests assemble it from parts with `with_parts`.

use crate::config::MonitorConfig;
use crate::models::AuditResult;
use crate::services::{
    AlertReport, DispatchOutcome, EmailProvider, MemberAuditor, MembersApi, MembersEndpoint,
    NotificationDispatcher, PageSource, SmtpProvider,
};
use monitor_core::error::AppError;
use monitor_core::http::{ApiClient, BasicAuth};
use std::io::Write;
use std::sync::Arc;

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub flagged: AuditResult,
    /// Present only when the alert email was dispatched.
    pub dispatch: Option<DispatchOutcome>,
    /// Rendered alert, when there was anything to report.
    pub alert: Option<AlertReport>,
    pub dry_run: bool,
}

/// How the alert leaves the process.
pub enum Delivery {
    /// Write the alert to the given output instead of emailing it.
    DryRun(Box<dyn Write + Send>),
    Email {
        dispatcher: NotificationDispatcher,
        recipients: Vec<String>,
    },
}

pub struct Application<S> {
    workspace: String,
    auditor: MemberAuditor<S>,
    delivery: Delivery,
}

impl Application<MembersApi> {
    /// Build the application with the given configuration.
    pub fn build(config: MonitorConfig) -> Result<Self, AppError> {
        let endpoint = MembersEndpoint::new(&config.api.base_url, &config.api.workspace)
            .map_err(AppError::ConfigError)?;

        let client = ApiClient::new(
            BasicAuth::new(config.api.username.clone(), config.api.app_password.clone()),
            config.api.timeout,
        )
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        tracing::info!(
            endpoint = %endpoint,
            workspace = %config.api.workspace,
            dry_run = config.debug,
            "Monitor configured"
        );

        let auditor =
            MemberAuditor::new(MembersApi::new(client, endpoint)).with_max_pages(config.api.max_pages);

        let delivery = if config.debug {
            Delivery::DryRun(Box::new(std::io::stdout()))
        } else {
            let provider: Arc<dyn EmailProvider> = Arc::new(
                SmtpProvider::new(&config.smtp)
                    .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?,
            );
            tracing::info!(host = %config.smtp.host, port = config.smtp.port, "SMTP email provider initialized");

            Delivery::Email {
                dispatcher: NotificationDispatcher::new(provider, config.mail.from_address.clone()),
                recipients: config.mail.recipients.clone(),
            }
        };

        Ok(Self::with_parts(config.api.workspace, auditor, delivery))
    }
}

impl<S: PageSource> Application<S> {
    pub fn with_parts(workspace: impl Into<String>, auditor: MemberAuditor<S>, delivery: Delivery) -> Self {
        Self {
            workspace: workspace.into(),
            auditor,
            delivery,
        }
    }

    /// Run one audit and deliver the alert if anyone is flagged.
    ///
    /// Audit failures abort the run before anything is sent. Individual
    /// recipient failures do not.
    pub async fn run(&mut self) -> Result<RunReport, AppError> {
        let flagged = self
            .auditor
            .fetch_all()
            .await
            .map_err(|e| AppError::AuditError(anyhow::Error::new(e)))?;

        let dry_run = matches!(self.delivery, Delivery::DryRun(_));

        if flagged.is_empty() {
            tracing::info!(workspace = %self.workspace, "All members have 2SV enabled");
            return Ok(RunReport {
                flagged,
                dispatch: None,
                alert: None,
                dry_run,
            });
        }

        let alert = AlertReport::new(&self.workspace, &flagged);
        tracing::info!(flagged = flagged.len(), subject = %alert.subject, "Members without 2SV found");

        let dispatch = match &mut self.delivery {
            Delivery::DryRun(out) => {
                write!(out, "{}", alert)?;
                out.flush()?;
                None
            }
            Delivery::Email {
                dispatcher,
                recipients,
            } => {
                let outcome = dispatcher
                    .send(recipients, &alert.subject, &alert.body)
                    .await
                    .map_err(|e| AppError::EmailError(e.to_string()))?;
                Some(outcome)
            }
        };

        Ok(RunReport {
            flagged,
            dispatch,
            alert: Some(alert),
            dry_run,
        })
    }
}
