use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0:#}")]
    ConfigError(anyhow::Error),

    #[error("Audit error: {0:#}")]
    AuditError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Internal error: {0:#}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Short, stable label for the error category, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "configuration",
            AppError::AuditError(_) => "audit",
            AppError::EmailError(_) => "email",
            AppError::InternalError(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
