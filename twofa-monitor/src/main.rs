use monitor_core::error::AppError;
use monitor_core::observability::init_tracing;
use std::process::ExitCode;
use twofa_monitor::config::MonitorConfig;
use twofa_monitor::startup::Application;

async fn run() -> Result<(), AppError> {
    let config = MonitorConfig::load()?;
    init_tracing("twofa-monitor", &config.common.log_level);

    let mut app = Application::build(config)?;
    let report = app.run().await?;

    if let Some(outcome) = &report.dispatch {
        tracing::info!(
            attempted = outcome.recipients_attempted().len(),
            failed = outcome.recipients_failed().len(),
            "Alert dispatch finished"
        );
    }

    tracing::info!(flagged = report.flagged.len(), dry_run = report.dry_run, "Success");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Tracing is not up yet when configuration failed to load.
            init_tracing("twofa-monitor", "info");
            tracing::error!(kind = e.kind(), error = %e, "Monitor run failed");
            ExitCode::FAILURE
        }
    }
}
