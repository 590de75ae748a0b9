use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::complaints::{ComplaintId, ComplaintStatus};
use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("complaint-tracker telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one status transition request
pub fn create_transition_span(
    operation: &str,
    complaint_id: &ComplaintId,
    target: Option<ComplaintStatus>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "status_transition",
        operation = operation,
        complaint.id = %complaint_id,
        status.target = target.map(ComplaintStatus::as_str),
        correlation.id = correlation_id,
    )
}
