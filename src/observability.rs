//! # Observability Module
//!
//! Structured logging (tracing) and Prometheus metrics for the bot. Logging
//! defaults to JSON output for production and switches to pretty output with
//! `LOG_FORMAT=pretty`. Metrics are exposed on an HTTP scrape endpoint whose
//! port comes from `METRICS_PORT` (default 9090).

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};
use tracing_subscriber::prelude::*;

/// Initialize structured logging with tracing
pub fn init_tracing() -> Result<()> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("tube_rewards=info".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("teloxide=warn".parse()?);

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .init();
    }

    tracing::info!(log_format = %log_format, "Tracing initialized with structured logging");
    Ok(())
}

/// Install the Prometheus metrics exporter with an HTTP scrape listener
pub fn init_metrics() -> Result<()> {
    let port = std::env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9090".to_string())
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("METRICS_PORT must be a valid port number (1-65535)"))?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!(port = port, "Prometheus metrics exporter listening");
    Ok(())
}

/// Record the outcome and duration of one verification request
pub fn record_verification_outcome(outcome: &'static str, duration: std::time::Duration) {
    metrics::counter!("verification_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("verification_duration_seconds").record(duration.as_secs_f64());
}

/// Record a single OCR backend attempt
pub fn record_ocr_attempt(backend: &'static str, success: bool, duration: std::time::Duration) {
    metrics::counter!(
        "ocr_attempts_total",
        "backend" => backend,
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("ocr_attempt_duration_seconds", "backend" => backend)
        .record(duration.as_secs_f64());
}

/// Record a database operation with its duration
pub fn record_db_operation(operation: &'static str, duration: std::time::Duration) {
    metrics::counter!("db_operations_total", "operation" => operation).increment(1);
    metrics::histogram!("db_operation_duration_seconds").record(duration.as_secs_f64());
}

/// Record points awarded through verified submissions
pub fn record_points_awarded(points: u64) {
    metrics::counter!("points_awarded_total").increment(points);
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, user_id: Option<i64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        user_id = user_id,
        component = "telegram"
    )
}
