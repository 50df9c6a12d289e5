//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mojenx_http_requests_total` (counter): API requests by method, route, status
//! - `mojenx_http_request_duration_seconds` (histogram): API latency
//! - `mojenx_torrc_mutations_total` (counter): locked read-modify-write runs by outcome
//! - `mojenx_backups_total` (counter): pre-write backups by outcome
//! - `mojenx_service_actions_total` (counter): reload/restart by outcome
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::torrc::store::BackupOutcome;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "mojenx_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("mojenx_http_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_mutation(success: bool) {
    counter!("mojenx_torrc_mutations_total", "outcome" => outcome_label(success)).increment(1);
}

pub fn record_backup(outcome: &BackupOutcome) {
    let label = match outcome {
        BackupOutcome::Created { .. } => "created",
        BackupOutcome::Skipped => "skipped",
        BackupOutcome::Failed { .. } => "failed",
    };
    counter!("mojenx_backups_total", "outcome" => label).increment(1);
}

pub fn record_service_action(action: &'static str, success: bool) {
    counter!(
        "mojenx_service_actions_total",
        "action" => action,
        "outcome" => outcome_label(success)
    )
    .increment(1);
}

fn outcome_label(success: bool) -> &'static str {
    if success {
        "ok"
    } else {
        "error"
    }
}
