//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint handler.

use crate::models::SubmissionStatus;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Installs the global recorder on the first call; later calls are no-ops so
/// test binaries can call it from every test.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_assignment_created() {
    counter!("study_assignments_created_total").increment(1);
}

pub fn record_assignment_deleted(count: u64) {
    counter!("study_assignments_deleted_total").increment(count);
}

pub fn record_submission_created() {
    counter!("study_submissions_created_total").increment(1);
}

pub fn record_submission_graded(status: SubmissionStatus) {
    counter!("study_submissions_graded_total", "status" => status.to_string()).increment(1);
}
