//! Prometheus metrics for API calls and polling.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::{debug, info};

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// User list fetches counter metric name.
pub const METRIC_USERS_FETCHED: &str = "users_fetch_total";
/// Failed user list fetches counter metric name.
pub const METRIC_USERS_FETCH_FAILURES: &str = "users_fetch_failures_total";
/// Created users counter metric name.
pub const METRIC_USERS_CREATED: &str = "users_created_total";
/// Failed creations counter metric name.
pub const METRIC_USERS_CREATE_FAILURES: &str = "users_create_failures_total";
/// Health checks counter metric name.
pub const METRIC_HEALTH_CHECKS: &str = "health_checks_total";
/// Failed health checks counter metric name.
pub const METRIC_HEALTH_CHECK_FAILURES: &str = "health_check_failures_total";
/// Skipped poll ticks counter metric name.
pub const METRIC_POLL_TICKS_SKIPPED: &str = "poll_ticks_skipped_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "Users API request latency in milliseconds"
    );

    describe_counter!(METRIC_USERS_FETCHED, "Total number of user list fetches");
    describe_counter!(
        METRIC_USERS_FETCH_FAILURES,
        "Total number of user list fetches that failed"
    );
    describe_counter!(METRIC_USERS_CREATED, "Total number of users created");
    describe_counter!(
        METRIC_USERS_CREATE_FAILURES,
        "Total number of user creations that failed"
    );
    describe_counter!(METRIC_HEALTH_CHECKS, "Total number of health checks");
    describe_counter!(
        METRIC_HEALTH_CHECK_FAILURES,
        "Total number of health checks that failed"
    );
    describe_counter!(
        METRIC_POLL_TICKS_SKIPPED,
        "Poll ticks skipped because a request was still outstanding"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and serve it on `port`.
///
/// Must run before [`init_metrics`], otherwise the descriptions are lost.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics listening on {}", addr);
    Ok(())
}

/// Record a user list fetch and its result.
pub fn inc_users_fetched(success: bool) {
    counter!(METRIC_USERS_FETCHED).increment(1);
    if !success {
        counter!(METRIC_USERS_FETCH_FAILURES).increment(1);
    }
}

/// Record a creation attempt and its result.
pub fn inc_users_created(success: bool) {
    if success {
        counter!(METRIC_USERS_CREATED).increment(1);
    } else {
        counter!(METRIC_USERS_CREATE_FAILURES).increment(1);
    }
}

/// Record a health check and its result.
pub fn inc_health_checks(success: bool) {
    counter!(METRIC_HEALTH_CHECKS).increment(1);
    if !success {
        counter!(METRIC_HEALTH_CHECK_FAILURES).increment(1);
    }
}

/// Record a skipped poll tick.
pub fn inc_poll_ticks_skipped(kind: &'static str) {
    counter!(METRIC_POLL_TICKS_SKIPPED, "kind" => kind).increment(1);
}

/// RAII guard for timing requests.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given endpoint.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => self.endpoint)
            .record(self.elapsed_ms());
    }
}
