//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Chat sessions opened by admission outcome, chat messages by delivery path
//! - Payment callbacks by gateway and outcome
//! - Bot notifications by kind and outcome

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "rehab_center";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Chat sessions opened, by admission outcome ("active", "queued")
pub static CHAT_SESSIONS_OPENED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chat_sessions_opened_total", "Chat sessions opened").namespace(NAMESPACE),
        &["admission"],
    )
    .expect("Failed to create CHAT_SESSIONS_OPENED metric")
});

/// Chat messages stored, by delivery path ("realtime", "database")
pub static CHAT_MESSAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chat_messages_total", "Chat messages stored").namespace(NAMESPACE),
        &["delivered_via"],
    )
    .expect("Failed to create CHAT_MESSAGES metric")
});

/// Open chat WebSocket streams
pub static CHAT_STREAMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("chat_streams_active", "Open chat WebSocket streams").namespace(NAMESPACE),
    )
    .expect("Failed to create CHAT_STREAMS_ACTIVE metric")
});

/// Payment callbacks received, by gateway and outcome
pub static PAYMENT_CALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("payment_callbacks_total", "Payment gateway callbacks").namespace(NAMESPACE),
        &["gateway", "outcome"],
    )
    .expect("Failed to create PAYMENT_CALLBACKS metric")
});

/// Bot notifications, by kind and outcome ("sent", "failed", "dropped")
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("notifications_total", "Messaging bot notifications").namespace(NAMESPACE),
        &["kind", "outcome"],
    )
    .expect("Failed to create NOTIFICATIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(CHAT_SESSIONS_OPENED.clone()))
        .expect("Failed to register CHAT_SESSIONS_OPENED");
    registry
        .register(Box::new(CHAT_MESSAGES.clone()))
        .expect("Failed to register CHAT_MESSAGES");
    registry
        .register(Box::new(CHAT_STREAMS_ACTIVE.clone()))
        .expect("Failed to register CHAT_STREAMS_ACTIVE");
    registry
        .register(Box::new(PAYMENT_CALLBACKS.clone()))
        .expect("Failed to register PAYMENT_CALLBACKS");
    registry
        .register(Box::new(NOTIFICATIONS.clone()))
        .expect("Failed to register NOTIFICATIONS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_chat_session_opened(admission: &str) {
    CHAT_SESSIONS_OPENED.with_label_values(&[admission]).inc();
}

pub fn record_chat_message(delivered_via: &str) {
    CHAT_MESSAGES.with_label_values(&[delivered_via]).inc();
}

pub fn record_payment_callback(gateway: &str, outcome: &str) {
    PAYMENT_CALLBACKS.with_label_values(&[gateway, outcome]).inc();
}

pub fn record_notification(kind: &str, outcome: &str) {
    NOTIFICATIONS.with_label_values(&[kind, outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Force lazy initialization
        let _ = &*REGISTRY;
        let _ = &*HTTP_REQUESTS_TOTAL;
        let _ = &*PAYMENT_CALLBACKS;
    }

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, 0.001);
        let metrics = gather_metrics();
        assert!(metrics.contains("rehab_center_http_requests_total"));
    }

    #[test]
    fn test_record_payment_callback() {
        record_payment_callback("liqpay", "updated");
        let metrics = gather_metrics();
        assert!(metrics.contains("rehab_center_payment_callbacks_total"));
        assert!(metrics.contains("gateway=\"liqpay\""));
    }
}
