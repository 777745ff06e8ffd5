//! Prometheus metrics for fork-feed-service

use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fork_feed_http_requests_total",
        "Total HTTP requests handled by fork-feed-service",
        &["method", "path", "status"]
    )
    .expect("failed to register fork_feed_http_requests_total")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "fork_feed_http_request_duration_seconds",
        "HTTP request latency for fork-feed-service",
        &["method", "path", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("failed to register fork_feed_http_request_duration_seconds")
});

static FEED_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fork_feed_requests_total",
        "Feed generation attempts by outcome",
        &["outcome"]
    )
    .expect("failed to register fork_feed_requests_total")
});

static DEGRADED_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fork_feed_degraded_lookups_total",
        "History lookups that degraded to an empty result",
        &["lookup", "reason"]
    )
    .expect("failed to register fork_feed_degraded_lookups_total")
});

static RANKING_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "fork_feed_ranking_duration_seconds",
        "Time spent scoring and sorting one candidate batch",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]
    )
    .expect("failed to register fork_feed_ranking_duration_seconds")
});

static RATE_LIMITED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fork_feed_rate_limited_total",
        "Requests rejected by the per-actor rate limiter",
        &["action"]
    )
    .expect("failed to register fork_feed_rate_limited_total")
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

/// `outcome` is one of: ok, unavailable
pub fn record_feed_request(outcome: &str) {
    FEED_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// `reason` is one of: error, timeout
pub fn record_degraded_lookup(lookup: &str, reason: &str) {
    DEGRADED_LOOKUPS_TOTAL
        .with_label_values(&[lookup, reason])
        .inc();
}

pub fn observe_ranking_duration(elapsed: Duration) {
    RANKING_DURATION_SECONDS.observe(elapsed.as_secs_f64());
}

pub fn record_rate_limited(action: &str) {
    RATE_LIMITED_TOTAL.with_label_values(&[action]).inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
