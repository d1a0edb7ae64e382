// src/metrics.rs
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};

pub static REFRESH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "arbiter_refresh_total", "Per-pair refresh outcomes", &["outcome"] // ok|error
    ).unwrap()
});

pub static SOURCE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "arbiter_source_failures_total", "Sources dropped from a cycle", &["exchange", "call"]
    ).unwrap()
});

pub static SCORE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "arbiter_score_latency_seconds",
        "Fan-out + ranking latency per pair",
        &["pair"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap()
});

/// Text exposition of the default registry.
pub fn render() -> String {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buf) {
        tracing::warn!(error = %e, "metrics encode failed");
    }
    String::from_utf8(buf).unwrap_or_default()
}
