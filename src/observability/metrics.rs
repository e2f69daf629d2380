//! # Metrics
//!
//! Prometheus metrics for mapping operations.
//!
//! ## Metrics Exposed
//!
//! - `mapping_operations_total{direction}` - Total number of mapping operations
//! - `mapping_errors_total{direction,reason}` - Total number of failed mapping operations
//! - `mapping_duration_seconds{direction}` - Duration of mapping operations
//! - `mapping_dependents_added_total` - Total number of dependents reported for persistence

use anyhow::Result;
use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static MAPPING_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mapping_operations_total",
            "Total number of mapping operations by direction",
        ),
        &["direction"],
    )
    .expect("Failed to create MAPPING_OPERATIONS_TOTAL metric - this should never happen")
});

static MAPPING_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mapping_errors_total",
            "Total number of failed mapping operations by direction and reason",
        ),
        &["direction", "reason"],
    )
    .expect("Failed to create MAPPING_ERRORS_TOTAL metric - this should never happen")
});

static MAPPING_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "mapping_duration_seconds",
            "Duration of mapping operations in seconds by direction",
        )
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["direction"],
    )
    .expect("Failed to create MAPPING_DURATION metric - this should never happen")
});

static MAPPING_DEPENDENTS_ADDED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "mapping_dependents_added_total",
        "Total number of dependent objects created or updated by expansions",
    )
    .expect("Failed to create MAPPING_DEPENDENTS_ADDED_TOTAL metric - this should never happen")
});

/// Register all mapping metrics with the registry
///
/// Registering twice is not an error.
#[allow(
    clippy::missing_errors_doc,
    reason = "Only fails on conflicting metric descriptors"
)]
pub fn register_metrics() -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(MAPPING_OPERATIONS_TOTAL.clone()),
        Box::new(MAPPING_ERRORS_TOTAL.clone()),
        Box::new(MAPPING_DURATION.clone()),
        Box::new(MAPPING_DEPENDENTS_ADDED_TOTAL.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub fn increment_operations(direction: &str) {
    MAPPING_OPERATIONS_TOTAL
        .with_label_values(&[direction])
        .inc();
}

pub fn increment_errors(direction: &str, reason: &str) {
    MAPPING_ERRORS_TOTAL
        .with_label_values(&[direction, reason])
        .inc();
}

pub fn observe_duration(direction: &str, duration: f64) {
    MAPPING_DURATION
        .with_label_values(&[direction])
        .observe(duration);
}

pub fn add_dependents(count: usize) {
    MAPPING_DEPENDENTS_ADDED_TOTAL.inc_by(u64::try_from(count).unwrap_or(u64::MAX));
}

/// Render every registered metric in the Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Only fails when the encoder cannot write UTF-8"
)]
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
