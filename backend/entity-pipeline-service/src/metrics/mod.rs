//! Prometheus metrics for the entity pipeline worker
//!
//! Recorded at the consumer edge; exposition belongs to the surrounding
//! platform.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Total pipeline runs by outcome (completed/gated/error)
static PIPELINE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "entity_pipeline_runs_total",
        "Total entity pipeline runs by outcome",
        &["outcome"]
    )
    .expect("failed to register entity_pipeline_runs_total")
});

/// Entities persisted per kind
static ENTITIES_PERSISTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "entity_pipeline_entities_total",
        "Entity rows ensured by the pipeline, per kind",
        &["entity"]
    )
    .expect("failed to register entity_pipeline_entities_total")
});

/// Mention notifications published
static NOTIFICATIONS_PUBLISHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "entity_pipeline_mention_notifications_total",
        "Mention notification events published"
    )
    .expect("failed to register entity_pipeline_mention_notifications_total")
});

/// Federation delivery signals published
static DELIVERY_SIGNALS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "entity_pipeline_delivery_signals_total",
        "Federation delivery signals published"
    )
    .expect("failed to register entity_pipeline_delivery_signals_total")
});

/// Record a pipeline run outcome
pub fn record_run(outcome: &str) {
    PIPELINE_RUNS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record persisted entities of one kind
pub fn record_entities(entity: &str, count: u64) {
    if count > 0 {
        ENTITIES_PERSISTED_TOTAL
            .with_label_values(&[entity])
            .inc_by(count);
    }
}

/// Record published mention notifications
pub fn record_notifications(count: u64) {
    if count > 0 {
        NOTIFICATIONS_PUBLISHED_TOTAL.inc_by(count);
    }
}

/// Record one published delivery signal
pub fn record_delivery_signal() {
    DELIVERY_SIGNALS_TOTAL.inc();
}
