use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static ORDERS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PAYMENT_VERIFICATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let orders_counter = IntCounterVec::new(
        Opts::new("orders_created_total", "Provider orders created by currency"),
        &["currency"],
    )
    .expect("Failed to create orders_created_total metric");

    let verifications_counter = IntCounterVec::new(
        Opts::new(
            "payment_verifications_total",
            "Payment verification attempts by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create payment_verifications_total metric");

    registry
        .register(Box::new(orders_counter.clone()))
        .expect("Failed to register orders_created_total");
    registry
        .register(Box::new(verifications_counter.clone()))
        .expect("Failed to register payment_verifications_total");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    ORDERS_CREATED_TOTAL
        .set(orders_counter)
        .expect("Failed to set orders_created_total");
    PAYMENT_VERIFICATIONS_TOTAL
        .set(verifications_counter)
        .expect("Failed to set payment_verifications_total");
}

pub fn render_metrics() -> String {
    let Some(registry) = PROMETHEUS_REGISTRY.get() else {
        return "# Metrics not initialized\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a created provider order.
pub fn record_order_created(currency: &str) {
    if let Some(counter) = ORDERS_CREATED_TOTAL.get() {
        counter.with_label_values(&[currency]).inc();
    }
}

/// Record a payment verification attempt by outcome.
pub fn record_verification(outcome: &str) {
    if let Some(counter) = PAYMENT_VERIFICATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}
