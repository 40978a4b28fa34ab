//! Prometheus counters for record store operations.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static STORE_OPS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("giftcard_store_operations_total", "Record store operations by outcome"),
        &["op", "outcome"],
    )
    .unwrap_or_else(|e| panic!("invalid metric definition: {e}"));
    let _ = REGISTRY.register(Box::new(counter.clone()));
    counter
});

/// Count one store operation, e.g. `record_op("create", "ok")`.
pub fn record_op(op: &str, outcome: &str) {
    STORE_OPS.with_label_values(&[op, outcome]).inc();
}

pub fn op_count(op: &str, outcome: &str) -> u64 {
    STORE_OPS.with_label_values(&[op, outcome]).get()
}

/// Text exposition of every registered metric.
pub fn gather_text() -> Result<String, prometheus::Error> {
    Lazy::force(&STORE_OPS);
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
