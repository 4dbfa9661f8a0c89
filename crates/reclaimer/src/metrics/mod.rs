#![forbid(unsafe_code)]

//! Best-effort counters and gauges.
//!
//! Sinks never fail from the caller's point of view: a sink that cannot
//! deliver logs and drops the sample.

mod statsd;

pub use statsd::StatsdSink;

use crate::domain::EntityKind;

pub const CLEAN_START: &str = "clean.start";
pub const IMAGE_AMOUNT: &str = "image.amount";
pub const DEAD_CONTAINER_AMOUNT: &str = "container.dead.amount";
pub const DEFAULT_SAMPLE_RATE: f64 = 1.0;

pub trait MetricsSink: Send + Sync {
    fn count(&self, name: &str, delta: i64, tags: &[&str], sample_rate: f64);

    fn gauge(&self, name: &str, value: f64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn count(&self, _name: &str, _delta: i64, _tags: &[&str], _sample_rate: f64) {}

    fn gauge(&self, _name: &str, _value: f64) {}
}

/// Counter incremented on each successful deletion of `kind`.
pub fn deleted_metric(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Container => "container.deleted",
        EntityKind::Image => "image.deleted",
    }
}

/// Gauge reporting the size of a `kind` listing.
pub fn amount_metric(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Container => DEAD_CONTAINER_AMOUNT,
        EntityKind::Image => IMAGE_AMOUNT,
    }
}

pub fn kind_tag(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Container => "kind:container",
        EntityKind::Image => "kind:image",
    }
}
