//! Metrics definitions for the apply-and-report workflow.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SCALE_REQUESTS: MetricDef = MetricDef {
    name: "scaler.records",
    metric_type: MetricType::Counter,
    description: "Desired-state records processed, tagged by outcome (success, rejected, transport, invalid)",
};

pub const SCALE_DURATION: MetricDef = MetricDef {
    name: "scaler.apply.duration",
    metric_type: MetricType::Histogram,
    description: "Time to attempt every record of a desired-state document in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[SCALE_REQUESTS, SCALE_DURATION];
