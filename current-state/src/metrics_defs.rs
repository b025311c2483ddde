//! Metrics definitions for the fetch-and-publish workflow.

use shared::metrics_defs::{MetricDef, MetricType};

pub const INSTANCES_LISTED: MetricDef = MetricDef {
    name: "current_state.instances.listed",
    metric_type: MetricType::Histogram,
    description: "Number of PVM instances returned by the listing call",
};

pub const INSTANCES_SKIPPED: MetricDef = MetricDef {
    name: "current_state.instances.skipped",
    metric_type: MetricType::Counter,
    description: "Listing entries dropped because they carry no instance id",
};

pub const CONFIG_MAP_WRITES: MetricDef = MetricDef {
    name: "current_state.config_map.writes",
    metric_type: MetricType::Counter,
    description: "Config map writes, tagged by action (created or replaced)",
};

pub const PUBLISH_DURATION: MetricDef = MetricDef {
    name: "current_state.publish.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a fetch-and-publish run in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    INSTANCES_LISTED,
    INSTANCES_SKIPPED,
    CONFIG_MAP_WRITES,
    PUBLISH_DURATION,
];
