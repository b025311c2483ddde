//! Common types for metrics definitions, and the metrics emitted by the
//! shared building blocks.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        ::metrics::counter!($def.name)
    };
    ($def:expr, $($labels:tt)*) => {
        ::metrics::counter!($def.name, $($labels)*)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        ::metrics::histogram!($def.name)
    };
}

pub const PAGES_FETCHED: MetricDef = MetricDef {
    name: "pager.pages_fetched",
    metric_type: MetricType::Counter,
    description: "Number of pages fetched while draining paginated listings",
};

pub const POWER_IAAS_REQUESTS: MetricDef = MetricDef {
    name: "power_iaas.requests",
    metric_type: MetricType::Counter,
    description: "Number of requests sent to the PowerVS API, tagged by operation",
};

pub const ALL_METRICS: &[MetricDef] = &[PAGES_FETCHED, POWER_IAAS_REQUESTS];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL_METRICS.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), ALL_METRICS.len());
    }
}
