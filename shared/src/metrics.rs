use crate::metrics_defs::{MetricDef, MetricType};
use metrics_exporter_statsd::StatsdBuilder;

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(String),
    #[error("a metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Install a global recorder that sends all `metrics` facade calls to StatsD.
///
/// Without a recorder every metric is a no-op, which is what invocations
/// without a metrics config get.
pub fn init_statsd(statsd_host: &str, statsd_port: u16, prefix: &str) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(statsd_host, statsd_port)
        .build(Some(prefix))
        .map_err(|e| MetricsError::Statsd(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInstalled)?;

    tracing::debug!(statsd_host, statsd_port, prefix, "Installed statsd metrics recorder");
    Ok(())
}

/// Registers the description of every definition with the installed
/// recorder.
pub fn describe(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
