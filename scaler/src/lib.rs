use shared::errors::FunctionError;
use shared::http::build_client;
use shared::power_iaas::PowerIaasClient;
use std::time::Instant;

pub mod apply;
pub mod config;
pub mod errors;
pub mod metrics_defs;

use apply::ApplyReport;
use config::Config;
use metrics_defs::SCALE_DURATION;

/// Applies the configured desired state to every listed PVM instance.
///
/// Only configuration problems fail the invocation. Failures of single
/// records are part of the returned report.
pub async fn run(config: &Config) -> Result<ApplyReport, FunctionError> {
    let started = Instant::now();
    let client = PowerIaasClient::new(
        build_client(config.timeout)?,
        config.power_iaas_url.clone(),
        config.credentials.clone(),
        config.crn.clone(),
    );

    let report = apply::apply(&client, &config.cloud_instance_id, &config.records).await;

    shared::histogram!(SCALE_DURATION).record(started.elapsed().as_secs_f64());
    tracing::info!(
        records = report.outcomes().len(),
        failed = report.failed(),
        "Applied desired state"
    );

    Ok(report)
}
