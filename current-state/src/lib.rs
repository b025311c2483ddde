use shared::desired_state::ResourceRecord;
use shared::errors::FunctionError;
use shared::http::build_client;
use shared::power_iaas::PowerIaasClient;
use std::time::Instant;

pub mod code_engine;
pub mod config;
pub mod cursor;
pub mod metrics_defs;
pub mod publish;

use code_engine::CodeEngineClient;
use config::Config;
use metrics_defs::PUBLISH_DURATION;

/// Reads the current CPU/RAM of every PVM instance in the workspace and
/// stores it as the desired-state config map.
pub async fn run(config: &Config) -> Result<Vec<ResourceRecord>, FunctionError> {
    let started = Instant::now();
    let client = build_client(config.timeout)?;

    let power_iaas = PowerIaasClient::new(
        client.clone(),
        config.power_iaas_url.clone(),
        config.credentials.clone(),
        config.crn.clone(),
    );
    let code_engine = CodeEngineClient::new(
        client,
        config.code_engine_url.clone(),
        config.credentials.clone(),
    );

    let records = publish::fetch_and_publish(
        &power_iaas,
        &code_engine,
        &config.cloud_instance_id,
        &config.target,
    )
    .await?;

    shared::histogram!(PUBLISH_DURATION).record(started.elapsed().as_secs_f64());
    tracing::info!(
        records = records.len(),
        config_map = %config.target.config_map_name,
        "Published current state"
    );

    Ok(records)
}
