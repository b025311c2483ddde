use crate::apply::{DesiredRecord, parse_desired_state};
use shared::crn::require_service_instance;
use shared::env;
use shared::errors::FunctionError;
use shared::http::Credentials;
use shared::regions::{ServiceFamily, resolve};
use std::time::Duration;
use url::Url;

pub const POWERVS_REGION: &str = "POWERVS_REGION";
/// Variable carrying the serialized desired-state document. Code Engine
/// exposes config map keys to functions under their own name.
pub const DESIRED_STATE: &str = "pvs_scale_config";

/// Configuration of one apply-and-report invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub credentials: Credentials,
    pub crn: String,
    pub cloud_instance_id: String,
    pub power_iaas_url: Url,
    pub records: Vec<DesiredRecord>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env(default_timeout: Duration) -> Result<Self, FunctionError> {
        Self::from_lookup(|key| std::env::var(key).ok(), default_timeout)
    }

    pub fn from_lookup<F>(lookup: F, default_timeout: Duration) -> Result<Self, FunctionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = env::credentials(&lookup)?;
        let crn = env::required(&lookup, env::CRN)?;
        let cloud_instance_id = require_service_instance(&crn)?;
        let region = env::required(&lookup, POWERVS_REGION)?;

        let payload = lookup(DESIRED_STATE).ok_or_else(|| {
            FunctionError::InvalidConfiguration(format!(
                "Missing {DESIRED_STATE} environment variable"
            ))
        })?;

        Ok(Config {
            credentials,
            crn,
            cloud_instance_id,
            power_iaas_url: resolve(&region, ServiceFamily::PowerIaas)?,
            records: parse_desired_state(&payload)?,
            timeout: env::http_timeout(&lookup, default_timeout)?,
        })
    }
}
