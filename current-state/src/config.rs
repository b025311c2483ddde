use shared::crn::require_service_instance;
use shared::env;
use shared::errors::FunctionError;
use shared::http::Credentials;
use shared::regions::{ServiceFamily, resolve};
use std::time::Duration;
use url::Url;

pub const CODE_ENGINE_REGION: &str = "CODE_ENGINE_REGION";
pub const POWERVS_REGION: &str = "POWERVS_REGION";
pub const PROJECT_NAME: &str = "CODE_ENGINE_PROJECT_NAME";
pub const CONFIG_MAP_NAME: &str = "PVS_SCALE_CONFIG_MAP";
pub const CONFIG_MAP_KEY: &str = "PVS_SCALE_CONFIG_KEY";

pub const DEFAULT_CONFIG_MAP_NAME: &str = "pvs-scale-up-config";
pub const DEFAULT_CONFIG_MAP_KEY: &str = "pvs_scale_config";

/// Where the desired-state document is published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishTarget {
    pub project_name: String,
    pub config_map_name: String,
    pub data_key: String,
}

/// Configuration of one fetch-and-publish invocation. Every value is
/// resolved and validated before any network call is made.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub credentials: Credentials,
    pub crn: String,
    pub cloud_instance_id: String,
    pub power_iaas_url: Url,
    pub code_engine_url: Url,
    pub target: PublishTarget,
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

        let region = env::required(&lookup, CODE_ENGINE_REGION)?;
        // PowerVS workspaces may live in another region than the Code Engine project.
        let powervs_region =
            env::optional(&lookup, POWERVS_REGION).unwrap_or_else(|| region.clone());

        let target = PublishTarget {
            project_name: env::required(&lookup, PROJECT_NAME)?,
            config_map_name: env::optional(&lookup, CONFIG_MAP_NAME)
                .unwrap_or_else(|| DEFAULT_CONFIG_MAP_NAME.to_string()),
            data_key: env::optional(&lookup, CONFIG_MAP_KEY)
                .unwrap_or_else(|| DEFAULT_CONFIG_MAP_KEY.to_string()),
        };

        Ok(Config {
            credentials,
            crn,
            cloud_instance_id,
            power_iaas_url: resolve(&powervs_region, ServiceFamily::PowerIaas)?,
            code_engine_url: resolve(&region, ServiceFamily::CodeEngine)?,
            target,
            timeout: env::http_timeout(&lookup, default_timeout)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CRN: &str = "crn:v1:bluemix:public:power-iaas:dal10:a/acct:7b4b7a52-6f3e-4c1b-9d8a-0f1e2d3c4b5a::";

    fn env(overrides: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("IBM_CLOUD_IAM_TOKEN", "token"),
            ("CRN", CRN),
            ("CODE_ENGINE_REGION", "us-south"),
            ("CODE_ENGINE_PROJECT_NAME", "pvs-scaler"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        vars
    }

    fn load(vars: HashMap<String, String>) -> Result<Config, FunctionError> {
        Config::from_lookup(move |key| vars.get(key).cloned(), Duration::from_secs(30))
    }

    #[test]
    fn test_defaults() {
        let config = load(env(&[])).unwrap();
        assert_eq!(config.cloud_instance_id, "7b4b7a52-6f3e-4c1b-9d8a-0f1e2d3c4b5a");
        assert_eq!(
            config.power_iaas_url.as_str(),
            "https://us-south.power-iaas.cloud.ibm.com/pcloud/v1"
        );
        assert_eq!(
            config.code_engine_url.as_str(),
            "https://api.us-south.codeengine.cloud.ibm.com/v2"
        );
        assert_eq!(config.target.config_map_name, "pvs-scale-up-config");
        assert_eq!(config.target.data_key, "pvs_scale_config");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_powervs_region_override() {
        let config = load(env(&[("POWERVS_REGION", "ca-mon")])).unwrap();
        assert_eq!(
            config.power_iaas_url.as_str(),
            "https://mon.power-iaas.cloud.ibm.com/pcloud/v1"
        );
    }

    #[test]
    fn test_missing_project_name() {
        let mut vars = env(&[]);
        vars.remove("CODE_ENGINE_PROJECT_NAME");
        assert!(matches!(load(vars), Err(FunctionError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_region_is_not_found() {
        let err = load(env(&[("CODE_ENGINE_REGION", "ca-mon")])).unwrap_err();
        assert!(matches!(err, FunctionError::NotFound(_)));
    }

    #[test]
    fn test_crn_without_instance() {
        let err = load(env(&[("CRN", "crn:v1:bluemix:public:power-iaas")])).unwrap_err();
        assert_eq!(
            err,
            FunctionError::InvalidInput("Unable to extract cloud_instance_id from CRN".into())
        );
    }
}
