use crate::errors::FunctionError;
use crate::http::{Credentials, error_body, join_segments};
use crate::metrics_defs::POWER_IAAS_REQUESTS;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use url::Url;

/// One entry of the PVM instance listing. Only the fields the scaler cares
/// about are decoded; all of them may be absent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PvmInstance {
    #[serde(rename = "pvmInstanceID")]
    pub pvm_instance_id: Option<String>,
    #[serde(rename = "serverName")]
    pub server_name: Option<String>,
    pub processors: Option<Number>,
    pub memory: Option<Number>,
}

#[derive(Deserialize)]
struct PvmInstances {
    #[serde(rename = "pvmInstances")]
    pvm_instances: Vec<PvmInstance>,
}

/// Body of a PVM instance update.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub processors: Number,
    pub memory: Number,
}

/// Raw reply of an update call. Any HTTP status is a reply; only transport
/// failures are errors.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReply {
    pub status: StatusCode,
    pub body: String,
}

#[derive(thiserror::Error, Debug)]
pub enum PowerIaasError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error: {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Invalid JSON in response: {source}")]
    Decode {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<PowerIaasError> for FunctionError {
    fn from(e: PowerIaasError) -> Self {
        match &e {
            PowerIaasError::Request(inner) => FunctionError::upstream(
                inner.status().map_or(500, |s| s.as_u16()),
                e.to_string(),
            ),
            PowerIaasError::Status { status, .. } | PowerIaasError::Decode { status, .. } => {
                FunctionError::upstream(status.as_u16(), e.to_string())
            }
            PowerIaasError::InvalidUrl(_) => FunctionError::Internal(e.to_string()),
        }
    }
}

#[async_trait]
pub trait InstanceSource: Send + Sync {
    async fn list_instances(
        &self,
        cloud_instance_id: &str,
    ) -> Result<Vec<PvmInstance>, PowerIaasError>;
}

#[async_trait]
pub trait InstanceUpdater: Send + Sync {
    async fn update_instance(
        &self,
        cloud_instance_id: &str,
        pvm_instance_id: &str,
        request: &UpdateRequest,
    ) -> Result<UpdateReply, PowerIaasError>;
}

/// Client for the PowerVS `pvm-instances` API of one workspace, identified
/// by its CRN.
pub struct PowerIaasClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    crn: String,
}

impl PowerIaasClient {
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        crn: impl Into<String>,
    ) -> Self {
        PowerIaasClient {
            client,
            base_url,
            credentials,
            crn: crn.into(),
        }
    }

    fn instances_url(&self, cloud_instance_id: &str, rest: &[&str]) -> Result<Url, PowerIaasError> {
        let segments = ["cloud-instances", cloud_instance_id, "pvm-instances"]
            .into_iter()
            .chain(rest.iter().copied());
        join_segments(&self.base_url, segments)
            .map_err(|e| PowerIaasError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl InstanceSource for PowerIaasClient {
    async fn list_instances(
        &self,
        cloud_instance_id: &str,
    ) -> Result<Vec<PvmInstance>, PowerIaasError> {
        let url = self.instances_url(cloud_instance_id, &[])?;
        tracing::debug!(%url, "Requesting PVM instances");
        crate::counter!(POWER_IAAS_REQUESTS, "operation" => "list").increment(1);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header("CRN", &self.crn)
            .bearer_auth(self.credentials.bearer_token())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(PowerIaasError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let listing: PvmInstances = serde_json::from_slice(&bytes)
            .map_err(|source| PowerIaasError::Decode { status, source })?;

        Ok(listing.pvm_instances)
    }
}

#[async_trait]
impl InstanceUpdater for PowerIaasClient {
    async fn update_instance(
        &self,
        cloud_instance_id: &str,
        pvm_instance_id: &str,
        request: &UpdateRequest,
    ) -> Result<UpdateReply, PowerIaasError> {
        let url = self.instances_url(cloud_instance_id, &[pvm_instance_id])?;
        tracing::debug!(%url, ?request, "Updating PVM instance");
        crate::counter!(POWER_IAAS_REQUESTS, "operation" => "update").increment(1);

        let response = self
            .client
            .put(url)
            .header("CRN", &self.crn)
            .bearer_auth(self.credentials.bearer_token())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(UpdateReply { status, body })
    }
}
