use crate::cursor::{Cursor, CursorError, NextLink};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ETAG, IF_MATCH};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::errors::FunctionError;
use shared::http::{Credentials, error_body, join_segments};
use shared::pager::{Pager, drain};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use url::Url;

const PAGE_LIMIT: &str = "100";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigMapSummary {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigMap {
    pub name: String,
    pub entity_tag: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CodeEngineError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error: {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Invalid JSON in response: {source}")]
    Decode {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("config map '{name}' was modified concurrently (entity tag mismatch)")]
    Conflict { name: String },
    #[error("config map '{name}' has no entity tag")]
    MissingEntityTag { name: String },
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<CodeEngineError> for FunctionError {
    fn from(e: CodeEngineError) -> Self {
        match &e {
            CodeEngineError::Request(inner) => FunctionError::upstream(
                inner.status().map_or(500, |s| s.as_u16()),
                e.to_string(),
            ),
            CodeEngineError::Status { status, .. } | CodeEngineError::Decode { status, .. } => {
                FunctionError::upstream(status.as_u16(), e.to_string())
            }
            CodeEngineError::Conflict { .. } => {
                FunctionError::upstream(StatusCode::PRECONDITION_FAILED.as_u16(), e.to_string())
            }
            CodeEngineError::MissingEntityTag { .. } | CodeEngineError::Cursor(_) => {
                FunctionError::upstream(StatusCode::BAD_GATEWAY.as_u16(), e.to_string())
            }
            CodeEngineError::InvalidUrl(_) => FunctionError::Internal(e.to_string()),
        }
    }
}

/// Named-document store holding the desired-state config map.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, CodeEngineError>;

    async fn list_config_maps(
        &self,
        project_id: &str,
    ) -> Result<Vec<ConfigMapSummary>, CodeEngineError>;

    async fn get_config_map(&self, project_id: &str, name: &str)
    -> Result<ConfigMap, CodeEngineError>;

    async fn create_config_map(
        &self,
        project_id: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<(), CodeEngineError>;

    /// Replaces the config map only if its entity tag still equals `if_match`.
    async fn replace_config_map(
        &self,
        project_id: &str,
        name: &str,
        if_match: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<(), CodeEngineError>;
}

pub struct CodeEngineClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl CodeEngineClient {
    pub fn new(client: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        CodeEngineClient {
            client,
            base_url,
            credentials,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, CodeEngineError> {
        join_segments(&self.base_url, segments)
            .map_err(|e| CodeEngineError::InvalidUrl(e.to_string()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(ACCEPT, "application/json")
            .bearer_auth(self.credentials.bearer_token())
    }
}

async fn ensure_success(response: Response) -> Result<Response, CodeEngineError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = error_body(response).await;
        Err(CodeEngineError::Status { status, body })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CodeEngineError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| CodeEngineError::Decode { status, source })
}

/// A page of a Code Engine list call.
pub trait ListResponse: DeserializeOwned + Send {
    type Item: Send;

    fn into_parts(self) -> (Option<Vec<Self::Item>>, Option<NextLink>);
}

#[derive(Deserialize)]
pub struct ProjectList {
    projects: Option<Vec<Project>>,
    next: Option<NextLink>,
}

impl ListResponse for ProjectList {
    type Item = Project;

    fn into_parts(self) -> (Option<Vec<Project>>, Option<NextLink>) {
        (self.projects, self.next)
    }
}

#[derive(Deserialize)]
pub struct ConfigMapList {
    config_maps: Option<Vec<ConfigMapSummary>>,
    next: Option<NextLink>,
}

impl ListResponse for ConfigMapList {
    type Item = ConfigMapSummary;

    fn into_parts(self) -> (Option<Vec<ConfigMapSummary>>, Option<NextLink>) {
        (self.config_maps, self.next)
    }
}

/// Walks a Code Engine collection by following the `next.start` token of
/// each page. A page without a `next` link is the last one.
pub struct CodeEnginePager<'a, L> {
    client: &'a CodeEngineClient,
    url: Url,
    cursor: Option<Cursor>,
    done: bool,
    _list: PhantomData<fn() -> L>,
}

impl<'a, L> CodeEnginePager<'a, L> {
    pub fn new(client: &'a CodeEngineClient, url: Url) -> Self {
        CodeEnginePager {
            client,
            url,
            cursor: None,
            done: false,
            _list: PhantomData,
        }
    }
}

#[async_trait]
impl<'a, L: ListResponse> Pager for CodeEnginePager<'a, L> {
    type Item = L::Item;
    type Error = CodeEngineError;

    fn has_next(&self) -> bool {
        !self.done
    }

    async fn next_page(&mut self) -> Result<Option<Vec<L::Item>>, CodeEngineError> {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", PAGE_LIMIT);
            if let Some(cursor) = &self.cursor {
                query.append_pair("start", cursor.as_str());
            }
        }

        let response = self
            .client
            .authorized(self.client.client.get(url))
            .send()
            .await?;
        let page: L = decode(ensure_success(response).await?).await?;
        let (items, next) = page.into_parts();

        match next {
            Some(link) => self.cursor = Some(link.cursor()?),
            None => self.done = true,
        }

        Ok(items)
    }
}

#[derive(Serialize)]
struct CreateConfigMap<'a> {
    name: &'a str,
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ReplaceConfigMap<'a> {
    data: &'a BTreeMap<String, String>,
}

#[async_trait]
impl DocumentStore for CodeEngineClient {
    async fn list_projects(&self) -> Result<Vec<Project>, CodeEngineError> {
        let url = self.url(&["projects"])?;
        drain(CodeEnginePager::<ProjectList>::new(self, url)).await
    }

    async fn list_config_maps(
        &self,
        project_id: &str,
    ) -> Result<Vec<ConfigMapSummary>, CodeEngineError> {
        let url = self.url(&["projects", project_id, "config_maps"])?;
        drain(CodeEnginePager::<ConfigMapList>::new(self, url)).await
    }

    async fn get_config_map(
        &self,
        project_id: &str,
        name: &str,
    ) -> Result<ConfigMap, CodeEngineError> {
        let url = self.url(&["projects", project_id, "config_maps", name])?;
        let response = ensure_success(self.authorized(self.client.get(url)).send().await?).await?;

        let etag_header = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let mut config_map: ConfigMap = decode(response).await?;
        if config_map.entity_tag.is_none() {
            config_map.entity_tag = etag_header;
        }

        Ok(config_map)
    }

    async fn create_config_map(
        &self,
        project_id: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<(), CodeEngineError> {
        let url = self.url(&["projects", project_id, "config_maps"])?;
        let response = self
            .authorized(self.client.post(url))
            .json(&CreateConfigMap { name, data })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn replace_config_map(
        &self,
        project_id: &str,
        name: &str,
        if_match: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<(), CodeEngineError> {
        let url = self.url(&["projects", project_id, "config_maps", name])?;
        let response = self
            .authorized(self.client.put(url))
            .header(IF_MATCH, if_match)
            .json(&ReplaceConfigMap { data })
            .send()
            .await?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            return Err(CodeEngineError::Conflict { name: name.into() });
        }
        ensure_success(response).await?;
        Ok(())
    }
}
