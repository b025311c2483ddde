use crate::errors::FunctionError;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer credential for IBM Cloud APIs. The token is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    bearer_token: String,
}

impl Credentials {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Credentials {
            bearer_token: bearer_token.into(),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// Builds the HTTP client shared by all calls of one invocation. Every
/// request it sends is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FunctionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FunctionError::Internal(format!("could not build HTTP client: {e}")))
}

/// Reads the body of a failed response for the error message. A body that
/// cannot be read is logged and reported as empty.
pub async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(%status, error = %e, "Could not read error response body");
            String::new()
        }
    }
}

/// Appends percent-encoded path segments to `base`, collapsing any
/// trailing slash of the base path.
pub fn join_segments<I, S>(base: &Url, segments: I) -> Result<Url, FunctionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FunctionError::Internal(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
