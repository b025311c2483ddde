//! Helpers for reading invocation configuration out of an environment
//! lookup. Workflows take a lookup closure instead of reading the process
//! environment directly so their configuration can be built in tests.

use crate::errors::FunctionError;
use crate::http::Credentials;
use std::time::Duration;

pub const IAM_TOKEN: &str = "IBM_CLOUD_IAM_TOKEN";
pub const CRN: &str = "CRN";
pub const HTTP_TIMEOUT_SECS: &str = "PVS_SCALE_HTTP_TIMEOUT_SECS";

/// Returns the trimmed value of `key`, treating blank values as unset.
pub fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn required<F>(lookup: &F, key: &str) -> Result<String, FunctionError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| {
        FunctionError::InvalidInput(format!("Missing {key} environment variable"))
    })
}

pub fn credentials<F>(lookup: &F) -> Result<Credentials, FunctionError>
where
    F: Fn(&str) -> Option<String>,
{
    required(lookup, IAM_TOKEN).map(Credentials::new)
}

/// Timeout applied to every HTTP call. The environment overrides `default`.
pub fn http_timeout<F>(lookup: &F, default: Duration) -> Result<Duration, FunctionError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, HTTP_TIMEOUT_SECS) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(FunctionError::InvalidInput(format!(
                "{HTTP_TIMEOUT_SECS} must be a positive number of seconds, got '{raw}'"
            ))),
        },
    }
}
