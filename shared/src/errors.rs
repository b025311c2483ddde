use http::StatusCode;
use thiserror::Error;

/// Result type alias for workflow operations
pub type Result<T, E = FunctionError> = std::result::Result<T, E>;

/// Errors that abort a whole invocation.
///
/// Each variant maps to one `error` title and one status code in the
/// response envelope. Per-record failures of the scaler never become a
/// `FunctionError`; they are reported inside the success payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    /// Malformed or missing required parameter, caught before any network call.
    #[error("{0}")]
    InvalidInput(String),

    /// The desired-state payload could not be parsed.
    #[error("{0}")]
    InvalidConfiguration(String),

    /// Non-2xx, undecodable or unreachable upstream response.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Named project, region or document is absent.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl FunctionError {
    pub fn upstream(status: impl Into<u16>, message: impl Into<String>) -> Self {
        FunctionError::Upstream {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Short title used as the `error` field of the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            FunctionError::InvalidInput(_) => "InvalidInput",
            FunctionError::InvalidConfiguration(_) => "InvalidConfiguration",
            FunctionError::Upstream { .. } => "UpstreamError",
            FunctionError::NotFound(_) => "NotFound",
            FunctionError::Internal(_) => "InternalError",
        }
    }

    /// Status code reported to the caller. Upstream failures keep the
    /// upstream status when it is a valid HTTP status.
    pub fn status(&self) -> StatusCode {
        match self {
            FunctionError::InvalidInput(_) | FunctionError::InvalidConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            FunctionError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            FunctionError::NotFound(_) => StatusCode::NOT_FOUND,
            FunctionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for FunctionError {
    fn from(e: serde_json::Error) -> Self {
        FunctionError::Internal(format!("JSON serialization error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FunctionError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FunctionError::NotFound("project".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FunctionError::upstream(412u16, "conflict").status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            FunctionError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_upstream_status_falls_back_to_500() {
        let err = FunctionError::upstream(42u16, "weird");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "UpstreamError");
    }
}
