use reqwest::StatusCode;
use shared::power_iaas::PowerIaasError;
use std::error::Error as _;
use thiserror::Error;

/// Code reported for records whose update never got an HTTP response.
pub const TRANSPORT_FAILURE_CODE: u16 = 500;

/// Why a single record could not be scaled. These never abort the batch;
/// each one becomes the outcome of its record.
#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("Missing or invalid '{field}' in desired state record")]
    InvalidRecord { field: &'static str },

    /// The API answered outside the 200..=204 range. The message is the
    /// raw response body.
    #[error("{body}")]
    Rejected { status: StatusCode, body: String },

    /// Timeout, connection failure or similar.
    #[error("{message}")]
    Transport { message: String },
}

impl ScaleError {
    pub fn code(&self) -> u16 {
        match self {
            ScaleError::InvalidRecord { .. } => StatusCode::BAD_REQUEST.as_u16(),
            ScaleError::Rejected { status, .. } => status.as_u16(),
            ScaleError::Transport { .. } => TRANSPORT_FAILURE_CODE,
        }
    }

    /// Tag value used for the scale request metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            ScaleError::InvalidRecord { .. } => "invalid",
            ScaleError::Rejected { .. } => "rejected",
            ScaleError::Transport { .. } => "transport",
        }
    }
}

impl From<PowerIaasError> for ScaleError {
    fn from(e: PowerIaasError) -> Self {
        // Keep the causes (e.g. "operation timed out") in the message.
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }

        ScaleError::Transport { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ScaleError::InvalidRecord { field: "ram" }.code(), 400);
        assert_eq!(
            ScaleError::Rejected {
                status: StatusCode::CONFLICT,
                body: "busy".into()
            }
            .code(),
            409
        );

        let transport = ScaleError::from(PowerIaasError::InvalidUrl("cannot-be-a-base".into()));
        assert_eq!(transport.code(), TRANSPORT_FAILURE_CODE);
        assert_eq!(transport.to_string(), "invalid URL: cannot-be-a-base");
    }

    #[test]
    fn test_rejected_message_is_body() {
        let err = ScaleError::Rejected {
            status: StatusCode::BAD_REQUEST,
            body: "{\"description\":\"bad processors\"}".into(),
        };
        assert_eq!(err.to_string(), "{\"description\":\"bad processors\"}");
    }
}
