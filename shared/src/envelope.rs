//! The response envelope returned to the invoker.
//!
//! Workflows return plain `Result`s. They are converted to an [`Outcome`]
//! at the boundary and only then serialized as
//! `{"headers": {...}, "statusCode": N, "body": {...}}`.

use crate::errors::FunctionError;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure {
        kind: &'static str,
        status: u16,
        message: String,
    },
}

impl<T> From<Result<T, FunctionError>> for Outcome<T> {
    fn from(result: Result<T, FunctionError>) -> Self {
        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => {
                tracing::error!(status = e.status().as_u16(), kind = e.kind(), "{e}");
                Outcome::Failure {
                    kind: e.kind(),
                    status: e.status().as_u16(),
                    message: e.to_string(),
                }
            }
        }
    }
}

impl<T: Serialize> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_envelope(self) -> Envelope<T> {
        let (status_code, body) = match self {
            Outcome::Success(payload) => (200, Body::Return { r#return: payload }),
            Outcome::Failure {
                kind,
                status,
                message,
            } => (
                status,
                Body::Error {
                    error: kind,
                    message,
                },
            ),
        };

        Envelope {
            headers: IndexMap::from([("Content-Type", "application/json")]),
            status_code,
            body,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub headers: IndexMap<&'static str, &'static str>,
    pub status_code: u16,
    pub body: Body<T>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Body<T> {
    Return { r#return: T },
    Error { error: &'static str, message: String },
}
