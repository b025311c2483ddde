use crate::errors::FunctionError;
use regex::Regex;
use std::sync::LazyLock;

// 8-4-4-4-12 hex groups, matched case-insensitively.
static SERVICE_INSTANCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("service instance regex is valid")
});

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CrnError {
    #[error("CRN is required")]
    Empty,
}

impl From<CrnError> for FunctionError {
    fn from(e: CrnError) -> Self {
        FunctionError::InvalidInput(e.to_string())
    }
}

/// Extracts the service instance UUID from a CRN such as
/// `crn:v1:bluemix:public:power-iaas:dal10:a/<account>:<uuid>::`.
///
/// Returns the first UUID-shaped substring, or `None` when the CRN does
/// not contain one.
pub fn service_instance_from_crn(crn: &str) -> Result<Option<&str>, CrnError> {
    if crn.is_empty() {
        return Err(CrnError::Empty);
    }

    Ok(SERVICE_INSTANCE_REGEX.find(crn).map(|m| m.as_str()))
}

/// Like [`service_instance_from_crn`], but treats a CRN without a service
/// instance as invalid input. Used where the identifier becomes a path
/// parameter.
pub fn require_service_instance(crn: &str) -> Result<String, FunctionError> {
    service_instance_from_crn(crn)?
        .map(String::from)
        .ok_or_else(|| {
            FunctionError::InvalidInput("Unable to extract cloud_instance_id from CRN".into())
        })
}
