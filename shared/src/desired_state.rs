use serde::{Deserialize, Serialize};
use serde_json::Number;

/// The desired CPU/RAM of one PVM instance.
///
/// `cpu` and `ram` keep the numeric representation they were read with, so
/// fractional processor counts survive a publish/apply cycle unchanged.
/// They are `null` when the listing did not report them; the scaler then
/// rejects the record on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub instance_id: String,
    pub instance_name: String,
    pub cpu: Option<Number>,
    pub ram: Option<Number>,
}

/// Ordered set of [`ResourceRecord`]s stored as one JSON text blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredStateDocument(pub Vec<ResourceRecord>);

impl DesiredStateDocument {
    pub fn records(&self) -> &[ResourceRecord] {
        &self.0
    }

    pub fn into_records(self) -> Vec<ResourceRecord> {
        self.0
    }

    /// Serializes the whole document. Non-ASCII names are written as-is.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Vec<ResourceRecord>> for DesiredStateDocument {
    fn from(records: Vec<ResourceRecord>) -> Self {
        DesiredStateDocument(records)
    }
}
