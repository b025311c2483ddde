//! Apply-and-report: push the desired CPU/RAM of every record to its PVM
//! instance and report one outcome per record.
//!
//! Records are processed one at a time in input order. A record that fails
//! validation or whose update fails only affects its own outcome; the batch
//! always runs to the end.

use crate::errors::ScaleError;
use crate::metrics_defs::SCALE_REQUESTS;
use reqwest::StatusCode;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::errors::FunctionError;
use shared::power_iaas::{InstanceUpdater, UpdateReply, UpdateRequest};

pub const SUCCESS_MESSAGE: &str = "Scale completed successfully";

/// A desired-state record as read from configuration. Fields are checked
/// per record so one malformed entry cannot fail the batch.
pub type DesiredRecord = Map<String, Value>;

/// Parses the serialized desired-state document.
pub fn parse_desired_state(payload: &str) -> Result<Vec<DesiredRecord>, FunctionError> {
    serde_json::from_str(payload).map_err(|e| {
        FunctionError::InvalidConfiguration(format!(
            "Desired state must be a JSON array of records: {e}"
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub instance_id: String,
    pub message: String,
    pub code: u16,
}

impl ApplyOutcome {
    pub fn is_success(&self) -> bool {
        (200..=204).contains(&self.code)
    }
}

#[derive(Serialize)]
struct OutcomeDetail<'a> {
    message: &'a str,
    code: u16,
}

/// Serialized as `{"<instance_id>": {"message": ..., "code": ...}}`.
impl Serialize for ApplyOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.instance_id,
            &OutcomeDetail {
                message: &self.message,
                code: self.code,
            },
        )?;
        map.end()
    }
}

/// Outcomes in the order of the input records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApplyReport(pub Vec<ApplyOutcome>);

impl ApplyReport {
    pub fn outcomes(&self) -> &[ApplyOutcome] {
        &self.0
    }

    pub fn failed(&self) -> usize {
        self.0.iter().filter(|o| !o.is_success()).count()
    }
}

struct Scaled {
    status: StatusCode,
    message: String,
}

fn validate(record: &DesiredRecord) -> Result<(&str, UpdateRequest), ScaleError> {
    let instance_id = record
        .get("instance_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(ScaleError::InvalidRecord {
            field: "instance_id",
        })?;

    let number = |field: &'static str| match record.get(field) {
        Some(Value::Number(n)) => Ok(n.clone()),
        _ => Err(ScaleError::InvalidRecord { field }),
    };

    let request = UpdateRequest {
        processors: number("cpu")?,
        memory: number("ram")?,
    };

    Ok((instance_id, request))
}

fn classify(reply: UpdateReply) -> Result<Scaled, ScaleError> {
    let UpdateReply { status, body } = reply;

    if !(200..=204).contains(&status.as_u16()) {
        return Err(ScaleError::Rejected { status, body });
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(String::from))
        .unwrap_or_else(|| SUCCESS_MESSAGE.to_string());

    Ok(Scaled { status, message })
}

async fn scale_record<U>(
    updater: &U,
    cloud_instance_id: &str,
    record: &DesiredRecord,
) -> Result<Scaled, ScaleError>
where
    U: InstanceUpdater + ?Sized,
{
    let (instance_id, request) = validate(record)?;
    let reply = updater
        .update_instance(cloud_instance_id, instance_id, &request)
        .await?;
    classify(reply)
}

/// Scales every record and returns their outcomes in input order.
pub async fn apply<U>(
    updater: &U,
    cloud_instance_id: &str,
    records: &[DesiredRecord],
) -> ApplyReport
where
    U: InstanceUpdater + ?Sized,
{
    let mut outcomes = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let instance_id = record
            .get("instance_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("record[{index}]"), String::from);

        let outcome = match scale_record(updater, cloud_instance_id, record).await {
            Ok(scaled) => {
                tracing::info!(%instance_id, status = %scaled.status, "Scaled instance");
                shared::counter!(SCALE_REQUESTS, "outcome" => "success").increment(1);
                ApplyOutcome {
                    instance_id,
                    message: scaled.message,
                    code: scaled.status.as_u16(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    %instance_id,
                    code = e.code(),
                    error = %e,
                    "Failed to scale instance"
                );
                shared::counter!(SCALE_REQUESTS, "outcome" => e.outcome()).increment(1);
                ApplyOutcome {
                    instance_id,
                    message: e.to_string(),
                    code: e.code(),
                }
            }
        };

        outcomes.push(outcome);
    }

    ApplyReport(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TRANSPORT_FAILURE_CODE;
    use async_trait::async_trait;
    use serde_json::json;
    use shared::http::{Credentials, build_client};
    use shared::power_iaas::{PowerIaasClient, PowerIaasError};
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers every update with a fixed reply and records the calls.
    struct FakeUpdater {
        reply: Result<UpdateReply, String>,
        calls: Mutex<Vec<(String, UpdateRequest)>>,
    }

    impl FakeUpdater {
        fn replying(status: StatusCode, body: &str) -> Self {
            FakeUpdater {
                reply: Ok(UpdateReply {
                    status,
                    body: body.into(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl InstanceUpdater for FakeUpdater {
        async fn update_instance(
            &self,
            _cloud_instance_id: &str,
            pvm_instance_id: &str,
            request: &UpdateRequest,
        ) -> Result<UpdateReply, PowerIaasError> {
            self.calls
                .lock()
                .unwrap()
                .push((pvm_instance_id.into(), request.clone()));
            self.reply.clone().map_err(PowerIaasError::InvalidUrl)
        }
    }

    fn records(value: serde_json::Value) -> Vec<DesiredRecord> {
        parse_desired_state(&value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_field_skips_network_call() {
        let updater = FakeUpdater::replying(StatusCode::ACCEPTED, "{}");
        let records = records(json!([
            {"instance_id": "a", "instance_name": "n1", "cpu": 1, "ram": 4},
            {"instance_id": "b", "instance_name": "n2", "cpu": 2},
            {"instance_id": "c", "instance_name": "n3", "cpu": 0.5, "ram": 8}
        ]));

        let report = apply(&updater, "cid", &records).await;

        let ids: Vec<_> = report.outcomes().iter().map(|o| o.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.outcomes()[0].code, 202);
        assert_eq!(report.outcomes()[0].message, SUCCESS_MESSAGE);
        assert_eq!(report.outcomes()[1].code, 400);
        assert_eq!(
            report.outcomes()[1].message,
            "Missing or invalid 'ram' in desired state record"
        );
        assert_eq!(report.outcomes()[2].code, 202);

        assert_eq!(updater.call_count(), 2);
        let calls = updater.calls.lock().unwrap();
        assert_eq!(calls[1].0, "c");
        assert_eq!(
            serde_json::to_value(&calls[1].1).unwrap(),
            json!({"processors": 0.5, "memory": 8})
        );
    }

    #[tokio::test]
    async fn test_missing_instance_id_is_keyed_by_position() {
        let updater = FakeUpdater::replying(StatusCode::OK, "{}");
        let records = records(json!([
            {"cpu": 1, "ram": 2},
            {"instance_id": "", "cpu": 1, "ram": 2}
        ]));

        let report = apply(&updater, "cid", &records).await;

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!([
                {"record[0]": {"message": "Missing or invalid 'instance_id' in desired state record", "code": 400}},
                {"record[1]": {"message": "Missing or invalid 'instance_id' in desired state record", "code": 400}}
            ])
        );
        assert_eq!(updater.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_message_from_body() {
        let updater = FakeUpdater::replying(StatusCode::OK, r#"{"message": "resize queued"}"#);
        let records = records(json!([{"instance_id": "a", "cpu": 1, "ram": 2}]));

        let report = apply(&updater, "cid", &records).await;

        assert_eq!(
            report.outcomes(),
            &[ApplyOutcome {
                instance_id: "a".into(),
                message: "resize queued".into(),
                code: 200,
            }]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_per_record() {
        let updater = FakeUpdater {
            reply: Err("unreachable".into()),
            calls: Mutex::new(Vec::new()),
        };
        let records = records(json!([
            {"instance_id": "a", "cpu": 1, "ram": 2},
            {"instance_id": "b", "cpu": 1, "ram": 2}
        ]));

        let report = apply(&updater, "cid", &records).await;

        assert_eq!(report.failed(), 2);
        assert!(
            report
                .outcomes()
                .iter()
                .all(|o| o.code == TRANSPORT_FAILURE_CODE && o.message.contains("unreachable"))
        );
        assert_eq!(updater.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_does_not_stop_the_batch() {
        let server = MockServer::start().await;
        let base = "/pcloud/v1/cloud-instances/cid/pvm-instances";
        Mock::given(method("PUT"))
            .and(path(format!("{base}/a")))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"processors": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{base}/b")))
            .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{base}/c")))
            .respond_with(ResponseTemplate::new(400).set_body_string("memory exceeds system pool"))
            .expect(1)
            .mount(&server)
            .await;

        let client = PowerIaasClient::new(
            build_client(Duration::from_millis(200)).unwrap(),
            Url::parse(&format!("{}/pcloud/v1", server.uri())).unwrap(),
            Credentials::new("token"),
            "crn:v1:test",
        );
        let records = records(json!([
            {"instance_id": "a", "cpu": 1, "ram": 2},
            {"instance_id": "b", "cpu": 1, "ram": 2},
            {"instance_id": "c", "cpu": 1, "ram": 4096}
        ]));

        let report = apply(&client, "cid", &records).await;
        let outcomes = report.outcomes();

        assert_eq!(outcomes.len(), 3);
        assert_eq!((outcomes[0].code, outcomes[0].message.as_str()), (202, SUCCESS_MESSAGE));
        assert_eq!(outcomes[1].instance_id, "b");
        assert_eq!(outcomes[1].code, TRANSPORT_FAILURE_CODE);
        assert!(outcomes[1].message.starts_with("HTTP error"));
        assert_eq!(
            (outcomes[2].code, outcomes[2].message.as_str()),
            (400, "memory exceeds system pool")
        );
    }

    #[test]
    fn test_malformed_payload_is_invalid_configuration() {
        for payload in ["not json", r#"{"instance_id": "a"}"#, r#"[1, 2]"#] {
            assert!(matches!(
                parse_desired_state(payload),
                Err(FunctionError::InvalidConfiguration(_))
            ));
        }
        assert_eq!(parse_desired_state("[]").unwrap(), Vec::<DesiredRecord>::new());
    }

    #[test]
    fn test_failed_counts_non_success_codes() {
        let report = ApplyReport(vec![
            ApplyOutcome {
                instance_id: "z".into(),
                message: "ok".into(),
                code: 204,
            },
            ApplyOutcome {
                instance_id: "a".into(),
                message: "busy".into(),
                code: 409,
            },
        ]);

        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_published_record_without_sizing_is_rejected_per_record() {
        let updater = FakeUpdater::replying(StatusCode::OK, "{}");
        let records = records(json!([
            {"instance_id": "building", "instance_name": "n2", "cpu": null, "ram": null},
            {"instance_id": "a", "instance_name": "n1", "cpu": 1, "ram": 2}
        ]));

        let report = apply(&updater, "cid", &records).await;

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!([
                {"building": {"message": "Missing or invalid 'cpu' in desired state record", "code": 400}},
                {"a": {"message": SUCCESS_MESSAGE, "code": 200}}
            ])
        );
        assert_eq!(updater.call_count(), 1);
    }
}
