//! Fetch-and-publish: project the live PVM instances of a workspace into
//! the desired-state document and upsert it into the config map.

use crate::code_engine::{CodeEngineError, DocumentStore};
use crate::config::PublishTarget;
use crate::metrics_defs::{CONFIG_MAP_WRITES, INSTANCES_LISTED, INSTANCES_SKIPPED};
use shared::desired_state::{DesiredStateDocument, ResourceRecord};
use shared::errors::FunctionError;
use shared::power_iaas::{InstanceSource, PvmInstance};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Created,
    Replaced,
}

impl PublishAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PublishAction::Created => "created",
            PublishAction::Replaced => "replaced",
        }
    }
}

/// Projects listing entries into resource records.
///
/// Entries without an instance id are skipped. Every other entry is kept,
/// with missing processor or memory amounts carried as `null`.
pub fn project_instances(instances: Vec<PvmInstance>) -> Vec<ResourceRecord> {
    let mut records = Vec::with_capacity(instances.len());
    let mut skipped = 0u64;

    for instance in instances {
        let Some(instance_id) = instance.pvm_instance_id.filter(|id| !id.is_empty()) else {
            skipped += 1;
            tracing::debug!(server_name = ?instance.server_name, "Skipping instance without id");
            continue;
        };

        if instance.processors.is_none() || instance.memory.is_none() {
            tracing::warn!(%instance_id, "Instance listed without processors or memory");
        }

        records.push(ResourceRecord {
            instance_id,
            instance_name: instance.server_name.unwrap_or_default(),
            cpu: instance.processors,
            ram: instance.memory,
        });
    }

    if skipped > 0 {
        shared::counter!(INSTANCES_SKIPPED).increment(skipped);
    }

    records
}

/// Finds the id of the project named `name`.
pub async fn find_project_id<D>(store: &D, name: &str) -> Result<String, FunctionError>
where
    D: DocumentStore + ?Sized,
{
    store
        .list_projects()
        .await?
        .into_iter()
        .find(|project| project.name == name)
        .map(|project| project.id)
        .ok_or_else(|| {
            FunctionError::NotFound(format!("Project '{name}' not found in Code Engine"))
        })
}

/// Creates the config map, or replaces it wholesale guarded by the entity
/// tag read immediately before. A concurrent modification surfaces as a
/// conflict error and is not retried.
pub async fn publish<D>(
    store: &D,
    target: &PublishTarget,
    payload: String,
) -> Result<PublishAction, FunctionError>
where
    D: DocumentStore + ?Sized,
{
    let project_id = find_project_id(store, &target.project_name).await?;
    let name = target.config_map_name.as_str();
    let data = BTreeMap::from([(target.data_key.clone(), payload)]);

    let exists = store
        .list_config_maps(&project_id)
        .await?
        .iter()
        .any(|config_map| config_map.name == name);

    let action = if exists {
        tracing::info!(config_map = name, %project_id, "Updating existing ConfigMap");
        let current = store.get_config_map(&project_id, name).await?;
        let entity_tag = current
            .entity_tag
            .ok_or_else(|| CodeEngineError::MissingEntityTag { name: name.into() })?;
        store
            .replace_config_map(&project_id, name, &entity_tag, &data)
            .await?;
        PublishAction::Replaced
    } else {
        tracing::info!(config_map = name, %project_id, "Creating new ConfigMap");
        store.create_config_map(&project_id, name, &data).await?;
        PublishAction::Created
    };

    shared::counter!(CONFIG_MAP_WRITES, "action" => action.as_str()).increment(1);
    Ok(action)
}

/// Lists the instances of `cloud_instance_id`, projects them and publishes
/// the result. Returns the published records.
pub async fn fetch_and_publish<S, D>(
    source: &S,
    store: &D,
    cloud_instance_id: &str,
    target: &PublishTarget,
) -> Result<Vec<ResourceRecord>, FunctionError>
where
    S: InstanceSource + ?Sized,
    D: DocumentStore + ?Sized,
{
    let instances = source.list_instances(cloud_instance_id).await?;
    shared::histogram!(INSTANCES_LISTED).record(instances.len() as f64);

    let document = DesiredStateDocument::from(project_instances(instances));
    let payload = document.to_payload()?;
    tracing::debug!(records = document.records().len(), %payload, "Projected desired state");

    publish(store, target, payload).await?;

    Ok(document.into_records())
}
