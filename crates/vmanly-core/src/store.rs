// ── Per-kind dispatch onto the dataservice endpoints ──
//
// The resolver, synchronizer and exporter speak in `EntityKind`s; this
// module maps each kind onto its API group.

use serde_json::Value;
use tracing::debug;
use vmanly_api::{DEFINITION_TYPES, UpdateResponse};

use crate::context::SyncContext;
use crate::error::CoreError;
use crate::model::{Entity, EntityKind};

impl SyncContext {
    /// Fetch the raw listing of a kind.
    ///
    /// Definitions have no global listing and are gathered type by type;
    /// types the controller doesn't know (404) are skipped.
    pub(crate) async fn fetch_listing(&self, kind: EntityKind) -> Result<Vec<Value>, CoreError> {
        let client = &self.client;
        let listing = match kind {
            EntityKind::Lists => client.list_policy_lists().await?,
            EntityKind::Definitions => {
                let mut all = Vec::new();
                for definition_type in DEFINITION_TYPES {
                    all.extend(unwrap_or_empty(
                        definition_type,
                        client.list_policy_definitions(definition_type).await,
                    )?);
                }
                all
            }
            EntityKind::CentralPolicies
            | EntityKind::LocalPolicies
            | EntityKind::SecurityPolicies => {
                client.list_policies(policy_scope(kind)?).await?
            }
            EntityKind::FeatureTemplates => client.list_feature_templates().await?,
            EntityKind::DeviceTemplates => client.list_device_templates().await?,
        };
        debug!(%kind, count = listing.len(), "fetched listing");
        Ok(listing)
    }

    /// Fetch the full wire body of a listed entity.
    ///
    /// List listings already carry the entries; every other kind needs a
    /// per-object fetch.
    pub(crate) async fn fetch_body(&self, entity: &Entity) -> Result<Value, CoreError> {
        let id = entity.id.to_string();
        let client = &self.client;
        let mut body = match entity.kind {
            EntityKind::Lists => entity.body.clone(),
            EntityKind::Definitions => {
                client
                    .get_policy_definition(required_type(entity)?, &id)
                    .await?
            }
            EntityKind::CentralPolicies
            | EntityKind::LocalPolicies
            | EntityKind::SecurityPolicies => {
                client.get_policy(policy_scope(entity.kind)?, &id).await?
            }
            EntityKind::FeatureTemplates => client.get_feature_template(&id).await?,
            EntityKind::DeviceTemplates => client.get_device_template(&id).await?,
        };

        // Object fetches of some kinds omit the identity fields the
        // listing carries.
        if let (Value::Object(full), Value::Object(listed)) = (&mut body, &entity.body) {
            let kind = entity.kind;
            for field in [kind.name_field(), kind.type_field()] {
                if !full.contains_key(field) {
                    if let Some(value) = listed.get(field) {
                        full.insert(field.to_owned(), value.clone());
                    }
                }
            }
        }
        Ok(body)
    }

    /// Create an entity from an id-form payload.
    pub(crate) async fn create_entity(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        payload: &Value,
    ) -> Result<Value, CoreError> {
        let client = &self.client;
        let created = match kind {
            EntityKind::Lists => {
                client
                    .create_policy_list(type_or_invalid(kind, entity_type)?, payload)
                    .await?
            }
            EntityKind::Definitions => {
                client
                    .create_policy_definition(type_or_invalid(kind, entity_type)?, payload)
                    .await?
            }
            EntityKind::CentralPolicies
            | EntityKind::LocalPolicies
            | EntityKind::SecurityPolicies => {
                client.create_policy(policy_scope(kind)?, payload).await?
            }
            EntityKind::FeatureTemplates => client.create_feature_template(payload).await?,
            EntityKind::DeviceTemplates => client.create_device_template(payload).await?,
        };
        Ok(created)
    }

    /// Update an entity in place from an id-form payload.
    pub(crate) async fn update_entity(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        id: &str,
        payload: &Value,
    ) -> Result<UpdateResponse, CoreError> {
        let client = &self.client;
        let resp = match kind {
            EntityKind::Lists => {
                client
                    .update_policy_list(type_or_invalid(kind, entity_type)?, id, payload)
                    .await?
            }
            EntityKind::Definitions => {
                client
                    .update_policy_definition(type_or_invalid(kind, entity_type)?, id, payload)
                    .await?
            }
            EntityKind::CentralPolicies
            | EntityKind::LocalPolicies
            | EntityKind::SecurityPolicies => {
                client.update_policy(policy_scope(kind)?, id, payload).await?
            }
            EntityKind::FeatureTemplates => client.update_feature_template(id, payload).await?,
            EntityKind::DeviceTemplates => client.update_device_template(id, payload).await?,
        };
        Ok(resp)
    }
}

fn policy_scope(kind: EntityKind) -> Result<vmanly_api::PolicyScope, CoreError> {
    kind.policy_scope()
        .ok_or_else(|| CoreError::Internal(format!("{kind} has no policy scope")))
}

fn required_type(entity: &Entity) -> Result<&str, CoreError> {
    type_or_invalid(entity.kind, entity.entity_type.as_deref())
}

fn type_or_invalid(kind: EntityKind, entity_type: Option<&str>) -> Result<&str, CoreError> {
    entity_type.ok_or_else(|| CoreError::Validation {
        message: format!("{} body has no '{}' field", kind.label(), kind.type_field()),
    })
}

/// Downgrade a listing to empty when the endpoint returns 404.
///
/// Older controllers lack some definition types; rather than failing the
/// whole listing, log and move on.
fn unwrap_or_empty(
    endpoint: &str,
    result: Result<Vec<Value>, vmanly_api::Error>,
) -> Result<Vec<Value>, CoreError> {
    match result {
        Ok(items) => Ok(items),
        Err(ref e) if e.is_not_found() => {
            debug!(endpoint, "definition type not available on this controller");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
