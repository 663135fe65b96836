// ── Entity synchronizer ──
//
// Per entity: look it up by name; create it when absent; otherwise fetch
// its full body, convert it to name form, diff it against the desired
// body and update it when they differ. Updates that touch attached
// device templates can cascade into reattachment.

use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};
use vmanly_api::UpdateResponse;

use crate::context::SyncContext;
use crate::diff::{Change, diff};
use crate::error::CoreError;
use crate::model::entity::str_field;
use crate::model::{Document, Entity, EntityKind, Family};
use crate::resolve::Direction;

/// Knobs for an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Report what would change without writing.
    pub dry_run: bool,
    /// Allow updating entities that already exist.
    pub allow_update: bool,
    /// Reattach device templates affected by an update, and re-activate
    /// updated central policies that are active.
    pub push: bool,
    /// Continue with the next entity after a failure.
    pub keep_going: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
}

/// A created or updated entity (or one that would be, in a dry run).
#[derive(Debug, Clone, Serialize)]
pub struct EntityChange {
    pub kind: EntityKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    pub action: SyncAction,
    pub changes: Vec<Change>,
    /// Whether the write was sent.
    pub applied: bool,
    /// Device templates the controller reported as affected.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected_templates: Vec<String>,
    /// Device templates that were reattached.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reattached: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reactivated: bool,
}

#[derive(Debug)]
pub struct EntityFailure {
    pub kind: EntityKind,
    pub name: String,
    pub error: CoreError,
}

/// A failed entity sync. `landed` holds the update that reached the
/// controller before a follow-up (reattachment, re-activation) failed.
#[derive(Debug)]
struct EntitySyncError {
    error: CoreError,
    landed: Option<Box<EntityChange>>,
}

impl From<CoreError> for EntitySyncError {
    fn from(error: CoreError) -> Self {
        Self {
            error,
            landed: None,
        }
    }
}

/// Outcome of a document run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub changes: Vec<EntityChange>,
    /// Entities already matching their desired body.
    pub unchanged: usize,
    pub failures: Vec<EntityFailure>,
    /// The run stopped at the first failure.
    pub aborted: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn created(&self) -> usize {
        self.count(SyncAction::Create)
    }

    pub fn updated(&self) -> usize {
        self.count(SyncAction::Update)
    }

    fn count(&self, action: SyncAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }
}

impl SyncContext {
    /// Sync every body of `document`, family by family in dependency
    /// order, bodies in document order. `only` restricts the kinds
    /// (empty means all).
    pub async fn sync_document(
        &self,
        document: &Document,
        only: &[EntityKind],
        options: SyncOptions,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let mut family: Option<Family> = None;

        for kind in EntityKind::iter() {
            if !only.is_empty() && !only.contains(&kind) {
                continue;
            }
            let bodies = document.section(kind);
            if bodies.is_empty() {
                continue;
            }
            if family != Some(kind.family()) {
                self.invalidate_all();
                family = Some(kind.family());
            }

            for desired in bodies {
                let name = body_name(kind, desired);
                match self.try_sync_entity(kind, desired, options).await {
                    Ok(Some(change)) => report.changes.push(change),
                    Ok(None) => report.unchanged += 1,
                    Err(EntitySyncError { error: e, landed }) => {
                        error!(%kind, name, error = %e, "sync failed");
                        if let Some(change) = landed {
                            report.changes.push(*change);
                        }
                        report.failures.push(EntityFailure {
                            kind,
                            name,
                            error: e,
                        });
                        if !options.keep_going {
                            report.aborted = true;
                            return report;
                        }
                    }
                }
            }
        }
        report
    }

    /// Sync one name-form body. `None` when the entity already matches.
    pub async fn sync_entity(
        &self,
        kind: EntityKind,
        desired: &Value,
        options: SyncOptions,
    ) -> Result<Option<EntityChange>, CoreError> {
        self.try_sync_entity(kind, desired, options)
            .await
            .map_err(|e| e.error)
    }

    async fn try_sync_entity(
        &self,
        kind: EntityKind,
        desired: &Value,
        options: SyncOptions,
    ) -> Result<Option<EntityChange>, EntitySyncError> {
        let Some(name) = str_field(desired, kind.name_field()) else {
            return Err(EntitySyncError::from(CoreError::Validation {
                message: format!(
                    "{} body has no '{}' field",
                    kind.label(),
                    kind.name_field()
                ),
            }));
        };
        let entity_type = str_field(desired, kind.type_field());
        let ignore = kind.ignored_fields();

        let Some(existing) = self.find(kind, entity_type, name).await? else {
            let changes = diff(&json!({}), desired, ignore)?;
            let mut change = EntityChange {
                kind,
                name: name.to_owned(),
                entity_type: entity_type.map(str::to_owned),
                action: SyncAction::Create,
                changes,
                applied: false,
                affected_templates: Vec::new(),
                reattached: Vec::new(),
                reactivated: false,
            };
            if options.dry_run {
                // References may point at entities this run would create
                // first, so the payload isn't resolved.
                return Ok(Some(change));
            }

            let mut payload = desired.clone();
            strip_field(&mut payload, kind.id_field());
            self.convert(kind, &mut payload, Direction::ToIds).await?;
            let created = self.create_entity(kind, entity_type, &payload).await?;
            self.invalidate(kind);
            info!(
                %kind,
                name,
                id = str_field(&created, kind.id_field()).unwrap_or_default(),
                "created"
            );
            change.applied = true;
            return Ok(Some(change));
        };

        let mut current = self.fetch_body(&existing).await?;
        self.convert(kind, &mut current, Direction::ToNames).await?;
        let mut wanted = desired.clone();
        if let Value::Object(map) = &mut wanted {
            carry_description(map, &current, kind.description_field());
        }
        let changes = diff(&current, &wanted, ignore)?;
        if changes.is_empty() {
            debug!(%kind, name, "unchanged");
            return Ok(None);
        }

        let mut change = EntityChange {
            kind,
            name: name.to_owned(),
            entity_type: entity_type.map(str::to_owned),
            action: SyncAction::Update,
            changes,
            applied: false,
            affected_templates: Vec::new(),
            reattached: Vec::new(),
            reactivated: false,
        };
        if options.dry_run {
            return Ok(Some(change));
        }
        if !options.allow_update {
            info!(%kind, name, "differs from controller; update not allowed");
            return Ok(Some(change));
        }

        // Resolved just before the write: in a dry run the references may
        // name entities the run only reported as created.
        let id = existing.id.to_string();
        let mut payload = wanted;
        self.convert(kind, &mut payload, Direction::ToIds).await?;
        if let Value::Object(map) = &mut payload {
            map.insert(kind.id_field().to_owned(), Value::String(id.clone()));
        }

        let response = self
            .update_entity(kind, entity_type, &id, &payload)
            .await?;
        self.invalidate(kind);
        info!(%kind, name, id, "updated");
        change.applied = true;
        change.affected_templates = response.master_templates_affected.clone();

        if let Err(error) = self
            .after_update(&existing, &response, options, &mut change)
            .await
        {
            return Err(EntitySyncError {
                error,
                landed: Some(Box::new(change)),
            });
        }
        Ok(Some(change))
    }

    /// Follow-up of a sent update: the cascade, then central policy
    /// re-activation.
    async fn after_update(
        &self,
        existing: &Entity,
        response: &UpdateResponse,
        options: SyncOptions,
        change: &mut EntityChange,
    ) -> Result<(), CoreError> {
        self.cascade(response, options, &mut change.reattached)
            .await?;

        if existing.kind == EntityKind::CentralPolicies && options.push && is_activated(existing) {
            info!(name = %existing.name, "re-activating central policy");
            let handle = self
                .client
                .activate_central_policy(&existing.id.to_string())
                .await?;
            self.wait_for_action(&handle.id).await?;
            change.reactivated = true;
        }
        Ok(())
    }

    /// Reattach the device templates an update affected (with push), then
    /// release the edit lock it took. The lock is released even when a
    /// reattachment fails; the first failure stops the remaining ones.
    async fn cascade(
        &self,
        response: &UpdateResponse,
        options: SyncOptions,
        reattached: &mut Vec<String>,
    ) -> Result<(), CoreError> {
        let affected = &response.master_templates_affected;
        let mut outcome = Ok(());

        if !affected.is_empty() {
            if options.push {
                for template_id in affected {
                    match self.reattach(template_id).await {
                        Ok(_) => reattached.push(template_id.clone()),
                        Err(e) => {
                            outcome = Err(e);
                            break;
                        }
                    }
                }
            } else {
                warn!(
                    templates = ?affected,
                    "device templates affected by this change were not pushed"
                );
            }
        }

        if let Some(process_id) = &response.process_id {
            if let Err(e) = self.client.release_template_lock(process_id).await {
                warn!(process_id, error = %e, "failed to release template lock");
                if outcome.is_ok() {
                    outcome = Err(e.into());
                }
            }
        }

        outcome
    }
}

fn body_name(kind: EntityKind, body: &Value) -> String {
    str_field(body, kind.name_field())
        .unwrap_or("<unnamed>")
        .to_owned()
}

fn strip_field(body: &mut Value, field: &str) {
    if let Value::Object(map) = body {
        map.remove(field);
    }
}

/// Keep the controller's description when the desired body has none.
fn carry_description(payload: &mut Map<String, Value>, current: &Value, field: &str) {
    if payload.contains_key(field) {
        return;
    }
    if let Some(description) = current.get(field) {
        payload.insert(field.to_owned(), description.clone());
    }
}

fn is_activated(entity: &Entity) -> bool {
    entity
        .body
        .get("isPolicyActivated")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
