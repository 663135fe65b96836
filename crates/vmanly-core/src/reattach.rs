// ── Cascade reattachment ──
//
// After a shared object changes, every device template built on it must
// be re-pushed to its devices with their current variable values. The
// push is asynchronous; `wait_for_action` polls it to a terminal state
// within the context's poll bounds.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, info, trace};
use vmanly_api::{ActionStatus, TemplateInput};

use crate::config::PollConfig;
use crate::context::SyncContext;
use crate::error::CoreError;
use crate::model::EntityKind;

impl SyncContext {
    /// Re-attach a device template to every device it is attached to and
    /// wait for the push to finish.
    ///
    /// Returns the action id, or `None` when no device is attached.
    pub async fn reattach(&self, template_id: &str) -> Result<Option<String>, CoreError> {
        let devices = self.client.list_attached_devices(template_id).await?;
        if devices.is_empty() {
            debug!(template_id, "no attached devices; nothing to reattach");
            return Ok(None);
        }

        let device_ids: Vec<String> = devices.into_iter().map(|d| d.uuid).collect();
        let input = self
            .client
            .get_template_input(template_id, &device_ids)
            .await?;
        let rows = attachment_rows(template_id, &input);

        info!(template_id, devices = rows.len(), "reattaching device template");
        let handle = self.client.attach_device_template(template_id, rows).await?;
        self.wait_for_action(&handle.id).await?;
        Ok(Some(handle.id))
    }

    /// Reattach a device template by name.
    pub async fn reattach_by_name(&self, name: &str) -> Result<Option<String>, CoreError> {
        let id = self
            .resolve_name_to_id(EntityKind::DeviceTemplates, None, name)
            .await?;
        self.reattach(&id.to_string()).await
    }

    /// Poll an asynchronous action until it reaches a terminal state.
    ///
    /// A terminal action with a failed device row is `ActionFailed`
    /// carrying that row's last activity line; running out of attempts is
    /// `ActionTimeout`.
    pub async fn wait_for_action(&self, action_id: &str) -> Result<ActionStatus, CoreError> {
        let PollConfig {
            interval,
            max_attempts,
        } = self.poll;

        for attempt in 1..=max_attempts {
            let status = self.client.get_action_status(action_id).await?;
            if status.is_terminal() {
                if let Some(row) = status.failure() {
                    return Err(CoreError::ActionFailed {
                        action_id: action_id.to_owned(),
                        activity: row
                            .last_activity()
                            .unwrap_or("no activity reported")
                            .to_owned(),
                    });
                }
                debug!(action_id, attempt, status = %status.summary.status, "action finished");
                return Ok(status);
            }
            trace!(action_id, attempt, status = %status.summary.status, "action still running");
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(CoreError::ActionTimeout {
            action_id: action_id.to_owned(),
            attempts: max_attempts,
        })
    }
}

/// Keep each row's editable properties and `csv-*` identity columns, and
/// point it at the template.
fn attachment_rows(template_id: &str, input: &TemplateInput) -> Vec<Map<String, Value>> {
    let editable: HashSet<&str> = input.editable_properties().collect();
    input
        .data
        .iter()
        .map(|row| {
            let mut kept: Map<String, Value> = row
                .iter()
                .filter(|(key, _)| key.starts_with("csv-") || editable.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            kept.insert(
                "csv-templateId".to_owned(),
                Value::String(template_id.to_owned()),
            );
            kept
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_keep_editable_and_identity_columns() {
        let input: TemplateInput = serde_json::from_value(json!({
            "header": {"columns": [
                {"property": "csv-status", "editable": false},
                {"property": "csv-deviceId", "editable": false},
                {"property": "//system/host-name", "editable": true},
                {"property": "/0/vpn-instance/ip/route/0.0.0.0/0/next-hop/address", "editable": true},
                {"property": "readonly-column", "editable": false}
            ]},
            "data": [{
                "csv-status": "complete",
                "csv-deviceId": "dev-1",
                "csv-deviceIP": "10.0.0.1",
                "//system/host-name": "edge-1",
                "/0/vpn-instance/ip/route/0.0.0.0/0/next-hop/address": "192.0.2.1",
                "readonly-column": "x"
            }]
        }))
        .unwrap();

        let rows = attachment_rows("dt-1", &input);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["csv-templateId"], "dt-1");
        assert_eq!(row["csv-deviceId"], "dev-1");
        assert_eq!(row["csv-deviceIP"], "10.0.0.1");
        assert_eq!(row["//system/host-name"], "edge-1");
        assert!(!row.contains_key("readonly-column"));
    }
}
