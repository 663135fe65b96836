// Dataservice wire types
//
// Entity bodies (lists, definitions, policies, templates) stay as
// `serde_json::Value`: the sync engine diffs and rewrites them
// structurally. Only the envelopes and the workflow payloads that the
// client itself interprets are typed here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ "data": [...] }` listing envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `{ "error": { ... } }` error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub details: Option<String>,
    pub code: Option<String>,
}

/// Response to an update (`PUT`) of a list, definition, policy or template.
///
/// A list update that touches attached templates answers with a lock
/// (`processId`) and the ids of the affected device templates.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub master_templates_affected: Vec<String>,
}

/// Handle returned by every asynchronous device action.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActionHandle {
    pub id: String,
}

/// A device attached to a device template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachedDevice {
    pub uuid: String,
    #[serde(rename = "host-name", default)]
    pub host_name: Option<String>,
    #[serde(rename = "deviceIP", default)]
    pub device_ip: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
}

/// `POST template/device/config/input` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInputRequest {
    pub template_id: String,
    pub device_ids: Vec<String>,
    pub is_edited: bool,
    pub is_master_edited: bool,
}

/// Per-device variable values for a device template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateInput {
    #[serde(default)]
    pub header: InputHeader,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputHeader {
    #[serde(default)]
    pub columns: Vec<InputColumn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputColumn {
    pub property: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub editable: bool,
}

impl TemplateInput {
    /// Properties of the columns whose values may be re-submitted.
    pub fn editable_properties(&self) -> impl Iterator<Item = &str> {
        self.header
            .columns
            .iter()
            .filter(|c| c.editable)
            .map(|c| c.property.as_str())
    }
}

/// `POST template/device/config/attachfeature` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub device_template_list: Vec<DeviceTemplateAttachment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTemplateAttachment {
    pub template_id: String,
    pub device: Vec<Map<String, Value>>,
    pub is_edited: bool,
    pub is_master_edited: bool,
}

/// `GET device/action/status/{id}` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionStatus {
    #[serde(default)]
    pub summary: ActionSummary,
    #[serde(default)]
    pub data: Vec<ActionDeviceStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionSummary {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDeviceStatus {
    #[serde(default)]
    pub status_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub activity: Vec<String>,
}

impl ActionStatus {
    /// The action is still running while the summary reports one of the
    /// non-terminal states.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self.summary.status.as_str(),
            "in_progress" | "pending" | "scheduled"
        )
    }

    /// The first device row that failed, if any.
    pub fn failure(&self) -> Option<&ActionDeviceStatus> {
        self.data
            .iter()
            .find(|row| row.status_id.as_deref() == Some("failure"))
    }
}

impl ActionDeviceStatus {
    /// Last line of the row's activity log.
    pub fn last_activity(&self) -> Option<&str> {
        self.activity.last().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_status_terminal_states() {
        let running: ActionStatus = serde_json::from_value(json!({
            "summary": {"status": "in_progress"},
            "data": [{"statusId": "in_progress", "activity": ["Pushing"]}]
        }))
        .unwrap();
        assert!(!running.is_terminal());

        let done: ActionStatus = serde_json::from_value(json!({
            "summary": {"status": "done"},
            "data": [
                {"statusId": "success", "activity": ["ok"]},
                {"statusId": "failure", "activity": ["Pushing", "Failed to push: timeout"]}
            ]
        }))
        .unwrap();
        assert!(done.is_terminal());
        let failed = done.failure().unwrap();
        assert_eq!(failed.last_activity(), Some("Failed to push: timeout"));
    }

    #[test]
    fn update_response_defaults() {
        let resp: UpdateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp, UpdateResponse::default());

        let resp: UpdateResponse = serde_json::from_value(json!({
            "processId": "lock-1",
            "masterTemplatesAffected": ["t1", "t2"]
        }))
        .unwrap();
        assert_eq!(resp.process_id.as_deref(), Some("lock-1"));
        assert_eq!(resp.master_templates_affected, vec!["t1", "t2"]);
    }

    #[test]
    fn editable_properties_filter() {
        let input: TemplateInput = serde_json::from_value(json!({
            "header": {"columns": [
                {"property": "csv-status", "editable": false},
                {"property": "/0/vpn_if_name/interface/if-name", "editable": true}
            ]},
            "data": []
        }))
        .unwrap();
        let props: Vec<&str> = input.editable_properties().collect();
        assert_eq!(props, vec!["/0/vpn_if_name/interface/if-name"]);
    }
}
