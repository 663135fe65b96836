// ── Declarative document ──
//
// The import/export file: seven sections of name-form bodies, no ids.
// JSON or YAML, chosen by file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntityKind;
use crate::error::CoreError;

/// On-disk encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` are YAML, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub central_policies: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_policies: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_policies: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_templates: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_templates: Vec<Value>,
}

impl Document {
    pub fn section(&self, kind: EntityKind) -> &[Value] {
        match kind {
            EntityKind::Lists => &self.lists,
            EntityKind::Definitions => &self.definitions,
            EntityKind::CentralPolicies => &self.central_policies,
            EntityKind::LocalPolicies => &self.local_policies,
            EntityKind::SecurityPolicies => &self.security_policies,
            EntityKind::FeatureTemplates => &self.feature_templates,
            EntityKind::DeviceTemplates => &self.device_templates,
        }
    }

    pub fn section_mut(&mut self, kind: EntityKind) -> &mut Vec<Value> {
        match kind {
            EntityKind::Lists => &mut self.lists,
            EntityKind::Definitions => &mut self.definitions,
            EntityKind::CentralPolicies => &mut self.central_policies,
            EntityKind::LocalPolicies => &mut self.local_policies,
            EntityKind::SecurityPolicies => &mut self.security_policies,
            EntityKind::FeatureTemplates => &mut self.feature_templates,
            EntityKind::DeviceTemplates => &mut self.device_templates,
        }
    }

    /// Total number of bodies across all sections.
    pub fn len(&self) -> usize {
        [
            &self.lists,
            &self.definitions,
            &self.central_policies,
            &self.local_policies,
            &self.security_policies,
            &self.feature_templates,
            &self.device_templates,
        ]
        .iter()
        .map(|s| s.len())
        .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, CoreError> {
        match format {
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| CoreError::Validation {
                message: format!("invalid JSON document: {e}"),
            }),
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| CoreError::Validation {
                message: format!("invalid YAML document: {e}"),
            }),
        }
    }

    pub fn render(&self, format: DocumentFormat) -> Result<String, CoreError> {
        match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| CoreError::Internal(format!("JSON serialization failed: {e}"))),
            DocumentFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| CoreError::Internal(format!("YAML serialization failed: {e}"))),
        }
    }
}
