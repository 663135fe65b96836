// ── Entity kinds and their wire schema ──
//
// One variant per document section. Each kind knows its wire field names,
// whether names are unique per type or per kind, which fields are
// volatile (ignored when diffing), and which other kinds its bodies
// reference.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use vmanly_api::PolicyScope;

/// The four dependency families, in sync order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    List,
    Definition,
    Policy,
    Template,
}

/// A document section / controller collection.
///
/// Variant order is the dependency order used by sync.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    Lists,
    Definitions,
    CentralPolicies,
    LocalPolicies,
    SecurityPolicies,
    FeatureTemplates,
    DeviceTemplates,
}

const LIST_IGNORED: &[&str] = &[
    "listId",
    "references",
    "lastUpdated",
    "activatedId",
    "policyId",
    "isActivatedByVsmart",
    "owner",
    "infoTag",
    "referenceCount",
    "readOnly",
    "version",
];

const DEFINITION_IGNORED: &[&str] = &[
    "definitionId",
    "references",
    "lastUpdated",
    "activatedId",
    "isActivatedByVsmart",
    "owner",
    "infoTag",
    "referenceCount",
    "readOnly",
    "mode",
    "optimized",
];

const POLICY_IGNORED: &[&str] = &[
    "policyId",
    "createdOn",
    "createdBy",
    "lastUpdatedOn",
    "lastUpdatedBy",
    "policyVersion",
    "isPolicyActivated",
    "@rid",
    "owner",
    "infoTag",
    "mode",
];

const FEATURE_TEMPLATE_IGNORED: &[&str] = &[
    "templateId",
    "createdOn",
    "createdBy",
    "lastUpdatedOn",
    "lastUpdatedBy",
    "@rid",
    "owner",
    "infoTag",
    "devicesAttached",
    "attachedMastersCount",
    "gTemplateClass",
    "editedTemplateDefinition",
];

const DEVICE_TEMPLATE_IGNORED: &[&str] = &[
    "templateId",
    "createdOn",
    "createdBy",
    "lastUpdatedOn",
    "lastUpdatedBy",
    "@rid",
    "owner",
    "infoTag",
    "devicesAttached",
    "attachedMastersCount",
    "templateAttached",
    "templateConfigurationEdited",
    "connectionPreference",
    "connectionPreferenceRequired",
    "draftMode",
];

impl EntityKind {
    pub fn family(self) -> Family {
        match self {
            Self::Lists => Family::List,
            Self::Definitions => Family::Definition,
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => Family::Policy,
            Self::FeatureTemplates | Self::DeviceTemplates => Family::Template,
        }
    }

    /// Singular, human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lists => "list",
            Self::Definitions => "definition",
            Self::CentralPolicies => "central policy",
            Self::LocalPolicies => "local policy",
            Self::SecurityPolicies => "security policy",
            Self::FeatureTemplates => "feature template",
            Self::DeviceTemplates => "device template",
        }
    }

    pub fn id_field(self) -> &'static str {
        match self {
            Self::Lists => "listId",
            Self::Definitions => "definitionId",
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => "policyId",
            Self::FeatureTemplates | Self::DeviceTemplates => "templateId",
        }
    }

    pub fn name_field(self) -> &'static str {
        match self {
            Self::Lists | Self::Definitions => "name",
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => "policyName",
            Self::FeatureTemplates | Self::DeviceTemplates => "templateName",
        }
    }

    pub fn type_field(self) -> &'static str {
        match self {
            Self::Lists | Self::Definitions => "type",
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => "policyType",
            Self::FeatureTemplates => "templateType",
            Self::DeviceTemplates => "deviceType",
        }
    }

    pub fn description_field(self) -> &'static str {
        match self {
            Self::Lists | Self::Definitions => "description",
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => {
                "policyDescription"
            }
            Self::FeatureTemplates | Self::DeviceTemplates => "templateDescription",
        }
    }

    /// Lists and definitions are named uniquely per type; everything else
    /// per kind.
    pub fn scoped_by_type(self) -> bool {
        matches!(self, Self::Lists | Self::Definitions)
    }

    /// Root-level fields excluded from diffs and exports.
    pub fn ignored_fields(self) -> &'static [&'static str] {
        match self {
            Self::Lists => LIST_IGNORED,
            Self::Definitions => DEFINITION_IGNORED,
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => POLICY_IGNORED,
            Self::FeatureTemplates => FEATURE_TEMPLATE_IGNORED,
            Self::DeviceTemplates => DEVICE_TEMPLATE_IGNORED,
        }
    }

    /// Kinds whose bodies this kind references by id.
    pub fn dependencies(self) -> &'static [EntityKind] {
        match self {
            Self::Lists | Self::FeatureTemplates => &[],
            Self::Definitions => &[Self::Lists],
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => {
                &[Self::Definitions, Self::Lists]
            }
            Self::DeviceTemplates => &[
                Self::FeatureTemplates,
                Self::LocalPolicies,
                Self::SecurityPolicies,
            ],
        }
    }

    pub fn policy_scope(self) -> Option<PolicyScope> {
        match self {
            Self::CentralPolicies => Some(PolicyScope::Central),
            Self::LocalPolicies => Some(PolicyScope::Local),
            Self::SecurityPolicies => Some(PolicyScope::Security),
            _ => None,
        }
    }

    /// Flag marking built-in objects the controller ships with.
    pub fn default_marker(self) -> Option<&'static str> {
        match self {
            Self::Lists | Self::Definitions => Some("readOnly"),
            Self::FeatureTemplates | Self::DeviceTemplates => Some("factoryDefault"),
            Self::CentralPolicies | Self::LocalPolicies | Self::SecurityPolicies => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn iteration_follows_dependency_order() {
        let kinds: Vec<EntityKind> = EntityKind::iter().collect();
        for (i, kind) in kinds.iter().enumerate() {
            for dep in kind.dependencies() {
                let pos = kinds.iter().position(|k| k == dep).unwrap();
                assert!(pos < i, "{kind} depends on later kind {dep}");
            }
        }
    }

    #[test]
    fn section_names_parse() {
        assert_eq!(
            "central_policies".parse::<EntityKind>().unwrap(),
            EntityKind::CentralPolicies
        );
        assert_eq!(EntityKind::DeviceTemplates.as_ref(), "device_templates");
        assert!("widgets".parse::<EntityKind>().is_err());
    }

    #[test]
    fn id_field_is_always_ignored() {
        for kind in EntityKind::iter() {
            assert!(kind.ignored_fields().contains(&kind.id_field()));
        }
    }
}
