// ── Reference shapes ──
//
// Where a body refers to another entity, and in which form. Classified
// from the attribute name, the owning kind and the object depth; the walk
// only ever acts on what this module returns.

use crate::model::EntityKind;

/// Which way a walk converts references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Names to server ids (before a write).
    ToIds,
    /// Server ids to names (after a read).
    ToNames,
}

/// A reference-bearing attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceShape {
    /// `siteList: <id>`: one list of the type named by the key.
    ListId { list_type: String },
    /// `vpnLists: [<id>, ...]`: ordered lists of the type named by the key.
    ListIds { list_type: String },
    /// `sourceZone` / `destinationZone` of zone-based firewall definitions.
    ZoneId,
    /// `ref: <id>` ↔ `listName` + `listType`.
    TypedRef,
    /// `class: <id>` ↔ `className` + `classType`.
    TypedClass,
    /// `definitionId` ↔ `definitionName`, typed by the sibling `type`.
    Definition,
    /// `templateId` ↔ `templateName` below the root of a device template.
    FeatureTemplate,
    /// Root `policyId` ↔ `policyName` of a device template.
    LocalPolicy,
    /// Root `securityPolicyId` ↔ `securityPolicyName` of a device template.
    SecurityPolicy,
}

/// Wire-form (id) attribute and name-form attributes of a shape whose
/// attribute name changes with the direction.
pub(crate) struct RenamedForm {
    pub id_key: &'static str,
    pub name_key: &'static str,
    /// Companion attribute carrying the target's type in name form.
    pub type_key: Option<&'static str>,
}

impl ReferenceShape {
    /// Kind of the referenced entity.
    pub fn target(&self) -> EntityKind {
        match self {
            Self::ListId { .. }
            | Self::ListIds { .. }
            | Self::ZoneId
            | Self::TypedRef
            | Self::TypedClass => EntityKind::Lists,
            Self::Definition => EntityKind::Definitions,
            Self::FeatureTemplate => EntityKind::FeatureTemplates,
            Self::LocalPolicy => EntityKind::LocalPolicies,
            Self::SecurityPolicy => EntityKind::SecurityPolicies,
        }
    }

    pub(crate) fn renamed_form(&self) -> Option<RenamedForm> {
        let form = match self {
            Self::TypedRef => RenamedForm {
                id_key: "ref",
                name_key: "listName",
                type_key: Some("listType"),
            },
            Self::TypedClass => RenamedForm {
                id_key: "class",
                name_key: "className",
                type_key: Some("classType"),
            },
            Self::Definition => RenamedForm {
                id_key: "definitionId",
                name_key: "definitionName",
                type_key: None,
            },
            Self::FeatureTemplate => RenamedForm {
                id_key: "templateId",
                name_key: "templateName",
                type_key: None,
            },
            Self::LocalPolicy => RenamedForm {
                id_key: "policyId",
                name_key: "policyName",
                type_key: None,
            },
            Self::SecurityPolicy => RenamedForm {
                id_key: "securityPolicyId",
                name_key: "securityPolicyName",
                type_key: None,
            },
            Self::ListId { .. } | Self::ListIds { .. } | Self::ZoneId => return None,
        };
        Some(form)
    }
}

/// Classify an attribute of a `kind` body at object `depth` (root keys are
/// depth 0) for a walk in `direction`. `None` for plain attributes.
pub fn classify(
    kind: EntityKind,
    key: &str,
    depth: usize,
    direction: Direction,
) -> Option<ReferenceShape> {
    let by_direction = |id_key: &str, name_key: &str| match direction {
        Direction::ToNames => key == id_key,
        Direction::ToIds => key == name_key,
    };

    match kind {
        EntityKind::Definitions
        | EntityKind::CentralPolicies
        | EntityKind::LocalPolicies
        | EntityKind::SecurityPolicies => {
            if by_direction("ref", "listName") {
                return Some(ReferenceShape::TypedRef);
            }
            if by_direction("class", "className") {
                return Some(ReferenceShape::TypedClass);
            }
            if kind == EntityKind::Definitions && (key == "sourceZone" || key == "destinationZone") {
                return Some(ReferenceShape::ZoneId);
            }
            if kind != EntityKind::Definitions && by_direction("definitionId", "definitionName") {
                return Some(ReferenceShape::Definition);
            }
            classify_list_key(key)
        }
        EntityKind::DeviceTemplates => {
            if depth == 0 {
                if by_direction("policyId", "policyName") {
                    return Some(ReferenceShape::LocalPolicy);
                }
                if by_direction("securityPolicyId", "securityPolicyName") {
                    return Some(ReferenceShape::SecurityPolicy);
                }
                None
            } else if by_direction("templateId", "templateName") {
                Some(ReferenceShape::FeatureTemplate)
            } else {
                None
            }
        }
        EntityKind::Lists | EntityKind::FeatureTemplates => None,
    }
}

/// `siteList` → `ListId(site)`, `vpnLists` → `ListIds(vpn)`.
///
/// Direction qualifiers are dropped from the type
/// (`sourceDataPrefixList` → `dataPrefix`).
fn classify_list_key(key: &str) -> Option<ReferenceShape> {
    let (stem, plural) = if let Some(stem) = key.strip_suffix("Lists") {
        (stem, true)
    } else if let Some(stem) = key.strip_suffix("List") {
        (stem, false)
    } else {
        return None;
    };

    let stem = ["source", "destination"]
        .iter()
        .find_map(|q| stem.strip_prefix(q))
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
        .unwrap_or(stem);
    if stem.is_empty() || !stem.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut chars = stem.chars();
    let list_type = match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => return None,
    };

    Some(if plural {
        ReferenceShape::ListIds { list_type }
    } else {
        ReferenceShape::ListId { list_type }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keys() {
        assert_eq!(
            classify(EntityKind::CentralPolicies, "siteLists", 3, Direction::ToIds),
            Some(ReferenceShape::ListIds {
                list_type: "site".into()
            })
        );
        assert_eq!(
            classify(EntityKind::Definitions, "vpnList", 1, Direction::ToNames),
            Some(ReferenceShape::ListId {
                list_type: "vpn".into()
            })
        );
        assert_eq!(
            classify(
                EntityKind::Definitions,
                "sourceDataPrefixList",
                4,
                Direction::ToNames
            ),
            Some(ReferenceShape::ListId {
                list_type: "dataPrefix".into()
            })
        );
    }

    #[test]
    fn bare_suffix_is_not_a_reference() {
        assert_eq!(
            classify(EntityKind::Definitions, "List", 1, Direction::ToIds),
            None
        );
        assert_eq!(
            classify(EntityKind::Definitions, "entries", 1, Direction::ToIds),
            None
        );
    }

    #[test]
    fn renamed_keys_follow_direction() {
        assert_eq!(
            classify(EntityKind::Definitions, "ref", 3, Direction::ToNames),
            Some(ReferenceShape::TypedRef)
        );
        assert_eq!(
            classify(EntityKind::Definitions, "ref", 3, Direction::ToIds),
            None
        );
        assert_eq!(
            classify(EntityKind::Definitions, "listName", 3, Direction::ToIds),
            Some(ReferenceShape::TypedRef)
        );
        assert_eq!(
            classify(
                EntityKind::LocalPolicies,
                "definitionName",
                2,
                Direction::ToIds
            ),
            Some(ReferenceShape::Definition)
        );
    }

    #[test]
    fn definition_id_of_a_definition_is_its_own_id() {
        assert_eq!(
            classify(EntityKind::Definitions, "definitionId", 0, Direction::ToNames),
            None
        );
    }

    #[test]
    fn zones_only_in_definitions() {
        assert_eq!(
            classify(EntityKind::Definitions, "sourceZone", 3, Direction::ToIds),
            Some(ReferenceShape::ZoneId)
        );
        assert_eq!(
            classify(
                EntityKind::SecurityPolicies,
                "sourceZone",
                3,
                Direction::ToIds
            ),
            None
        );
    }

    #[test]
    fn device_template_depths() {
        assert_eq!(
            classify(EntityKind::DeviceTemplates, "policyId", 0, Direction::ToNames),
            Some(ReferenceShape::LocalPolicy)
        );
        assert_eq!(
            classify(
                EntityKind::DeviceTemplates,
                "securityPolicyName",
                0,
                Direction::ToIds
            ),
            Some(ReferenceShape::SecurityPolicy)
        );
        // The template's own name sits at the root.
        assert_eq!(
            classify(EntityKind::DeviceTemplates, "templateName", 0, Direction::ToIds),
            None
        );
        assert_eq!(
            classify(EntityKind::DeviceTemplates, "templateName", 1, Direction::ToIds),
            Some(ReferenceShape::FeatureTemplate)
        );
    }

    #[test]
    fn lists_and_feature_templates_have_no_references() {
        assert_eq!(
            classify(EntityKind::Lists, "siteList", 1, Direction::ToIds),
            None
        );
        assert_eq!(
            classify(EntityKind::FeatureTemplates, "ref", 2, Direction::ToNames),
            None
        );
    }
}
