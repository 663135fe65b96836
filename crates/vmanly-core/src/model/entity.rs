use serde::Serialize;
use serde_json::Value;

use super::{EntityId, EntityKind};

/// One object from a controller listing, with its identity fields pulled
/// out of the wire body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: EntityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// The listing body as returned by the controller.
    pub body: Value,
}

impl Entity {
    /// Build from a listing body. `None` when the id or name is missing.
    pub fn from_body(kind: EntityKind, body: Value) -> Option<Self> {
        let id = body.get(kind.id_field())?.as_str()?.to_owned();
        let name = body.get(kind.name_field())?.as_str()?.to_owned();
        let entity_type = str_field(&body, kind.type_field()).map(str::to_owned);
        Some(Self {
            kind,
            id: EntityId::from(id),
            name,
            entity_type,
            body,
        })
    }

    /// Whether this is a built-in object the controller ships with.
    pub fn is_default(&self) -> bool {
        self.kind
            .default_marker()
            .and_then(|marker| self.body.get(marker))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A non-empty string field of a JSON object.
pub(crate) fn str_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
