// ── Reference walk ──
//
// Rewrites every reference in a body from one form to the other, in
// place. Non-reference attributes are left untouched. Lookups go through
// `ReferenceLookup` so the walk itself stays synchronous and pure; the
// resolver preloads the indexes it needs.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::EntityIndex;
use super::shape::{Direction, ReferenceShape, classify};
use crate::error::CoreError;
use crate::model::{EntityId, EntityKind};

/// Name/id lookups the walk needs.
pub trait ReferenceLookup {
    /// Server id of the entity named `name` (within `entity_type` for
    /// kinds named per type).
    fn id_of(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        name: &str,
    ) -> Result<EntityId, CoreError>;

    /// Name and type of the entity with server id `id`.
    fn name_of(&self, kind: EntityKind, id: &str) -> Result<(String, Option<String>), CoreError>;
}

/// Lookups over preloaded listing indexes.
#[derive(Default)]
pub struct IndexLookup {
    indexes: HashMap<EntityKind, Arc<EntityIndex>>,
}

impl IndexLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: Arc<EntityIndex>) -> Self {
        self.indexes.insert(index.kind(), index);
        self
    }

    fn index(&self, kind: EntityKind) -> Result<&EntityIndex, CoreError> {
        self.indexes
            .get(&kind)
            .map(Arc::as_ref)
            .ok_or_else(|| CoreError::Internal(format!("{kind} listing was not loaded")))
    }
}

impl ReferenceLookup for IndexLookup {
    fn id_of(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        name: &str,
    ) -> Result<EntityId, CoreError> {
        let index = self.index(kind)?;
        if let Some(entity) = index.get(entity_type, name) {
            return Ok(entity.id.clone());
        }
        // List types named by an attribute don't always match the list's
        // own type (`dnsAppList` holds an `app` list); accept a name that
        // is unique across types.
        if kind == EntityKind::Lists {
            let mut matches = index.iter().filter(|e| e.name == name);
            if let (Some(only), None) = (matches.next(), matches.next()) {
                return Ok(only.id.clone());
            }
        }
        Err(CoreError::not_found(kind, entity_type, name))
    }

    fn name_of(&self, kind: EntityKind, id: &str) -> Result<(String, Option<String>), CoreError> {
        self.index(kind)?
            .get_by_id(&EntityId::from(id))
            .map(|e| (e.name.clone(), e.entity_type.clone()))
            .ok_or_else(|| CoreError::not_found(kind, None, id))
    }
}

/// Convert every reference in a `kind` body, recursively and in place.
///
/// An unresolvable reference fails the whole conversion; the body may be
/// partially converted at that point.
pub fn walk_and_convert<L: ReferenceLookup + ?Sized>(
    kind: EntityKind,
    body: &mut Value,
    direction: Direction,
    lookup: &L,
) -> Result<(), CoreError> {
    Walker {
        kind,
        direction,
        lookup,
    }
    .walk(body, 0)
}

struct Walker<'a, L: ?Sized> {
    kind: EntityKind,
    direction: Direction,
    lookup: &'a L,
}

impl<L: ReferenceLookup + ?Sized> Walker<'_, L> {
    fn walk(&self, value: &mut Value, depth: usize) -> Result<(), CoreError> {
        match value {
            Value::Object(map) => self.walk_object(map, depth),
            Value::Array(items) => items.iter_mut().try_for_each(|item| self.walk(item, depth)),
            _ => Ok(()),
        }
    }

    fn walk_object(&self, map: &mut Map<String, Value>, depth: usize) -> Result<(), CoreError> {
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            let converted = match classify(self.kind, &key, depth, self.direction) {
                Some(shape) => self.convert(&shape, map, &key)?,
                None => false,
            };
            if !converted {
                if let Some(child) = map.get_mut(&key) {
                    self.walk(child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    /// Returns `false` when the value doesn't have the shape's form, in
    /// which case the caller walks into it like any other attribute.
    fn convert(
        &self,
        shape: &ReferenceShape,
        map: &mut Map<String, Value>,
        key: &str,
    ) -> Result<bool, CoreError> {
        let target = shape.target();
        match shape {
            ReferenceShape::ListId { list_type } => {
                let Some(Value::String(value)) = map.get_mut(key) else {
                    return Ok(false);
                };
                if !value.is_empty() {
                    *value = self.scalar(target, Some(list_type.as_str()), value)?;
                }
                Ok(true)
            }
            ReferenceShape::ListIds { list_type } => {
                let Some(Value::Array(items)) = map.get_mut(key) else {
                    return Ok(false);
                };
                for item in items.iter_mut() {
                    if let Value::String(value) = item {
                        if !value.is_empty() {
                            *value = self.scalar(target, Some(list_type.as_str()), value)?;
                        }
                    }
                }
                Ok(true)
            }
            ReferenceShape::ZoneId => {
                let Some(Value::String(value)) = map.get_mut(key) else {
                    return Ok(false);
                };
                if !value.is_empty() && value.as_str() != "self" {
                    *value = self.scalar(target, Some("zone"), value)?;
                }
                Ok(true)
            }
            _ => self.convert_renamed(shape, map, key),
        }
    }

    /// Shapes whose attribute name differs between the two forms.
    fn convert_renamed(
        &self,
        shape: &ReferenceShape,
        map: &mut Map<String, Value>,
        key: &str,
    ) -> Result<bool, CoreError> {
        let Some(form) = shape.renamed_form() else {
            return Ok(false);
        };
        let value = match map.get(key) {
            Some(Value::String(value)) => value.clone(),
            _ => return Ok(false),
        };
        if value.is_empty() {
            return Ok(true);
        }
        let target = shape.target();

        match self.direction {
            Direction::ToNames => {
                let mut names = Vec::new();
                let mut target_type = None;
                for id in value.split_whitespace() {
                    let (name, entity_type) = self.lookup.name_of(target, id)?;
                    names.push(name);
                    target_type = target_type.or(entity_type);
                }
                map.remove(form.id_key);
                map.insert(form.name_key.to_owned(), Value::String(names.join(" ")));
                if let (Some(type_key), Some(entity_type)) = (form.type_key, target_type) {
                    map.insert(type_key.to_owned(), Value::String(entity_type));
                }
            }
            Direction::ToIds => {
                // Definitions are typed by their sibling `type`.
                let type_key = match shape {
                    ReferenceShape::Definition => Some("type"),
                    _ => form.type_key,
                };
                let entity_type = type_key
                    .and_then(|k| map.get(k))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let mut ids = Vec::new();
                for name in value.split_whitespace() {
                    ids.push(
                        self.lookup
                            .id_of(target, entity_type.as_deref(), name)?
                            .to_string(),
                    );
                }
                map.remove(form.name_key);
                if let Some(type_key) = form.type_key {
                    map.remove(type_key);
                }
                map.insert(form.id_key.to_owned(), Value::String(ids.join(" ")));
            }
        }
        Ok(true)
    }

    fn scalar(
        &self,
        target: EntityKind,
        entity_type: Option<&str>,
        value: &str,
    ) -> Result<String, CoreError> {
        match self.direction {
            Direction::ToIds => self
                .lookup
                .id_of(target, entity_type, value)
                .map(|id| id.to_string()),
            Direction::ToNames => self.lookup.name_of(target, value).map(|(name, _)| name),
        }
    }
}
