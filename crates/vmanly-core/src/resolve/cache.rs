// ── Per-kind listing index ──
//
// Immutable snapshot of one kind's listing, with lookups by
// (type, name) and by id. The sync context caches one per kind and drops
// it whenever that kind is written.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::model::{Entity, EntityId, EntityKind};

/// Namespace key: the lowercased type for kinds named per type, then the
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    scope: Option<String>,
    name: String,
}

pub struct EntityIndex {
    kind: EntityKind,
    /// Primary storage in listing order.
    by_key: IndexMap<IndexKey, Arc<Entity>>,
    /// Secondary index: id -> key.
    id_to_key: HashMap<EntityId, IndexKey>,
}

impl EntityIndex {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            by_key: IndexMap::new(),
            id_to_key: HashMap::new(),
        }
    }

    /// Index a raw listing. Bodies without an id or a name are skipped.
    pub fn from_listing(kind: EntityKind, listing: Vec<Value>) -> Self {
        let mut index = Self::new(kind);
        for body in listing {
            match Entity::from_body(kind, body) {
                Some(entity) => {
                    index.insert(entity);
                }
                None => debug!(%kind, "skipping listing entry without id or name"),
            }
        }
        index
    }

    /// Insert an entity. Returns `true` if its name was new in its namespace.
    pub fn insert(&mut self, entity: Entity) -> bool {
        let key = self.key(entity.entity_type.as_deref(), &entity.name);
        if let Some(old) = self.by_key.get(&key) {
            if old.id != entity.id {
                self.id_to_key.remove(&old.id);
            }
        }
        self.id_to_key.insert(entity.id.clone(), key.clone());
        self.by_key.insert(key, Arc::new(entity)).is_none()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Look up by name within the type namespace.
    ///
    /// For kinds named per type, a missing `entity_type` matches the first
    /// entity with that name in listing order.
    pub fn get(&self, entity_type: Option<&str>, name: &str) -> Option<Arc<Entity>> {
        if self.kind.scoped_by_type() && entity_type.is_none() {
            return self.get_by_name(name);
        }
        let key = self.key(entity_type, name);
        self.by_key.get(&key).map(Arc::clone)
    }

    /// Look up by name alone, across every type.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<Entity>> {
        self.by_key
            .values()
            .find(|e| e.name == name)
            .map(Arc::clone)
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<Entity>> {
        let key = self.id_to_key.get(id)?;
        self.by_key.get(key).map(Arc::clone)
    }

    /// Entities in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.by_key.values()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn key(&self, entity_type: Option<&str>, name: &str) -> IndexKey {
        IndexKey {
            scope: if self.kind.scoped_by_type() {
                entity_type.map(str::to_ascii_lowercase)
            } else {
                None
            },
            name: name.to_owned(),
        }
    }
}
