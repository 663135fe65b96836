// ── Reference resolver ──
//
// Name ↔ id translation over a read-through cache of one listing per
// kind. The cache lives in the sync context; writers call `invalidate`
// for the kind they touched and the synchronizer clears everything at
// family boundaries.

mod cache;
mod shape;
mod walk;

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

pub use cache::EntityIndex;
pub use shape::{Direction, ReferenceShape, classify};
pub use walk::{IndexLookup, ReferenceLookup, walk_and_convert};

use crate::context::SyncContext;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityKind};

impl SyncContext {
    /// The cached listing of `kind`, fetching it on first use.
    pub async fn listing(&self, kind: EntityKind) -> Result<Arc<EntityIndex>, CoreError> {
        if let Some(index) = self.cache.get(&kind) {
            trace!(%kind, "listing cache hit");
            return Ok(Arc::clone(index.value()));
        }
        let listing = self.fetch_listing(kind).await?;
        let index = Arc::new(EntityIndex::from_listing(kind, listing));
        self.cache.insert(kind, Arc::clone(&index));
        Ok(index)
    }

    /// Optional lookup by name (within `entity_type` for lists and
    /// definitions).
    pub async fn find(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        name: &str,
    ) -> Result<Option<Arc<Entity>>, CoreError> {
        Ok(self.listing(kind).await?.get(entity_type, name))
    }

    pub async fn resolve_name_to_id(
        &self,
        kind: EntityKind,
        entity_type: Option<&str>,
        name: &str,
    ) -> Result<EntityId, CoreError> {
        self.find(kind, entity_type, name)
            .await?
            .map(|e| e.id.clone())
            .ok_or_else(|| CoreError::not_found(kind, entity_type, name))
    }

    pub async fn resolve_id_to_name(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<String, CoreError> {
        self.listing(kind)
            .await?
            .get_by_id(id)
            .map(|e| e.name.clone())
            .ok_or_else(|| CoreError::not_found(kind, None, id.to_string()))
    }

    /// Drop the cached listing of one kind.
    pub fn invalidate(&self, kind: EntityKind) {
        if self.cache.remove(&kind).is_some() {
            trace!(%kind, "listing cache invalidated");
        }
    }

    /// Drop every cached listing.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Load the listings a `kind` body refers to.
    pub async fn reference_lookup(&self, kind: EntityKind) -> Result<IndexLookup, CoreError> {
        let mut lookup = IndexLookup::new();
        for dependency in kind.dependencies() {
            lookup = lookup.with_index(self.listing(*dependency).await?);
        }
        Ok(lookup)
    }

    /// Convert every reference in a `kind` body in place.
    pub async fn convert(
        &self,
        kind: EntityKind,
        body: &mut Value,
        direction: Direction,
    ) -> Result<(), CoreError> {
        if kind.dependencies().is_empty() {
            return Ok(());
        }
        let lookup = self.reference_lookup(kind).await?;
        walk_and_convert(kind, body, direction, &lookup)
    }
}
