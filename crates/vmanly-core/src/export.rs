// ── Exporter ──
//
// Reads every entity of the requested kinds and renders it in the
// document's name form: references converted to names, the id and the
// volatile attributes stripped. Importing the result into the same
// controller changes nothing.

use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::context::SyncContext;
use crate::error::CoreError;
use crate::model::{Document, EntityKind};
use crate::resolve::Direction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Include read-only lists and definitions and factory-default
    /// templates.
    pub include_defaults: bool,
}

impl SyncContext {
    /// Export the requested kinds (empty means all) into a document.
    pub async fn export(
        &self,
        only: &[EntityKind],
        options: ExportOptions,
    ) -> Result<Document, CoreError> {
        let mut document = Document::default();
        for kind in EntityKind::iter() {
            if !only.is_empty() && !only.contains(&kind) {
                continue;
            }
            *document.section_mut(kind) = self.export_kind(kind, options).await?;
        }
        Ok(document)
    }

    /// Name-form bodies of every entity of one kind, in listing order.
    pub async fn export_kind(
        &self,
        kind: EntityKind,
        options: ExportOptions,
    ) -> Result<Vec<Value>, CoreError> {
        let index = self.listing(kind).await?;
        let mut bodies = Vec::with_capacity(index.len());
        for entity in index.iter() {
            if entity.is_default() && !options.include_defaults {
                debug!(%kind, name = entity.name, "skipping built-in");
                continue;
            }
            let mut body = self.fetch_body(entity).await?;
            self.convert(kind, &mut body, Direction::ToNames).await?;
            strip_volatile(kind, &mut body);
            bodies.push(body);
        }
        debug!(%kind, count = bodies.len(), "exported");
        Ok(bodies)
    }
}

fn strip_volatile(kind: EntityKind, body: &mut Value) {
    if let Value::Object(map) = body {
        for field in kind.ignored_fields() {
            map.remove(*field);
        }
    }
}
