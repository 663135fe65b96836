// ── Domain model ──
//
// Kinds and their wire schema, listing entities, server identifiers and
// the declarative document.

pub mod document;
pub mod entity;
pub mod entity_id;
pub mod kind;

pub use document::{Document, DocumentFormat};
pub use entity::Entity;
pub use entity_id::EntityId;
pub use kind::{EntityKind, Family};
