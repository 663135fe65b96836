//! Sync engine between declarative documents and a vManage controller.
//!
//! - **[`SyncContext`]**: one run's state (authenticated client, per-kind
//!   listing cache, action polling bounds), passed explicitly.
//! - **Resolver** ([`resolve`]): name ↔ id lookups and the typed walk that
//!   converts every reference in a body.
//! - **Diff** ([`diff`]): structural changes between two name-form bodies.
//! - **Synchronizer** ([`sync`]): create-or-update per entity, family by
//!   family, with cascade reattachment of affected device templates.
//! - **Exporter** ([`export`]): controller state as a document.

pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod export;
pub mod model;
pub mod reattach;
pub mod resolve;
mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, PollConfig, TlsVerification};
pub use context::SyncContext;
pub use diff::{Change, ChangeOp, FieldPath, diff};
pub use error::CoreError;
pub use export::ExportOptions;
pub use model::{Document, DocumentFormat, Entity, EntityId, EntityKind, Family};
pub use resolve::{Direction, EntityIndex};
pub use sync::{EntityChange, EntityFailure, SyncAction, SyncOptions, SyncReport};
