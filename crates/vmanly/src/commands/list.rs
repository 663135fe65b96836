//! List command handler.

use std::sync::Arc;

use tabled::Tabled;
use vmanly_core::{Entity, EntityKind, SyncContext};

use crate::cli::{GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Built-in")]
    builtin: String,
}

impl From<&Arc<Entity>> for EntityRow {
    fn from(e: &Arc<Entity>) -> Self {
        Self {
            name: e.name.clone(),
            entity_type: e.entity_type.clone().unwrap_or_default(),
            id: e.id.to_string(),
            builtin: if e.is_default() { "yes".into() } else { String::new() },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &SyncContext,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = EntityKind::from(args.kind);
    let index = ctx.listing(kind).await?;
    let entities: Vec<Arc<Entity>> = index.iter().cloned().collect();

    let out = output::render_list(
        &global.output,
        &entities,
        |e| EntityRow::from(e),
        |e| e.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
