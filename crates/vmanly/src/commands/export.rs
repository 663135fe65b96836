//! Export command handler.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;
use vmanly_core::{Document, EntityKind, ExportOptions, SyncContext};

use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct KindCount {
    kind: EntityKind,
    count: usize,
}

#[derive(Tabled)]
struct KindCountRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Exported")]
    count: usize,
}

fn counts(document: &Document) -> Vec<KindCount> {
    EntityKind::iter()
        .map(|kind| KindCount {
            kind,
            count: document.section(kind).len(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &SyncContext,
    args: ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = ExportOptions {
        include_defaults: args.include_defaults,
    };
    let pb = util::spinner(global, "Exporting from controller");
    let result = ctx.export(&util::kinds(&args.only), options).await;
    pb.finish_and_clear();
    let document = result?;

    util::write_document(&args.file, &document)?;

    let summary = counts(&document);
    let out = output::render_list(
        &global.output,
        &summary,
        |c| KindCountRow {
            kind: c.kind.label().to_owned(),
            count: c.count,
        },
        |c| format!("{}\t{}", c.kind, c.count),
    )?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!(
            "Exported {} object(s) to {}",
            document.len(),
            args.file.display()
        );
    }
    Ok(())
}
