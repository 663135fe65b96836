//! Import command handler.

use serde::Serialize;
use tabled::Tabled;
use vmanly_core::{EntityChange, EntityKind, SyncAction, SyncContext, SyncOptions, SyncReport};

use crate::cli::{GlobalOpts, ImportArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Applied")]
    applied: &'static str,
    #[tabled(rename = "Reattached")]
    reattached: String,
}

impl From<&EntityChange> for ChangeRow {
    fn from(c: &EntityChange) -> Self {
        Self {
            kind: c.kind.label().to_owned(),
            name: match c.entity_type {
                Some(ref t) => format!("{} ({t})", c.name),
                None => c.name.clone(),
            },
            action: action_label(c.action),
            fields: c.changes.len(),
            applied: if c.applied { "yes" } else { "no" },
            reattached: c.reattached.join(", "),
        }
    }
}

fn action_label(action: SyncAction) -> &'static str {
    match action {
        SyncAction::Create => "create",
        SyncAction::Update => "update",
    }
}

// ── Structured report ───────────────────────────────────────────────

#[derive(Serialize)]
struct FailureView<'a> {
    kind: EntityKind,
    name: &'a str,
    error: String,
}

#[derive(Serialize)]
struct ReportView<'a> {
    changes: &'a [EntityChange],
    unchanged: usize,
    failures: Vec<FailureView<'a>>,
    aborted: bool,
}

impl<'a> From<&'a SyncReport> for ReportView<'a> {
    fn from(report: &'a SyncReport) -> Self {
        Self {
            changes: &report.changes,
            unchanged: report.unchanged,
            failures: report
                .failures
                .iter()
                .map(|f| FailureView {
                    kind: f.kind,
                    name: &f.name,
                    error: f.error.to_string(),
                })
                .collect(),
            aborted: report.aborted,
        }
    }
}

fn render_report(
    report: &SyncReport,
    args: &ImportArgs,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            if report.changes.is_empty() {
                return Ok(String::new());
            }
            let mut out = output::render_list(
                &global.output,
                &report.changes,
                |c| ChangeRow::from(c),
                |c| format!("{} {} {}", action_label(c.action), c.kind, c.name),
            )?;
            if args.diff {
                let color = output::should_color(&global.color);
                for change in &report.changes {
                    out.push_str(&format!("\n\n{} {}:\n", change.kind.label(), change.name));
                    out.push_str(&output::render_changes(&change.changes, color));
                }
            }
            Ok(out)
        }
        _ => output::render_single(
            &global.output,
            &ReportView::from(report),
            |_| String::new(),
            |_| String::new(),
        ),
    }
}

fn summary(report: &SyncReport, check: bool) -> String {
    let mut line = format!(
        "{} created, {} updated, {} unchanged, {} failed",
        report.created(),
        report.updated(),
        report.unchanged,
        report.failures.len()
    );
    if check {
        line.push_str(" (check only, nothing written)");
    } else if report.changes.iter().any(|c| !c.applied) {
        line.push_str(" (pass --update to apply updates)");
    }
    line
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &SyncContext,
    args: ImportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let document = util::read_document(&args.file)?;
    let options = SyncOptions {
        dry_run: args.check,
        allow_update: args.update,
        push: args.push,
        keep_going: args.keep_going,
    };

    if options.push
        && !options.dry_run
        && !util::confirm(
            "Re-push affected device templates to their devices?",
            global.yes,
        )?
    {
        return Ok(());
    }

    let pb = util::spinner(global, &format!("Syncing {}", args.file.display()));
    let mut report = ctx
        .sync_document(&document, &util::kinds(&args.only), options)
        .await;
    pb.finish_and_clear();

    let out = render_report(&report, &args, global)?;
    output::print_output(&out, global.quiet);
    for failure in &report.failures {
        eprintln!(
            "failed: {} '{}': {}",
            failure.kind.label(),
            failure.name,
            failure.error
        );
    }
    if !global.quiet {
        eprintln!("{}", summary(&report, args.check));
    }

    if report.failures.is_empty() {
        return Ok(());
    }
    if report.aborted {
        let first = report.failures.swap_remove(0);
        return Err(first.error.into());
    }
    Err(CliError::SyncFailed {
        count: report.failures.len(),
    })
}
