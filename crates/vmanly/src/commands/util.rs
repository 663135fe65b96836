//! Shared helpers for command handlers.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use vmanly_core::{Document, DocumentFormat, EntityKind};

use crate::cli::{GlobalOpts, KindArg};
use crate::error::CliError;

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Lists => EntityKind::Lists,
            KindArg::Definitions => EntityKind::Definitions,
            KindArg::CentralPolicies => EntityKind::CentralPolicies,
            KindArg::LocalPolicies => EntityKind::LocalPolicies,
            KindArg::SecurityPolicies => EntityKind::SecurityPolicies,
            KindArg::FeatureTemplates => EntityKind::FeatureTemplates,
            KindArg::DeviceTemplates => EntityKind::DeviceTemplates,
        }
    }
}

/// `--only` selection; empty means every kind.
pub fn kinds(only: &[KindArg]) -> Vec<EntityKind> {
    only.iter().copied().map(EntityKind::from).collect()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|_| CliError::NonInteractiveRequiresYes {
            action: message.into(),
        })
}

/// Read and parse a document; the format follows the file extension.
pub fn read_document(path: &Path) -> Result<Document, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| document_err(path, &e))?;
    Document::parse(&text, DocumentFormat::from_path(path)).map_err(|e| document_err(path, &e))
}

/// Render a document in the format its path asks for and write it.
pub fn write_document(path: &Path, document: &Document) -> Result<(), CliError> {
    let text = document
        .render(DocumentFormat::from_path(path))
        .map_err(|e| document_err(path, &e))?;
    std::fs::write(path, text).map_err(|e| document_err(path, &e))
}

fn document_err(path: &Path, err: &dyn std::fmt::Display) -> CliError {
    CliError::Document {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Spinner on stderr while a controller round-trip runs. Hidden with
/// `--quiet`; indicatif hides it on its own when stderr isn't a terminal.
pub fn spinner(global: &GlobalOpts, message: &str) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
