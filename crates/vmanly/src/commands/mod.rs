//! Command dispatch: bridges CLI args -> sync context -> output formatting.

pub mod config_cmd;
pub mod export;
pub mod import;
pub mod list;
pub mod reattach;
pub mod util;

use vmanly_core::SyncContext;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    ctx: &SyncContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Export(args) => export::handle(ctx, args, global).await,
        Command::Import(args) => import::handle(ctx, args, global).await,
        Command::List(args) => list::handle(ctx, args, global).await,
        Command::Reattach(args) => reattach::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a controller connection".into(),
        )),
    }
}
