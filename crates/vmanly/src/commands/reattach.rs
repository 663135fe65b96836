//! Reattach command handler.

use vmanly_core::SyncContext;

use crate::cli::{GlobalOpts, ReattachArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(
    ctx: &SyncContext,
    args: ReattachArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !util::confirm(
        &format!("Re-push device template '{}' to its devices?", args.template),
        global.yes,
    )? {
        return Ok(());
    }

    let pb = util::spinner(global, &format!("Reattaching '{}'", args.template));
    let result = ctx.reattach_by_name(&args.template).await;
    pb.finish_and_clear();

    match result? {
        Some(action_id) if !global.quiet => {
            eprintln!("Reattached '{}' (action {action_id})", args.template);
        }
        None if !global.quiet => {
            eprintln!("'{}' is not attached to any device", args.template);
        }
        _ => {}
    }
    Ok(())
}
