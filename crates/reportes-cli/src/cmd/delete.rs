//! `rpt delete`: remove a report and cascade over its history.

use clap::Args;
use reportes_core::ErrorCode;
use std::io::Write;

use crate::output::{CliError, render, render_error};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Report ID to delete.
    pub id: String,
}

pub async fn run_delete(args: &DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let deleted = session.desk.delete_report(&args.id).await?;

    let removed_anything = deleted.report.is_some()
        || deleted.activity_removed > 0
        || deleted.assignments_removed > 0
        || deleted.state_history_removed > 0;
    if !removed_anything {
        render_error(
            ctx.output,
            &CliError::coded(ErrorCode::ReportNotFound, format!("report '{}' not found", args.id)),
        )?;
        anyhow::bail!("report '{}' not found", args.id);
    }

    session.save().await?;

    render(ctx.output, &deleted, |d, w| {
        writeln!(
            w,
            "deleted {} ({} activity, {} assignments, {} state changes)",
            args.id, d.activity_removed, d.assignments_removed, d.state_history_removed
        )
    })
}
