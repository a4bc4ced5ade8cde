pub mod assign;
pub mod delete;
pub mod history;
pub mod init;
pub mod log;
pub mod move_cmd;
pub mod show;
pub mod summary;

use reportes_core::{ErrorCode, Report};

use crate::output::{CliError, render_error};
use crate::session::{Context, Session};

/// Fetch a report that must exist, rendering a coded error if it does not.
pub async fn require_report(ctx: &Context, session: &Session, id: &str) -> anyhow::Result<Report> {
    if let Some(report) = session.desk.report(id).await? {
        return Ok(report);
    }
    render_error(
        ctx.output,
        &CliError::coded(ErrorCode::ReportNotFound, format!("report '{id}' not found")),
    )?;
    anyhow::bail!("report '{id}' not found")
}
