//! `rpt assign` / `rpt unassign`: append to a report's assignment ledger.
//!
//! Both refuse to touch a report whose current assignee is blocked.

use clap::Args;
use reportes_core::{AssignError, Report, UserRef};
use serde::Serialize;
use std::io::Write;

use crate::actor;
use crate::output::{CliError, render, render_error};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Report ID to assign.
    pub id: String,

    /// User ID of the new assignee.
    #[arg(value_name = "USER")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct UnassignArgs {
    /// Report ID to unassign.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct AssignOutput {
    ok: bool,
    report_id: String,
    assignee: Option<UserRef>,
    entry_id: String,
    history_len: usize,
}

pub async fn run_assign(args: &AssignArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let Some(user) = session.desk.find_user(&args.user).cloned() else {
        render_error(
            ctx.output,
            &CliError {
                message: format!("user '{}' not found", args.user),
                suggestion: Some("add the user to the data file first".to_string()),
                error_code: Some("unknown_user".to_string()),
            },
        )?;
        anyhow::bail!("user '{}' not found", args.user);
    };
    apply(ctx, &session, &args.id, Some(user)).await
}

pub async fn run_unassign(args: &UnassignArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    apply(ctx, &session, &args.id, None).await
}

async fn apply(
    ctx: &Context,
    session: &Session,
    report_id: &str,
    user: Option<UserRef>,
) -> anyhow::Result<()> {
    let actor = match actor::require_actor(ctx.actor_flag(), &session.desk) {
        Ok(actor) => actor,
        Err(err) => {
            render_error(
                ctx.output,
                &CliError {
                    message: err.message.clone(),
                    suggestion: None,
                    error_code: Some(err.code.to_string()),
                },
            )?;
            return Err(err.into());
        }
    };
    let report: Report = super::require_report(ctx, session, report_id).await?;

    let ledger = match session.desk.assign(&report, user, &actor) {
        Ok(ledger) => ledger,
        Err(err @ AssignError::AssigneeBlocked { .. }) => {
            render_error(ctx.output, &CliError::coded(err.code(), err.to_string()))?;
            return Err(err.into());
        }
    };
    session.save().await?;

    let Some(current) = ledger.current() else {
        anyhow::bail!("assignment ledger for '{report_id}' has no current entry");
    };
    let out = AssignOutput {
        ok: true,
        report_id: report.id.clone(),
        assignee: current.payload.assigned_user.clone(),
        entry_id: current.id.clone(),
        history_len: ledger.len(),
    };

    render(ctx.output, &out, |o, w| match &o.assignee {
        Some(user) => writeln!(w, "{}: assigned to {} ({})", o.report_id, user.full_name(), user.id),
        None => writeln!(w, "{}: unassigned", o.report_id),
    })
}
