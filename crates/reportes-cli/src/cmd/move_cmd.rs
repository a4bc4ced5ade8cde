//! `rpt move`: transition a report to another state.
//!
//! The history entry is written before the report is patched, so a failed
//! update still leaves the attempt in `rpt history`. The data file is saved
//! either way.

use clap::Args;
use reportes_core::{ErrorCode, StateKind, TransitionOutcome};
use serde::Serialize;
use std::io::Write;

use crate::actor;
use crate::output::{CliError, render, render_error};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Report ID to move.
    pub id: String,

    /// Target state: a configured state id or name, or one of
    /// abierto, en_progreso, resuelto, cerrado, rechazado.
    pub state: String,

    /// Comment stored with the history and activity entries.
    #[arg(long, short = 'm', default_value = "")]
    pub comment: String,
}

#[derive(Debug, Serialize)]
struct MoveOutput {
    ok: bool,
    report_id: String,
    from: String,
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_id: Option<String>,
    partial_write: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    compensation_id: Option<String>,
}

pub async fn run_move(args: &MoveArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let desk = &session.desk;

    let actor = match actor::require_actor(ctx.actor_flag(), desk) {
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

    let report = super::require_report(ctx, &session, &args.id).await?;

    let Some(state) = desk.find_state(&args.state) else {
        let known: Vec<&str> = StateKind::ALL.iter().map(|kind| kind.as_str()).collect();
        render_error(
            ctx.output,
            &CliError {
                message: format!("unknown state '{}'", args.state),
                suggestion: Some(format!("use one of: {}", known.join(", "))),
                error_code: Some("invalid_state".to_string()),
            },
        )?;
        anyhow::bail!("unknown state '{}'", args.state);
    };

    let from = report.current_state.name.clone();
    let to = state.name.clone();
    let outcome = desk
        .transition(&report, state, &actor, &args.comment)
        .await;
    session.save().await?;

    let out = MoveOutput {
        ok: outcome.is_success(),
        report_id: report.id.clone(),
        from,
        to,
        entry_id: outcome.entry().map(|entry| entry.id.clone()),
        partial_write: outcome.is_partial_write(),
        compensation_id: match &outcome {
            TransitionOutcome::Failed {
                compensation: Some(entry),
                ..
            } => Some(entry.id.clone()),
            _ => None,
        },
    };

    if let Some(error) = outcome.error() {
        let code = outcome.code().unwrap_or(ErrorCode::InternalUnexpected);
        render_error(ctx.output, &CliError::coded(code, error.to_string()))?;
        if ctx.output.is_json() {
            render(ctx.output, &out, |_, _| Ok(()))?;
        }
        anyhow::bail!("transition of '{}' failed", report.id);
    }

    render(ctx.output, &out, |o, w| {
        writeln!(w, "{}: {} -> {}", o.report_id, o.from, o.to)
    })
}
