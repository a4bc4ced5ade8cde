//! `rpt history`: state changes and assignment ledger of one report.
//!
//! Works for deleted reports too, as long as their history has not been
//! cascaded away.

use clap::Args;
use reportes_core::{Assignment, ChangeType, HistoryLedger, StateHistoryEntry};
use serde::Serialize;
use std::io::Write;

use crate::output::{local_time, pretty_section, render_mode};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Report ID whose history to show.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    report_id: String,
    state_changes: Vec<StateHistoryEntry>,
    assignments: HistoryLedger<Assignment>,
}

fn change_marker(entry: &StateHistoryEntry) -> &'static str {
    match entry.change_type {
        ChangeType::StateChange => "->",
        ChangeType::Reversion => "<-",
    }
}

fn assignee_label(entry: &reportes_core::AssignmentHistoryEntry) -> String {
    entry
        .payload
        .assigned_user
        .as_ref()
        .map_or_else(|| "unassigned".to_string(), |u| format!("{} ({})", u.full_name(), u.id))
}

pub fn run_history(args: &HistoryArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let desk = &session.desk;

    let out = HistoryOutput {
        report_id: args.id.clone(),
        state_changes: desk.state_history().for_report(&args.id),
        assignments: desk.assignments().history(&args.id),
    };

    render_mode(
        ctx.output,
        &out,
        |o, w| {
            for entry in &o.state_changes {
                writeln!(
                    w,
                    "state  {}  {} {} {}  {}",
                    entry.timestamp.to_rfc3339(),
                    entry.from_state_name,
                    change_marker(entry),
                    entry.to_state_name,
                    entry.actor.id
                )?;
            }
            for entry in &o.assignments {
                writeln!(
                    w,
                    "assign  {}  {}{}",
                    entry.created_at.to_rfc3339(),
                    assignee_label(entry),
                    if entry.is_current { "  *" } else { "" }
                )?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(w, &format!("State changes for {}", o.report_id))?;
            if o.state_changes.is_empty() {
                writeln!(w, "(none)")?;
            }
            for entry in &o.state_changes {
                writeln!(
                    w,
                    "{}  {} {} {}  by {}",
                    local_time(entry.timestamp),
                    entry.from_state_name,
                    change_marker(entry),
                    entry.to_state_name,
                    entry.actor.full_name()
                )?;
                if !entry.comment.is_empty() {
                    writeln!(w, "    {}", entry.comment)?;
                }
            }
            writeln!(w)?;
            pretty_section(w, &format!("Assignments for {}", o.report_id))?;
            if o.assignments.is_empty() {
                writeln!(w, "(none)")?;
            }
            for entry in &o.assignments {
                writeln!(
                    w,
                    "{}  {}{}",
                    local_time(entry.created_at),
                    assignee_label(entry),
                    if entry.is_current { "  (current)" } else { "" }
                )?;
            }
            Ok(())
        },
    )
}
