//! `rpt show`: display one report with its current assignee and counts.

use clap::Args;
use reportes_core::{Report, UserRef};
use serde::Serialize;
use std::io::Write;

use crate::output::{local_time, pretty_kv, pretty_section, render_mode};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Report ID to display.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    report: Report,
    assignee: Option<UserRef>,
    state_changes: usize,
    assignment_changes: usize,
    activity_entries: usize,
}

pub async fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let report = super::require_report(ctx, &session, &args.id).await?;
    let desk = &session.desk;

    let out = ShowOutput {
        assignee: desk.assignments().current_assignee(&report.id),
        state_changes: desk.state_history().for_report(&report.id).len(),
        assignment_changes: desk.assignments().history(&report.id).len(),
        activity_entries: desk.activity().by_report(&report.id).len(),
        report,
    };

    render_mode(
        ctx.output,
        &out,
        |o, w| {
            writeln!(
                w,
                "{}  {}  {}  {}",
                o.report.id,
                o.report.current_state.name,
                o.assignee.as_ref().map_or("-", |u| u.id.as_str()),
                o.report.title
            )
        },
        |o, w| {
            pretty_section(w, &format!("{}  {}", o.report.id, o.report.title))?;
            pretty_kv(w, "State", &o.report.current_state.name)?;
            pretty_kv(
                w,
                "Assignee",
                o.assignee.as_ref().map_or_else(|| "unassigned".to_string(), UserRef::full_name),
            )?;
            if let Some(category) = &o.report.category {
                pretty_kv(w, "Category", category)?;
            }
            if let Some(location) = &o.report.location {
                pretty_kv(w, "Location", format!("{:.5}, {:.5}", location.lat, location.lng))?;
            }
            pretty_kv(w, "Created", local_time(o.report.created_at))?;
            pretty_kv(
                w,
                "History",
                format!(
                    "{} state changes, {} assignments, {} activity entries",
                    o.state_changes, o.assignment_changes, o.activity_entries
                ),
            )?;
            if let Some(description) = &o.report.description {
                writeln!(w)?;
                writeln!(w, "{description}")?;
            }
            Ok(())
        },
    )
}
