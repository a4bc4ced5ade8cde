//! `rpt summary`: dashboard aggregates.

use std::io::Write;

use crate::output::{local_time, pretty_kv, pretty_section, render_mode};
use crate::session::{Context, Session};

pub async fn run_summary(ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let summary = session.desk.summary().await?;

    render_mode(
        ctx.output,
        &summary,
        |s, w| {
            writeln!(w, "total  {}", s.total_reports)?;
            for (kind, count) in &s.by_state {
                writeln!(w, "state  {kind}  {count}")?;
            }
            for assignee in &s.by_assignee {
                writeln!(w, "assignee  {}  {}", assignee.user_id, assignee.reports)?;
            }
            writeln!(w, "unassigned  {}", s.unassigned)
        },
        |s, w| {
            pretty_section(w, "Reports")?;
            pretty_kv(w, "Total", s.total_reports.to_string())?;
            for (kind, count) in &s.by_state {
                pretty_kv(w, kind.as_str(), count.to_string())?;
            }
            writeln!(w)?;
            pretty_section(w, "Assignees")?;
            for assignee in &s.by_assignee {
                pretty_kv(w, &assignee.name, assignee.reports.to_string())?;
            }
            pretty_kv(w, "Unassigned", s.unassigned.to_string())?;
            writeln!(w)?;
            pretty_section(w, "Recent activity")?;
            for entry in &s.recent_activity {
                writeln!(
                    w,
                    "{}  [{}] {}",
                    local_time(entry.date),
                    entry.report_id,
                    entry.description
                )?;
            }
            Ok(())
        },
    )
}
