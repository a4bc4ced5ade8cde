//! `rpt log`: activity feed, newest first.

use clap::Args;
use reportes_core::ActivityEntry;
use serde::Serialize;
use std::io::Write;

use crate::output::{local_time, pretty_section, render_mode};
use crate::session::{Context, Session};

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Only show entries for this report.
    pub id: Option<String>,

    /// Maximum number of entries to show.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct LogOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    report_id: Option<String>,
    entries: Vec<ActivityEntry>,
}

pub fn run_log(args: &LogArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let activity = session.desk.activity();

    let mut entries = match &args.id {
        Some(id) => activity.by_report(id),
        None => activity.all(),
    };
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    let out = LogOutput {
        report_id: args.id.clone(),
        entries,
    };

    render_mode(
        ctx.output,
        &out,
        |o, w| {
            for entry in &o.entries {
                writeln!(
                    w,
                    "{}  {}  {}",
                    entry.date.to_rfc3339(),
                    entry.report_id,
                    entry.description
                )?;
            }
            Ok(())
        },
        |o, w| {
            let heading = o
                .report_id
                .as_ref()
                .map_or_else(|| "Activity".to_string(), |id| format!("Activity for {id}"));
            pretty_section(w, &heading)?;
            if o.entries.is_empty() {
                writeln!(w, "(no activity)")?;
            }
            for entry in &o.entries {
                writeln!(
                    w,
                    "{}  [{}] {}",
                    local_time(entry.date),
                    entry.report_id,
                    entry.description
                )?;
                if let Some(comment) = entry.details.as_ref().and_then(|d| d.comment.as_ref()) {
                    writeln!(w, "    {comment}")?;
                }
            }
            Ok(())
        },
    )
}
