//! `rpt init`: create the project directory, config and an empty data file.

use clap::Args;
use reportes_core::config::{PROJECT_DIR, ProjectConfig, project_config_path};
use reportes_core::{DeskSnapshot, ReportState, StateKind};
use serde::Serialize;
use std::io::Write;

use crate::output::{CliError, pretty_kv, render_error, render_mode};
use crate::session::Context;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing data file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    data_path: String,
    config_path: String,
    states: Vec<String>,
}

pub fn run_init(args: &InitArgs, ctx: &Context) -> anyhow::Result<()> {
    if ctx.data_path.exists() && !args.force {
        render_error(
            ctx.output,
            &CliError {
                message: format!("{} already exists", ctx.data_path.display()),
                suggestion: Some("pass --force to start over with empty history".to_string()),
                error_code: Some("already_initialized".to_string()),
            },
        )?;
        anyhow::bail!("data file already exists");
    }

    let config_path = project_config_path(&ctx.project_root);
    if !config_path.exists() {
        std::fs::create_dir_all(ctx.project_root.join(PROJECT_DIR))?;
        let defaults = toml::to_string(&ProjectConfig::default())?;
        std::fs::write(&config_path, defaults)?;
    }

    let snapshot = DeskSnapshot {
        states: StateKind::ALL
            .iter()
            .map(|kind| ReportState::from_kind(*kind))
            .collect(),
        ..DeskSnapshot::default()
    };
    snapshot.save(&ctx.data_path)?;
    tracing::info!(path = %ctx.data_path.display(), "data file initialized");

    let out = InitOutput {
        ok: true,
        data_path: ctx.data_path.display().to_string(),
        config_path: config_path.display().to_string(),
        states: snapshot.states.iter().map(|s| s.name.clone()).collect(),
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "initialized {}", o.data_path),
        |o, w| {
            pretty_kv(w, "Data", &o.data_path)?;
            pretty_kv(w, "Config", &o.config_path)?;
            pretty_kv(w, "States", o.states.join(", "))
        },
    )
}
