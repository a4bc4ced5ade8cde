#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;
mod session;

use clap::{Parser, Subcommand};
use output::OutputMode;
use reportes_core::config;
use session::Context;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rpt: report lifecycle and assignment history",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format. Overrides --json, FORMAT and user config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Acting user ID (skips env resolution).
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Data file to read and write. Defaults to `.reportes/data.json`.
    #[arg(long, global = true, value_name = "FILE")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create an empty data file",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    rpt init\n\n    # Start over\n    rpt init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one report",
        after_help = "EXAMPLES:\n    rpt show r-1\n    rpt show r-1 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a report to another state",
        long_about = "Record a state change in the report's history and update the report. \
                      The history entry is kept even if the update fails.",
        after_help = "EXAMPLES:\n    rpt move r-1 en_progreso\n    rpt move r-1 cerrado -m \"Bache reparado\""
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Assign a report to a user",
        after_help = "EXAMPLES:\n    rpt assign r-1 u-2"
    )]
    Assign(cmd::assign::AssignArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Remove the current assignee of a report",
        after_help = "EXAMPLES:\n    rpt unassign r-1"
    )]
    Unassign(cmd::assign::UnassignArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show state and assignment history of a report",
        after_help = "EXAMPLES:\n    rpt history r-1\n    rpt history r-1 --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the activity feed",
        after_help = "EXAMPLES:\n    rpt log\n    rpt log r-1 -n 5"
    )]
    Log(cmd::log::LogArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show dashboard totals",
        after_help = "EXAMPLES:\n    rpt summary --format text"
    )]
    Summary,

    #[command(
        next_help_heading = "Lifecycle",
        about = "Delete a report and its history",
        after_help = "EXAMPLES:\n    rpt delete r-1"
    )]
    Delete(cmd::delete::DeleteArgs),
}

impl Cli {
    /// Build the shared command context from flags, env and config files.
    fn context(&self, project_root: PathBuf) -> anyhow::Result<Context> {
        let effective = config::resolve_config(&project_root, self.json)?;
        let output = self
            .format
            .unwrap_or_else(|| OutputMode::from_resolved(&effective.resolved_output));
        let data_path = self
            .data
            .clone()
            .unwrap_or_else(|| session::default_data_path(&project_root));

        Ok(Context {
            project_root,
            data_path,
            output,
            actor_flag: self.actor.clone(),
            config: effective.project,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REPORTES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "rpt=debug,reportes_core=debug,info"
        } else {
            "rpt=info,reportes_core=warn,warn"
        })
    });

    let format = env::var("REPORTES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let ctx = cli.context(project_root)?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx).await,
        Commands::Move(args) => cmd::move_cmd::run_move(args, &ctx).await,
        Commands::Assign(args) => cmd::assign::run_assign(args, &ctx).await,
        Commands::Unassign(args) => cmd::assign::run_unassign(args, &ctx).await,
        Commands::History(args) => cmd::history::run_history(args, &ctx),
        Commands::Log(args) => cmd::log::run_log(args, &ctx),
        Commands::Summary => cmd::summary::run_summary(&ctx).await,
        Commands::Delete(args) => cmd::delete::run_delete(args, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["rpt", "move", "r-1", "cerrado", "--json", "--actor", "u-1"]);
        assert!(cli.json);
        assert_eq!(cli.actor.as_deref(), Some("u-1"));
        match cli.command {
            Commands::Move(args) => {
                assert_eq!(args.id, "r-1");
                assert_eq!(args.state, "cerrado");
                assert!(args.comment.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn format_flag_parses_value_enum() {
        let cli = Cli::parse_from(["rpt", "--format", "text", "summary"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(matches!(cli.command, Commands::Summary));
    }

    #[test]
    fn data_flag_overrides_default_path() {
        let cli = Cli::parse_from(["rpt", "log", "--data", "/tmp/x.json", "-n", "3"]);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/x.json")));
        match cli.command {
            Commands::Log(args) => {
                assert_eq!(args.limit, Some(3));
                assert!(args.id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn move_comment_short_flag() {
        let cli = Cli::parse_from(["rpt", "move", "r-1", "resuelto", "-m", "listo"]);
        let Commands::Move(args) = cli.command else {
            panic!("expected move");
        };
        assert_eq!(args.comment, "listo");
    }
}
