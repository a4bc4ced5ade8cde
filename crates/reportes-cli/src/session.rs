//! Per-invocation state: the desk loaded from the data file, and the
//! notifier that surfaces transition results on the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reportes_core::config::ProjectConfig;
use reportes_core::notify::{Level, Notification, Notifier, TracingNotifier};
use reportes_core::{DeskSnapshot, ErrorCode, ReportDesk};

use crate::output::{CliError, OutputMode, render_error};

/// Resolved global flags shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_root: PathBuf,
    pub data_path: PathBuf,
    pub output: OutputMode,
    pub actor_flag: Option<String>,
    pub config: ProjectConfig,
}

impl Context {
    pub fn actor_flag(&self) -> Option<&str> {
        self.actor_flag.as_deref()
    }
}

/// Prints success notifications to stderr in human modes.
///
/// Failures are shown by the command as a coded error, so error
/// notifications only reach the log. In JSON mode stdout stays
/// machine-readable and every notification goes to the log.
#[derive(Debug)]
pub struct ConsoleNotifier {
    output: OutputMode,
    log: TracingNotifier,
}

impl ConsoleNotifier {
    pub const fn new(output: OutputMode) -> Self {
        Self {
            output,
            log: TracingNotifier,
        }
    }

    fn prints(&self, notification: &Notification) -> bool {
        !self.output.is_json() && notification.level == Level::Success
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if self.prints(&notification) {
            eprintln!("{notification}");
        } else if self.output.is_json() {
            self.log.notify(notification);
        } else {
            tracing::debug!(target: "reportes::notify", "{}", notification.message);
        }
    }
}

pub struct Session {
    pub desk: ReportDesk,
    data_path: PathBuf,
}

impl Session {
    /// Load the data file named by `ctx`.
    ///
    /// Renders a coded error and fails if the file is missing or unreadable.
    pub fn open(ctx: &Context) -> anyhow::Result<Self> {
        if !ctx.data_path.exists() {
            render_error(
                ctx.output,
                &CliError::coded(
                    ErrorCode::NotInitialized,
                    format!("data file {} not found", ctx.data_path.display()),
                ),
            )?;
            anyhow::bail!("data file not found");
        }

        let snapshot = match DeskSnapshot::load(&ctx.data_path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                render_error(
                    ctx.output,
                    &CliError::coded(ErrorCode::SnapshotParseError, format!("{err:#}")),
                )?;
                return Err(err);
            }
        };

        tracing::debug!(
            path = %ctx.data_path.display(),
            reports = snapshot.reports.len(),
            users = snapshot.users.len(),
            "data file loaded"
        );

        let notifier = Arc::new(ConsoleNotifier::new(ctx.output));
        Ok(Self {
            desk: ReportDesk::from_snapshot(snapshot, notifier, ctx.config.clone()),
            data_path: ctx.data_path.clone(),
        })
    }

    /// Write every collection back to the data file.
    pub async fn save(&self) -> anyhow::Result<()> {
        let snapshot = self.desk.snapshot().await?;
        snapshot.save(&self.data_path)
    }
}

/// Default data file for a project root.
pub fn default_data_path(project_root: &Path) -> PathBuf {
    project_root
        .join(reportes_core::config::PROJECT_DIR)
        .join("data.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_modes_print_only_successes() {
        let notifier = ConsoleNotifier::new(OutputMode::Text);
        assert!(notifier.prints(&Notification::success("r-1 moved")));
        assert!(!notifier.prints(&Notification::error("could not update r-1")));

        let pretty = ConsoleNotifier::new(OutputMode::Pretty);
        assert!(!pretty.prints(&Notification::error("could not update r-1")));
    }

    #[test]
    fn json_mode_prints_nothing() {
        let notifier = ConsoleNotifier::new(OutputMode::Json);
        assert!(!notifier.prints(&Notification::success("r-1 moved")));
        assert!(!notifier.prints(&Notification::error("could not update r-1")));
    }
}
