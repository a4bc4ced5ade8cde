use std::fmt;

/// Machine-readable error codes surfaced to operators and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    SnapshotParseError,
    ReportNotFound,
    AssigneeBlocked,
    CorruptLedger,
    PersistenceFailure,
    HistoryWriteFailed,
    PartialWrite,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::SnapshotParseError => "E1003",
            Self::ReportNotFound => "E2001",
            Self::AssigneeBlocked => "E2002",
            Self::CorruptLedger => "E3001",
            Self::PersistenceFailure => "E5001",
            Self::HistoryWriteFailed => "E5002",
            Self::PartialWrite => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Data file not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotParseError => "Data file parse error",
            Self::ReportNotFound => "Report not found",
            Self::AssigneeBlocked => "Current assignee is blocked",
            Self::CorruptLedger => "History ledger has more than one current entry",
            Self::PersistenceFailure => "Report store update failed",
            Self::HistoryWriteFailed => "State history write failed",
            Self::PartialWrite => "History recorded but report not updated",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `rpt init` or pass --data pointing at an existing data file."),
            Self::ConfigParseError => Some("Fix syntax in .reportes/config.toml and retry."),
            Self::SnapshotParseError => Some("Validate the data file as JSON and retry."),
            Self::ReportNotFound => Some("Check the report ID with `rpt summary` or `rpt show`."),
            Self::AssigneeBlocked => {
                Some("Unblock the current assignee before reassigning the report.")
            }
            Self::CorruptLedger => Some("Remove the extra current flags from the data file."),
            Self::PersistenceFailure => Some("Retry once the report store is reachable."),
            Self::HistoryWriteFailed => Some("Retry once. If persistent, report a bug with logs."),
            Self::PartialWrite => {
                Some("Inspect `rpt history` for the report; the recorded change was not applied.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
