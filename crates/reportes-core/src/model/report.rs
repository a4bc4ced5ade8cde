use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Lifecycle state identifiers a report can occupy.
///
/// The presentation layer maps these to icons and colors; the core only
/// compares identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Abierto,
    EnProgreso,
    Resuelto,
    Cerrado,
    Rechazado,
}

impl StateKind {
    /// All state kinds in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Abierto,
        Self::EnProgreso,
        Self::Resuelto,
        Self::Cerrado,
        Self::Rechazado,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abierto => "abierto",
            Self::EnProgreso => "en_progreso",
            Self::Resuelto => "resuelto",
            Self::Cerrado => "cerrado",
            Self::Rechazado => "rechazado",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "abierto" => Ok(Self::Abierto),
            "en_progreso" => Ok(Self::EnProgreso),
            "resuelto" => Ok(Self::Resuelto),
            "cerrado" => Ok(Self::Cerrado),
            "rechazado" => Ok(Self::Rechazado),
            _ => Err(ParseEnumError {
                expected: "state",
                got: s.to_string(),
            }),
        }
    }
}

/// A named state as configured for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportState {
    pub id: String,
    pub name: String,
    pub kind: StateKind,
}

impl ReportState {
    /// Build the canonical state for a kind, using the identifier as id and name.
    #[must_use]
    pub fn from_kind(kind: StateKind) -> Self {
        Self {
            id: kind.as_str().to_string(),
            name: kind.as_str().to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A citizen-filed report. Referenced, not owned, by the history subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub current_state: ReportState,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// A new report in the `abierto` state.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            category: None,
            location: None,
            current_state: ReportState::from_kind(StateKind::Abierto),
            created_at: Utc::now(),
        }
    }
}

/// Partial update applied by a [`ReportStore`](crate::store::ReportStore).
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<ReportState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ReportPatch {
    /// Patch that only moves the report to `state`.
    #[must_use]
    pub fn state(state: ReportState) -> Self {
        Self {
            current_state: Some(state),
            ..Self::default()
        }
    }

    pub fn apply(&self, report: &mut Report) {
        if let Some(state) = &self.current_state {
            report.current_state = state.clone();
        }
        if let Some(title) = &self.title {
            report.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            report.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            report.category = Some(category.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_kind_json_uses_snake_case_identifiers() {
        assert_eq!(
            serde_json::to_string(&StateKind::EnProgreso).unwrap(),
            "\"en_progreso\""
        );
        assert_eq!(
            serde_json::from_str::<StateKind>("\"rechazado\"").unwrap(),
            StateKind::Rechazado
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for kind in StateKind::ALL {
            assert_eq!(StateKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(
            StateKind::from_str("En Progreso").unwrap(),
            StateKind::EnProgreso
        );
        assert!(StateKind::from_str("bloqueado").is_err());
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut report = Report::new("r-1", "Bache en Av. Central");
        report.category = Some("vialidad".into());

        ReportPatch::state(ReportState::from_kind(StateKind::Resuelto)).apply(&mut report);

        assert_eq!(report.current_state.kind, StateKind::Resuelto);
        assert_eq!(report.title, "Bache en Av. Central");
        assert_eq!(report.category.as_deref(), Some("vialidad"));
    }

    #[test]
    fn new_report_starts_open() {
        let report = Report::new("r-2", "Luminaria apagada");
        assert_eq!(report.current_state.name, "abierto");
        assert!(report.location.is_none());
    }
}
