use std::sync::Arc;

use reportes_core::config::{ProjectConfig, TransitionConfig};
use reportes_core::notify::{Level, RecordingNotifier};
use reportes_core::{
    ChangeType, DeskSnapshot, ErrorCode, Report, ReportDesk, ReportState, StateKind,
    TransitionError, UserRef,
};

fn inspector() -> UserRef {
    UserRef::new("u-9", "Marta", "Quiroga")
}

fn desk(reports: Vec<Report>, config: ProjectConfig) -> (ReportDesk, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let snapshot = DeskSnapshot {
        users: vec![inspector()],
        reports,
        ..DeskSnapshot::default()
    };
    let desk = ReportDesk::from_snapshot(snapshot, notifier.clone(), config);
    (desk, notifier)
}

#[tokio::test]
async fn report_moves_through_its_lifecycle() {
    let report = Report::new("r-1", "Luminaria apagada");
    let (desk, notifier) = desk(vec![report.clone()], ProjectConfig::default());

    desk.assign(&report, Some(inspector()), &inspector()).unwrap();

    let mut current = report;
    for kind in [StateKind::EnProgreso, StateKind::Resuelto, StateKind::Cerrado] {
        let outcome = desk
            .transition(&current, ReportState::from_kind(kind), &inspector(), "")
            .await;
        assert!(outcome.is_success(), "{kind} failed: {outcome:?}");
        current = desk.report("r-1").await.unwrap().unwrap();
        assert_eq!(current.current_state.kind, kind);
    }

    let history = desk.state_history().for_report("r-1");
    let path: Vec<(&str, &str)> = history
        .iter()
        .map(|e| (e.from_state_name.as_str(), e.to_state_name.as_str()))
        .collect();
    assert_eq!(
        path,
        vec![
            ("abierto", "en_progreso"),
            ("en_progreso", "resuelto"),
            ("resuelto", "cerrado"),
        ]
    );
    assert!(history.iter().all(|e| e.change_type == ChangeType::StateChange));

    let received = notifier.received();
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|n| n.level == Level::Success));
    assert_eq!(desk.activity().by_report("r-1").len(), 4);
}

#[tokio::test]
async fn deleted_report_keeps_partial_history_until_cascade() {
    let report = Report::new("r-1", "Bache");
    let (desk, notifier) = desk(vec![report.clone()], ProjectConfig::default());

    let stale = report.clone();
    desk.delete_report("r-1").await.unwrap();

    let outcome = desk
        .transition(&stale, ReportState::from_kind(StateKind::EnProgreso), &inspector(), "")
        .await;

    assert!(!outcome.is_success());
    assert!(outcome.is_partial_write());
    assert_eq!(outcome.code(), Some(ErrorCode::PartialWrite));
    assert!(matches!(
        outcome.error(),
        Some(TransitionError::NotFound { report_id }) if report_id == "r-1"
    ));
    assert_eq!(desk.state_history().for_report("r-1").len(), 1);
    assert_eq!(notifier.received().last().unwrap().level, Level::Error);

    let deleted = desk.delete_report("r-1").await.unwrap();
    assert!(deleted.report.is_none());
    assert_eq!(deleted.state_history_removed, 1);
    assert!(desk.state_history().for_report("r-1").is_empty());
}

#[tokio::test]
async fn compensation_records_reversion_on_failure() {
    let config = ProjectConfig {
        transitions: TransitionConfig {
            compensate_partial_writes: true,
            ..TransitionConfig::default()
        },
        ..ProjectConfig::default()
    };
    let ghost = Report::new("r-404", "Inexistente");
    let (desk, _notifier) = desk(Vec::new(), config);

    let outcome = desk
        .transition(&ghost, ReportState::from_kind(StateKind::Rechazado), &inspector(), "")
        .await;

    assert!(!outcome.is_success());
    let history = desk.state_history().for_report("r-404");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].change_type, ChangeType::Reversion);
    assert_eq!(history[1].from_state_name, "rechazado");
    assert_eq!(history[1].to_state_name, "abierto");
}

#[tokio::test]
async fn unassign_leaves_a_current_empty_assignment() {
    let report = Report::new("r-1", "Bache");
    let (desk, _notifier) = desk(vec![report.clone()], ProjectConfig::default());

    desk.assign(&report, Some(inspector()), &inspector()).unwrap();
    desk.assign(&report, None, &inspector()).unwrap();

    let current = desk.assignments().current_assignment("r-1").unwrap();
    assert!(current.is_current);
    assert!(current.payload.assigned_user.is_none());

    let history = desk.assignments().history("r-1");
    assert_eq!(history.len(), 2);
    assert!(!history.all()[0].is_current);
}
