use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use reportes_core::activity::{ActivityEntryInput, ActivityLog};
use reportes_core::assignment::{Assignment, AssignmentTracker};
use reportes_core::ledger::{HistoryEntry, HistoryLedger};
use reportes_core::model::{Report, UserRef};

fn arb_user() -> impl Strategy<Value = Option<UserRef>> {
    prop::option::of((0u8..5).prop_map(|n| UserRef::new(format!("u-{n}"), "Nombre", format!("{n}"))))
}

fn ledger_from(payloads: &[u32]) -> HistoryLedger<u32> {
    payloads
        .iter()
        .fold(HistoryLedger::new(), |ledger, payload| ledger.append(*payload))
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn exactly_one_current_after_appends(payloads in prop::collection::vec(any::<u32>(), 1..40)) {
        let ledger = ledger_from(&payloads);

        let current: Vec<&HistoryEntry<u32>> = ledger.iter().filter(|e| e.is_current).collect();
        prop_assert_eq!(current.len(), 1);
        prop_assert_eq!(current[0].payload, *payloads.last().unwrap());
        prop_assert_eq!(ledger.len(), payloads.len());
    }

    #[test]
    fn append_leaves_input_untouched(payloads in prop::collection::vec(any::<u32>(), 0..20), next in any::<u32>()) {
        let before = ledger_from(&payloads);
        let snapshot = before.clone();

        let after = before.append(next);

        prop_assert_eq!(&before, &snapshot);
        prop_assert_eq!(after.len(), before.len() + 1);
        for (old, new) in before.iter().zip(after.iter()) {
            prop_assert_eq!(&old.id, &new.id);
            prop_assert_eq!(old.payload, new.payload);
            prop_assert_eq!(old.created_at, new.created_at);
            prop_assert!(!new.is_current);
        }
    }

    #[test]
    fn serialized_ledger_roundtrips(payloads in prop::collection::vec(any::<u32>(), 0..20)) {
        let ledger = ledger_from(&payloads);
        let json = serde_json::to_string(&ledger).unwrap();
        let back: HistoryLedger<u32> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, ledger);
    }

    #[test]
    fn tracker_current_matches_last_assignment(users in prop::collection::vec(arb_user(), 1..15)) {
        let tracker = AssignmentTracker::new();
        let report = Report::new("r-1", "Bache");
        for user in &users {
            tracker.assign(&report, user.clone());
        }

        let history = tracker.history("r-1");
        prop_assert_eq!(history.len(), users.len());
        prop_assert_eq!(history.iter().filter(|e| e.is_current).count(), 1);
        let expected = Assignment { assigned_user: users.last().cloned().flatten() };
        prop_assert_eq!(&history.current().unwrap().payload, &expected);
    }

    #[test]
    fn activity_is_sorted_newest_first(offsets in prop::collection::vec(-1000i64..1000, 0..30)) {
        let log = ActivityLog::new();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        for (i, offset) in offsets.iter().enumerate() {
            let mut input = ActivityEntryInput::now("r-1", format!("evento {i}"));
            input.date = base + Duration::minutes(*offset);
            log.record(input);
        }

        let entries = log.by_report("r-1");
        prop_assert_eq!(entries.len(), offsets.len());
        for pair in entries.windows(2) {
            prop_assert!(pair[0].date >= pair[1].date);
        }
    }
}
