//! Unit tests for the append-only history logs.

use super::*;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn ts(minutes: i64) -> TimestampUtc {
    TimestampUtc(Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes))
}

fn state_log() -> StateHistory {
    StateHistory::from_records(vec![
        StateRecord::new(AppointmentState::Requested, ts(0)),
        StateRecord::new(AppointmentState::Confirmed, ts(10)),
    ])
    .unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn from_records_accepts_chronological_entries() {
    let log = state_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log.current().unwrap(), AppointmentState::Confirmed);
}

#[test]
fn from_records_rejects_out_of_order_entries() {
    let result = StateHistory::from_records(vec![
        StateRecord::new(AppointmentState::Requested, ts(10)),
        StateRecord::new(AppointmentState::Confirmed, ts(0)),
    ]);
    assert!(matches!(result, Err(DomainError::HistoryOrder { .. })));
}

#[test]
fn from_records_rejects_shared_timestamps() {
    let result = PriorityHistory::from_records(vec![
        PriorityRecord::system(PriorityLevel::Low, ts(5)),
        PriorityRecord::system(PriorityLevel::High, ts(5)),
    ]);
    assert!(matches!(result, Err(DomainError::HistoryOrder { .. })));
}

#[test]
fn empty_log_has_no_current_value() {
    let log = StateHistory::from_records(Vec::new()).unwrap();
    assert!(log.is_empty());
    assert_eq!(log.current(), Err(DomainError::EmptyHistory));
}

// ============================================================================
// Append
// ============================================================================

#[test]
fn append_returns_new_log_and_leaves_original_untouched() {
    let log = state_log();
    let appended = log
        .append(StateRecord::new(AppointmentState::Attended, ts(20)))
        .unwrap();

    assert_eq!(appended.len(), 3);
    assert_eq!(appended.current().unwrap(), AppointmentState::Attended);
    assert_eq!(log.len(), 2);
    assert_eq!(log.current().unwrap(), AppointmentState::Confirmed);
}

#[test]
fn append_rejects_duplicate_timestamp() {
    let result = state_log().append(StateRecord::new(AppointmentState::Attended, ts(10)));
    assert!(matches!(result, Err(DomainError::HistoryOrder { .. })));
}

#[test]
fn append_rejects_earlier_timestamp() {
    let result = state_log().append(StateRecord::new(AppointmentState::Attended, ts(3)));
    assert!(matches!(result, Err(DomainError::HistoryOrder { .. })));
}

// ============================================================================
// Priority provenance
// ============================================================================

#[test]
fn human_record_requires_justification_and_author() {
    let (justification, author) = ("worsening symptoms", "dr. ruiz");
    assert!(PriorityRecord::human(PriorityLevel::High, "  ", author, ts(0)).is_err());
    assert!(PriorityRecord::human(PriorityLevel::High, justification, "", ts(0)).is_err());

    let record = PriorityRecord::human(PriorityLevel::High, justification, author, ts(0)).unwrap();
    assert_eq!(record.origin, PriorityOrigin::Human);
    assert_eq!(record.modified_by.as_deref(), Some("dr. ruiz"));
}

#[test]
fn human_record_without_provenance_is_rejected_on_load() {
    let forged = PriorityRecord {
        priority: PriorityLevel::High,
        origin: PriorityOrigin::Human,
        occurred_at: ts(0),
        justification: None,
        modified_by: Some("nurse".to_string()),
        causing_event_id: None,
    };
    assert!(PriorityHistory::from_records(vec![forged]).is_err());
}

// ============================================================================
// Properties
// ============================================================================

fn priority_strategy() -> impl Strategy<Value = PriorityLevel> {
    prop_oneof![
        Just(PriorityLevel::High),
        Just(PriorityLevel::Medium),
        Just(PriorityLevel::Low),
    ]
}

proptest! {
    #[test]
    fn append_then_current_is_the_appended_value(
        seed in priority_strategy(),
        next in priority_strategy(),
        gap in 1i64..10_000,
    ) {
        let log = PriorityHistory::seeded(PriorityRecord::system(seed, ts(0))).unwrap();
        let before = log.clone();
        let appended = log.append(PriorityRecord::system(next, ts(gap))).unwrap();

        prop_assert_eq!(appended.current().unwrap(), next);
        prop_assert_eq!(&log, &before);
        prop_assert_eq!(appended.records().first(), before.records().first());
    }

    #[test]
    fn append_at_or_before_the_last_entry_fails(offset in 0i64..10_000) {
        let log = state_log();
        let at = ts(10 - offset);
        prop_assert!(log.append(StateRecord::new(AppointmentState::Attended, at)).is_err());
        prop_assert!(PriorityHistory::seeded(PriorityRecord::system(PriorityLevel::Low, ts(10)))
            .unwrap()
            .append(PriorityRecord::system(PriorityLevel::High, at))
            .is_err());
    }
}
