use super::*;
use crate::decision::{DecisionEngine, DecisionWeight};
use crate::domain::{
    AppointmentDraft, AppointmentState, PatientId, PriorityLevel, Specialty, TimestampUtc,
};
use crate::workflow::AppointmentRequest;
use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

fn ts(minutes: i64) -> TimestampUtc {
    TimestampUtc(Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes))
}

fn appointment(id: &str, patient: &str) -> Appointment {
    Appointment::open(
        AppointmentDraft {
            id: AppointmentId::from(id),
            patient_id: PatientId::from(patient),
            specialty: Specialty::from("neurology"),
            scheduled_at: ts(600),
            initial_state: AppointmentState::Requested,
            priority: PriorityLevel::Low,
        },
        ts(0),
    )
    .unwrap()
    .appointment
}

fn pending(id: &str, minutes: i64) -> PendingDecision {
    let request = AppointmentRequest {
        request_id: AppointmentId::from(id),
        patient_id: PatientId::from("p-1"),
        specialty: Specialty::from("neurology"),
        scheduled_at: ts(600),
        reason: "severe chest pain".to_string(),
        age: 30.0,
        wait_days: 2.0,
        weight: None,
    };
    let context = request.to_context(DecisionWeight::High).unwrap();
    let result = DecisionEngine::new().evaluate(&context);
    PendingDecision::new(&request.request_id, context, result, ts(minutes)).unwrap()
}

// ============================================================================
// Appointments
// ============================================================================

#[tokio::test]
async fn appointment_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let repo = FileAppointmentRepository::new(dir.path().join("appointments"));
    let original = appointment("appt-1", "p-1");

    repo.save(&original).await.unwrap();
    let loaded = repo
        .find_by_id(&AppointmentId::from("appt-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, original);
    assert!(repo
        .find_by_id(&AppointmentId::from("appt-2"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn save_overwrites_but_create_does_not() {
    let dir = tempdir().unwrap();
    let repo = FileAppointmentRepository::new(dir.path().to_path_buf());
    let original = appointment("appt-1", "p-1");
    repo.create(&original).await.unwrap();

    let confirmed = original
        .change_state(AppointmentState::Confirmed, ts(1))
        .unwrap()
        .appointment;
    let err = repo.create(&confirmed).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { id } if id == "appt-1"));

    repo.save(&confirmed).await.unwrap();
    let loaded = repo.find_by_id(original.id()).await.unwrap().unwrap();
    assert_eq!(loaded.current_state(), AppointmentState::Confirmed);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn list_applies_filter_in_id_order() {
    let dir = tempdir().unwrap();
    let repo = FileAppointmentRepository::new(dir.path().to_path_buf());
    for (id, patient) in [("c", "p-1"), ("a", "p-1"), ("b", "p-2")] {
        repo.save(&appointment(id, patient)).await.unwrap();
    }

    let filter = AppointmentFilter {
        patient_id: Some(PatientId::from("p-1")),
        state: None,
    };
    let ids: Vec<String> = repo
        .list(&filter)
        .await
        .unwrap()
        .iter()
        .map(|a| a.id().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn tampered_document_is_rejected_on_load() {
    let dir = tempdir().unwrap();
    let repo = FileAppointmentRepository::new(dir.path().to_path_buf());
    repo.save(&appointment("appt-1", "p-1")).await.unwrap();

    let path = dir.path().join("appt-1.json");
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replace("\"p-1\"", "\"  \"")).unwrap();

    let err = repo
        .find_by_id(&AppointmentId::from("appt-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[tokio::test]
async fn unsafe_ids_read_as_absent_and_cannot_be_written() {
    let dir = tempdir().unwrap();
    let appointments = FileAppointmentRepository::new(dir.path().join("appointments"));
    let found = appointments
        .find_by_id(&AppointmentId::from("../escape"))
        .await
        .unwrap();
    assert!(found.is_none());

    let repo = FilePendingDecisionRepository::new(dir.path().join("pending"));
    assert!(repo.find_by_id("../escape").await.unwrap().is_none());
    repo.delete("visit 1").await.unwrap();

    let mut decision = pending("req-1", 0);
    decision.id = "../escape".to_string();
    let err = repo.save(&decision).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidId { id } if id == "../escape"));
    assert!(!dir.path().join("escape.json").exists());
}

// ============================================================================
// Pending decisions
// ============================================================================

#[tokio::test]
async fn pending_decisions_save_list_and_delete() {
    let dir = tempdir().unwrap();
    let repo = FilePendingDecisionRepository::new(dir.path().join("pending"));
    let later = pending("req-2", 5);
    let earlier = pending("req-1", 1);
    repo.save(&later).await.unwrap();
    repo.save(&earlier).await.unwrap();

    let listed = repo.list().await.unwrap();
    assert_eq!(listed, vec![earlier.clone(), later.clone()]);
    let found = repo.find_by_id(&earlier.id).await.unwrap().unwrap();
    assert_eq!(found.request().unwrap(), earlier.request().unwrap());

    repo.delete(&earlier.id).await.unwrap();
    repo.delete(&earlier.id).await.unwrap();
    assert!(repo.find_by_id(&earlier.id).await.unwrap().is_none());
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pending_decision_with_blank_reason_is_corrupt() {
    let dir = tempdir().unwrap();
    let repo = FilePendingDecisionRepository::new(dir.path().to_path_buf());
    let mut decision = pending("req-1", 0);
    repo.save(&decision).await.unwrap();

    decision.reason = " ".to_string();
    repo.save(&decision).await.unwrap();
    assert!(matches!(
        repo.find_by_id(&decision.id).await,
        Err(StoreError::Corrupt { .. })
    ));
}
