//! Appointment domain events.
//!
//! Events represent facts that have happened. They are published in causal
//! order by the workflow and can be replayed to rebuild an aggregate.

use crate::domain::types::{
    AppointmentId, AppointmentState, PatientId, PriorityLevel, Specialty, TimestampUtc,
};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events emitted by the appointment aggregate and the scheduling workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppointmentEvent {
    /// An appointment was opened.
    Requested {
        appointment_id: AppointmentId,
        patient_id: PatientId,
        specialty: Specialty,
        scheduled_at: TimestampUtc,
        state: AppointmentState,
        priority: PriorityLevel,
        requested_at: TimestampUtc,
    },

    /// The appointment moved between two states.
    StateChanged {
        appointment_id: AppointmentId,
        from: AppointmentState,
        to: AppointmentState,
        changed_at: TimestampUtc,
    },

    /// A person replaced the current priority.
    PriorityOverriddenByHuman {
        appointment_id: AppointmentId,
        from: PriorityLevel,
        to: PriorityLevel,
        justification: String,
        modified_by: String,
        overridden_at: TimestampUtc,
    },

    /// The appointment date changed. When `successor_id` is set the new slot
    /// lives on a separate appointment and this one keeps its old date.
    Rescheduled {
        appointment_id: AppointmentId,
        old_date_time: TimestampUtc,
        new_date_time: TimestampUtc,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        successor_id: Option<AppointmentId>,
        rescheduled_at: TimestampUtc,
    },

    /// The appointment was cancelled. A `StateChanged` event follows.
    Cancelled {
        appointment_id: AppointmentId,
        patient_id: PatientId,
        cancelled_at: TimestampUtc,
    },

    /// A reviewer turned down a pending decision; no appointment was created.
    DecisionRejected {
        pending_decision_id: String,
        appointment_id: AppointmentId,
        rejected_by: String,
        reason: String,
        rejected_at: TimestampUtc,
    },
}

impl AppointmentEvent {
    /// The appointment this event is about. Used as the aggregate id in the log.
    pub fn appointment_id(&self) -> &AppointmentId {
        match self {
            Self::Requested { appointment_id, .. }
            | Self::StateChanged { appointment_id, .. }
            | Self::PriorityOverriddenByHuman { appointment_id, .. }
            | Self::Rescheduled { appointment_id, .. }
            | Self::Cancelled { appointment_id, .. }
            | Self::DecisionRejected { appointment_id, .. } => appointment_id,
        }
    }

    /// When the fact happened.
    pub fn occurred_at(&self) -> TimestampUtc {
        match self {
            Self::Requested { requested_at, .. } => *requested_at,
            Self::StateChanged { changed_at, .. } => *changed_at,
            Self::PriorityOverriddenByHuman { overridden_at, .. } => *overridden_at,
            Self::Rescheduled { rescheduled_at, .. } => *rescheduled_at,
            Self::Cancelled { cancelled_at, .. } => *cancelled_at,
            Self::DecisionRejected { rejected_at, .. } => *rejected_at,
        }
    }
}

impl DomainEvent for AppointmentEvent {
    fn event_type(&self) -> String {
        match self {
            Self::Requested { .. } => "Requested".to_string(),
            Self::StateChanged { .. } => "StateChanged".to_string(),
            Self::PriorityOverriddenByHuman { .. } => "PriorityOverriddenByHuman".to_string(),
            Self::Rescheduled { .. } => "Rescheduled".to_string(),
            Self::Cancelled { .. } => "Cancelled".to_string(),
            Self::DecisionRejected { .. } => "DecisionRejected".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1".to_string()
    }
}
