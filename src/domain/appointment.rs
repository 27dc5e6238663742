//! The appointment aggregate.
//!
//! An [`Appointment`] is a value: every operation returns a new instance plus
//! the events describing the change, and the receiver is left untouched. The
//! current state and priority are always the latest entries of the two
//! history logs.

use crate::domain::errors::DomainError;
use crate::domain::events::AppointmentEvent;
use crate::domain::history::{PriorityHistory, PriorityRecord, StateHistory, StateRecord};
use crate::domain::types::{
    AppointmentId, AppointmentState, PatientId, PriorityLevel, Specialty, TimestampUtc,
};
use serde::{Deserialize, Serialize};

/// Parameters for opening a new appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDraft {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub specialty: Specialty,
    pub scheduled_at: TimestampUtc,
    pub initial_state: AppointmentState,
    pub priority: PriorityLevel,
}

/// Result of an aggregate operation: the new instance and what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentChange {
    pub appointment: Appointment,
    pub events: Vec<AppointmentEvent>,
}

/// Persisted form of an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub specialty: Specialty,
    pub scheduled_at: TimestampUtc,
    pub created_at: TimestampUtc,
    pub state_history: Vec<StateRecord>,
    pub priority_history: Vec<PriorityRecord>,
}

/// The appointment aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentRecord", into = "AppointmentRecord")]
pub struct Appointment {
    id: AppointmentId,
    patient_id: PatientId,
    specialty: Specialty,
    scheduled_at: TimestampUtc,
    created_at: TimestampUtc,
    states: StateHistory,
    priorities: PriorityHistory,
    current_state: AppointmentState,
    current_priority: PriorityLevel,
}

impl Appointment {
    /// Opens a new appointment at `now` and emits `Requested`.
    ///
    /// Fails if any identity field is blank or `scheduled_at` lies before `now`.
    pub fn open(
        draft: AppointmentDraft,
        now: TimestampUtc,
    ) -> Result<AppointmentChange, DomainError> {
        if draft.scheduled_at < now {
            return Err(DomainError::validation(format!(
                "scheduled time {} is in the past",
                draft.scheduled_at
            )));
        }

        let appointment = Self::assemble(
            draft.id,
            draft.patient_id,
            draft.specialty,
            draft.scheduled_at,
            now,
            StateHistory::seeded(StateRecord::new(draft.initial_state, now))?,
            PriorityHistory::seeded(PriorityRecord::system(draft.priority, now))?,
        )?;

        let event = appointment.requested_event();
        Ok(AppointmentChange {
            appointment,
            events: vec![event],
        })
    }

    /// Rebuilds an appointment from its persisted form, re-checking invariants.
    pub fn rehydrate(record: AppointmentRecord) -> Result<Self, DomainError> {
        Self::assemble(
            record.id,
            record.patient_id,
            record.specialty,
            record.scheduled_at,
            record.created_at,
            StateHistory::from_records(record.state_history)?,
            PriorityHistory::from_records(record.priority_history)?,
        )
    }

    /// Rebuilds an appointment from its event stream. The first event must be
    /// `Requested`; the rest are applied with [`Appointment::apply_event`].
    pub fn replay(events: &[AppointmentEvent]) -> Result<Self, DomainError> {
        let (first, rest) = events
            .split_first()
            .ok_or_else(|| DomainError::validation("cannot replay an empty event stream"))?;

        let AppointmentEvent::Requested {
            appointment_id,
            patient_id,
            specialty,
            scheduled_at,
            state,
            priority,
            requested_at,
        } = first
        else {
            return Err(DomainError::validation(
                "an appointment stream must start with Requested",
            ));
        };

        let mut appointment = Self::assemble(
            appointment_id.clone(),
            patient_id.clone(),
            specialty.clone(),
            *scheduled_at,
            *requested_at,
            StateHistory::seeded(StateRecord::new(*state, *requested_at))?,
            PriorityHistory::seeded(PriorityRecord::system(*priority, *requested_at))?,
        )?;

        for event in rest {
            appointment = appointment.apply_event(event)?;
        }
        Ok(appointment)
    }

    fn assemble(
        id: AppointmentId,
        patient_id: PatientId,
        specialty: Specialty,
        scheduled_at: TimestampUtc,
        created_at: TimestampUtc,
        states: StateHistory,
        priorities: PriorityHistory,
    ) -> Result<Self, DomainError> {
        if id.is_blank() {
            return Err(DomainError::validation("appointment id must not be empty"));
        }
        if !id.is_well_formed() {
            return Err(DomainError::validation(format!(
                "appointment id '{}' may only use letters, digits, '-', '_' and '.'",
                id
            )));
        }
        if patient_id.is_blank() {
            return Err(DomainError::validation("patient id must not be empty"));
        }
        if specialty.is_blank() {
            return Err(DomainError::validation("specialty must not be empty"));
        }
        if created_at > scheduled_at {
            return Err(DomainError::validation(format!(
                "created at {} is after the scheduled time {}",
                created_at, scheduled_at
            )));
        }

        let current_state = states.current()?;
        let current_priority = priorities.current()?;

        Ok(Self {
            id,
            patient_id,
            specialty,
            scheduled_at,
            created_at,
            states,
            priorities,
            current_state,
            current_priority,
        })
    }

    // ========== Getters ==========

    pub fn id(&self) -> &AppointmentId {
        &self.id
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn specialty(&self) -> &Specialty {
        &self.specialty
    }

    pub fn scheduled_at(&self) -> TimestampUtc {
        self.scheduled_at
    }

    pub fn created_at(&self) -> TimestampUtc {
        self.created_at
    }

    pub fn current_state(&self) -> AppointmentState {
        self.current_state
    }

    pub fn current_priority(&self) -> PriorityLevel {
        self.current_priority
    }

    pub fn state_history(&self) -> &StateHistory {
        &self.states
    }

    pub fn priority_history(&self) -> &PriorityHistory {
        &self.priorities
    }

    /// The `Requested` fact for this appointment as it stands now.
    pub fn requested_event(&self) -> AppointmentEvent {
        AppointmentEvent::Requested {
            appointment_id: self.id.clone(),
            patient_id: self.patient_id.clone(),
            specialty: self.specialty.clone(),
            scheduled_at: self.scheduled_at,
            state: self.current_state,
            priority: self.current_priority,
            requested_at: self.created_at,
        }
    }

    // ========== Operations ==========

    /// Moves the appointment to `new_state` following the transition table.
    pub fn change_state(
        &self,
        new_state: AppointmentState,
        at: TimestampUtc,
    ) -> Result<AppointmentChange, DomainError> {
        let from = self.current_state;
        if new_state == from {
            return Err(DomainError::Unchanged {
                message: format!("appointment {} is already {}", self.id, from),
            });
        }
        if !from.can_transition_to(new_state) {
            return Err(DomainError::InvalidTransition {
                message: format!("{} -> {} is not allowed", from, new_state),
            });
        }

        let appointment = self.apply_state_record(StateRecord::new(new_state, at))?;
        Ok(AppointmentChange {
            appointment,
            events: vec![AppointmentEvent::StateChanged {
                appointment_id: self.id.clone(),
                from,
                to: new_state,
                changed_at: at,
            }],
        })
    }

    /// Replaces the current priority with a human decision.
    pub fn override_priority(
        &self,
        new_priority: PriorityLevel,
        justification: &str,
        modified_by: &str,
        at: TimestampUtc,
    ) -> Result<AppointmentChange, DomainError> {
        let from = self.current_priority;
        if new_priority == from {
            return Err(DomainError::Unchanged {
                message: format!("appointment {} already has priority {}", self.id, from),
            });
        }

        let record = PriorityRecord::human(new_priority, justification, modified_by, at)?;
        let event = AppointmentEvent::PriorityOverriddenByHuman {
            appointment_id: self.id.clone(),
            from,
            to: new_priority,
            justification: record.justification.clone().unwrap_or_default(),
            modified_by: record.modified_by.clone().unwrap_or_default(),
            overridden_at: at,
        };
        let appointment = self.apply_priority_record(record)?;

        Ok(AppointmentChange {
            appointment,
            events: vec![event],
        })
    }

    /// Moves the appointment to a new date.
    ///
    /// Emits `Rescheduled`, followed by `StateChanged` when the appointment
    /// was not already in the `Rescheduled` state.
    pub fn reschedule(
        &self,
        new_date_time: TimestampUtc,
        at: TimestampUtc,
    ) -> Result<AppointmentChange, DomainError> {
        if new_date_time == self.scheduled_at {
            return Err(DomainError::Unchanged {
                message: format!("{} is already scheduled at {}", self.id, new_date_time),
            });
        }

        let moved = self.with_scheduled_at(new_date_time)?;
        let mut events = vec![AppointmentEvent::Rescheduled {
            appointment_id: self.id.clone(),
            old_date_time: self.scheduled_at,
            new_date_time,
            successor_id: None,
            rescheduled_at: at,
        }];

        if moved.current_state == AppointmentState::Rescheduled {
            return Ok(AppointmentChange {
                appointment: moved,
                events,
            });
        }

        let change = moved.change_state(AppointmentState::Rescheduled, at)?;
        events.extend(change.events);
        Ok(AppointmentChange {
            appointment: change.appointment,
            events,
        })
    }

    /// Cancels the appointment. Emits `[Cancelled, StateChanged]`.
    pub fn cancel(&self, at: TimestampUtc) -> Result<AppointmentChange, DomainError> {
        if self.current_state == AppointmentState::Cancelled {
            return Err(DomainError::InvalidTransition {
                message: format!("appointment {} is already cancelled", self.id),
            });
        }

        let change = self.change_state(AppointmentState::Cancelled, at)?;
        let mut events = vec![AppointmentEvent::Cancelled {
            appointment_id: self.id.clone(),
            patient_id: self.patient_id.clone(),
            cancelled_at: at,
        }];
        events.extend(change.events);

        Ok(AppointmentChange {
            appointment: change.appointment,
            events,
        })
    }

    // ========== Replay ==========

    /// Appends a state record without consulting the transition table.
    ///
    /// Used when rebuilding from history, where the transition was already
    /// validated once. Ordering and identity invariants still apply.
    pub fn apply_state_record(&self, record: StateRecord) -> Result<Self, DomainError> {
        let states = self.states.append(record)?;
        let mut next = self.clone();
        next.current_state = states.current()?;
        next.states = states;
        Ok(next)
    }

    /// Appends a priority record without the same-value check.
    pub fn apply_priority_record(&self, record: PriorityRecord) -> Result<Self, DomainError> {
        let priorities = self.priorities.append(record)?;
        let mut next = self.clone();
        next.current_priority = priorities.current()?;
        next.priorities = priorities;
        Ok(next)
    }

    /// Applies a persisted event to this appointment.
    pub fn apply_event(&self, event: &AppointmentEvent) -> Result<Self, DomainError> {
        if event.appointment_id() != &self.id {
            return Err(DomainError::validation(format!(
                "event for {} applied to appointment {}",
                event.appointment_id(),
                self.id
            )));
        }

        match event {
            AppointmentEvent::Requested { .. } => Err(DomainError::validation(
                "Requested can only start an appointment stream",
            )),
            AppointmentEvent::StateChanged {
                from,
                to,
                changed_at,
                ..
            } => {
                if *from != self.current_state {
                    return Err(DomainError::validation(format!(
                        "StateChanged from {} does not match current state {}",
                        from, self.current_state
                    )));
                }
                self.apply_state_record(StateRecord::new(*to, *changed_at))
            }
            AppointmentEvent::PriorityOverriddenByHuman {
                to,
                justification,
                modified_by,
                overridden_at,
                ..
            } => self.apply_priority_record(PriorityRecord::human(
                *to,
                justification,
                modified_by,
                *overridden_at,
            )?),
            AppointmentEvent::Rescheduled {
                new_date_time,
                successor_id: None,
                ..
            } => self.with_scheduled_at(*new_date_time),
            // A handed-off reschedule keeps the old date on this appointment;
            // cancellation is carried by the StateChanged that follows it.
            AppointmentEvent::Rescheduled { .. }
            | AppointmentEvent::Cancelled { .. }
            | AppointmentEvent::DecisionRejected { .. } => Ok(self.clone()),
        }
    }

    fn with_scheduled_at(&self, scheduled_at: TimestampUtc) -> Result<Self, DomainError> {
        if scheduled_at < self.created_at {
            return Err(DomainError::validation(format!(
                "new date {} precedes the creation of appointment {}",
                scheduled_at, self.id
            )));
        }
        let mut next = self.clone();
        next.scheduled_at = scheduled_at;
        Ok(next)
    }
}

impl TryFrom<AppointmentRecord> for Appointment {
    type Error = DomainError;

    fn try_from(record: AppointmentRecord) -> Result<Self, Self::Error> {
        Self::rehydrate(record)
    }
}

impl From<Appointment> for AppointmentRecord {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            specialty: appointment.specialty,
            scheduled_at: appointment.scheduled_at,
            created_at: appointment.created_at,
            state_history: appointment.states.records().to_vec(),
            priority_history: appointment.priorities.records().to_vec(),
        }
    }
}

#[cfg(test)]
#[path = "tests/appointment_tests.rs"]
mod tests;
