//! Scheduling use cases.
//!
//! `SchedulingWorkflow` connects the decision engine to the appointment
//! aggregate: requests are evaluated, then either materialized right away or
//! parked as a [`PendingDecision`] until a reviewer approves or rejects them.
//!
//! Events are published before the matching persistence writes, in the order
//! the aggregate produced them. Domain and store errors never cross this
//! boundary; every use case returns a [`UseCaseFailure`] instead.

use crate::decision::{AutonomyLevel, DecisionEngine, DecisionResult, DecisionWeight};
use crate::domain::{
    Appointment, AppointmentChange, AppointmentDraft, AppointmentEvent, AppointmentId,
    AppointmentState, Clock, PriorityLevel, TimestampUtc,
};
use crate::workflow::outcome::UseCaseFailure;
use crate::workflow::pending::{AppointmentRequest, PendingDecision};
use crate::workflow::ports::{
    AppointmentFilter, AppointmentRepository, EventPublisher, PendingDecisionRepository, StoreError,
};
use serde::Serialize;
use std::sync::Arc;

/// Result of [`SchedulingWorkflow::request_appointment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The engine allowed the request to proceed unattended.
    Scheduled {
        appointment: Appointment,
        decision: DecisionResult,
    },
    /// The request waits for a reviewer.
    Pending {
        pending_decision_id: String,
        autonomy_level: AutonomyLevel,
        reason: String,
        decision: DecisionResult,
    },
}

/// Result of [`SchedulingWorkflow::reschedule_appointment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rescheduling {
    /// The original appointment, now in the `Rescheduled` state.
    pub original: Appointment,
    /// The new appointment holding the new slot.
    pub successor: Appointment,
}

pub struct SchedulingWorkflow {
    engine: DecisionEngine,
    clock: Arc<dyn Clock>,
    appointments: Arc<dyn AppointmentRepository>,
    pending: Arc<dyn PendingDecisionRepository>,
    publisher: Arc<dyn EventPublisher>,
    default_weight: DecisionWeight,
}

impl SchedulingWorkflow {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        pending: Arc<dyn PendingDecisionRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(),
            clock,
            appointments,
            pending,
            publisher,
            default_weight: DecisionWeight::High,
        }
    }

    /// Weight used for requests that do not carry one.
    pub fn with_default_weight(mut self, weight: DecisionWeight) -> Self {
        self.default_weight = weight;
        self
    }

    // ========== Request / approve / reject ==========

    /// Evaluates a scheduling request and either creates the appointment or
    /// parks the decision for review.
    pub async fn request_appointment(
        &self,
        request: AppointmentRequest,
    ) -> Result<RequestOutcome, UseCaseFailure> {
        if request.request_id.is_blank() {
            return Err(UseCaseFailure::validation("request id must not be empty"));
        }
        if !request.request_id.is_well_formed() {
            return Err(malformed_id("request", &request.request_id));
        }
        if self.exists(&request.request_id).await? {
            return Err(UseCaseFailure::validation(format!(
                "appointment {} already exists",
                request.request_id
            )));
        }
        if let Some(open) = self.pending_for(&request.request_id).await? {
            return Err(UseCaseFailure::validation(format!(
                "request {} is already waiting for review as {}",
                request.request_id, open.id
            )));
        }

        let context = request.to_context(self.default_weight)?;
        let decision = self.engine.evaluate(&context);
        tracing::debug!(
            "Evaluated request {}: {} (review: {})",
            request.request_id,
            decision.autonomy_level,
            decision.requires_human_review
        );

        let Some(primary) = decision.primary_recommendation.clone() else {
            let reason = decision
                .review_reason
                .clone()
                .unwrap_or_else(|| "no recommendation was produced".to_string());
            return Err(UseCaseFailure::validation(reason));
        };

        let now = self.clock.now();
        if decision.autonomy_level.needs_approval() {
            let pending = PendingDecision::new(&request.request_id, context, decision, now)?;
            self.pending.save(&pending).await?;
            tracing::info!(
                "Request {} parked as {} ({}): {}",
                request.request_id,
                pending.id,
                pending.autonomy_level,
                pending.reason
            );
            return Ok(RequestOutcome::Pending {
                pending_decision_id: pending.id,
                autonomy_level: pending.autonomy_level,
                reason: pending.reason,
                decision: pending.result,
            });
        }

        if decision.requires_human_review {
            tracing::warn!(
                "Request {} flagged for review but scheduled automatically: {}",
                request.request_id,
                decision.review_reason.as_deref().unwrap_or("none")
            );
        }

        let priority: PriorityLevel = primary.value.parse()?;
        let change = Appointment::open(
            draft_from(&request, AppointmentState::Requested, priority),
            now,
        )?;
        match self.open_new(&change).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { id }) => {
                return Err(UseCaseFailure::validation(format!(
                    "appointment {} already exists",
                    id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            "Scheduled appointment {} with priority {}",
            change.appointment.id(),
            priority
        );
        Ok(RequestOutcome::Scheduled {
            appointment: change.appointment,
            decision,
        })
    }

    /// Materializes a pending decision as a confirmed appointment.
    ///
    /// Approving a decision whose appointment already exists fails with
    /// `AlreadyApproved` and writes nothing.
    pub async fn approve_pending_decision(
        &self,
        pending_id: &str,
    ) -> Result<Appointment, UseCaseFailure> {
        let decision = self.resolve_pending(pending_id).await?;
        let request = decision.request()?;

        if self.exists(&request.request_id).await? {
            tracing::info!("Pending decision {} was already approved", pending_id);
            return Err(already_approved(&request.request_id));
        }

        let priority = decision.recommended_priority().ok_or_else(|| {
            UseCaseFailure::validation(format!(
                "pending decision {} has no usable recommendation",
                pending_id
            ))
        })?;

        let change = Appointment::open(
            draft_from(&request, AppointmentState::Confirmed, priority),
            self.clock.now(),
        )?;
        match self.open_new(&change).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::info!("Lost approval race for {}", request.request_id);
                return Err(already_approved(&request.request_id));
            }
            Err(e) => return Err(e.into()),
        }
        self.pending.delete(pending_id).await?;

        tracing::info!(
            "Approved {} as appointment {} ({})",
            pending_id,
            change.appointment.id(),
            priority
        );
        Ok(change.appointment)
    }

    /// Turns down a pending decision. No appointment is created.
    pub async fn reject_pending_decision(
        &self,
        pending_id: &str,
        rejected_by: &str,
        reason: &str,
    ) -> Result<PendingDecision, UseCaseFailure> {
        let (rejected_by, reason) = (rejected_by.trim(), reason.trim());
        if rejected_by.is_empty() {
            return Err(UseCaseFailure::validation(
                "a rejection requires the reviewer",
            ));
        }
        if reason.is_empty() {
            return Err(UseCaseFailure::validation("a rejection requires a reason"));
        }

        let decision = self.resolve_pending(pending_id).await?;
        let request = decision.request()?;
        if self.exists(&request.request_id).await? {
            return Err(already_approved(&request.request_id));
        }

        let event = AppointmentEvent::DecisionRejected {
            pending_decision_id: decision.id.clone(),
            appointment_id: request.request_id.clone(),
            rejected_by: rejected_by.to_string(),
            reason: reason.to_string(),
            rejected_at: self.clock.now(),
        };
        self.publish_all(std::slice::from_ref(&event)).await?;
        self.pending.delete(pending_id).await?;

        tracing::info!("Rejected {} by {}: {}", pending_id, rejected_by, reason);
        Ok(decision)
    }

    // ========== Appointment changes ==========

    /// Closes a confirmed appointment and opens a successor at `new_date_time`.
    ///
    /// Publishes `[StateChanged, Rescheduled, Requested]`.
    pub async fn reschedule_appointment(
        &self,
        id: &AppointmentId,
        new_date_time: TimestampUtc,
        successor_id: Option<AppointmentId>,
    ) -> Result<Rescheduling, UseCaseFailure> {
        let original = self.load(id).await?;
        if original.current_state() != AppointmentState::Confirmed {
            return Err(UseCaseFailure::invalid_state(format!(
                "only confirmed appointments can be rescheduled; {} is {}",
                id,
                original.current_state()
            )));
        }
        if new_date_time == original.scheduled_at() {
            return Err(UseCaseFailure::validation(format!(
                "appointment {} is already scheduled at {}",
                id, new_date_time
            )));
        }

        let successor_id = successor_id.unwrap_or_else(AppointmentId::generate);
        if !successor_id.is_well_formed() {
            return Err(malformed_id("successor", &successor_id));
        }
        if &successor_id == id || self.exists(&successor_id).await? {
            return Err(UseCaseFailure::validation(format!(
                "successor id {} is already in use",
                successor_id
            )));
        }

        let now = self.clock.now();
        let closed = original.change_state(AppointmentState::Rescheduled, now)?;
        let rescheduled = AppointmentEvent::Rescheduled {
            appointment_id: id.clone(),
            old_date_time: original.scheduled_at(),
            new_date_time,
            successor_id: Some(successor_id.clone()),
            rescheduled_at: now,
        };
        let opened = Appointment::open(
            AppointmentDraft {
                id: successor_id,
                patient_id: original.patient_id().clone(),
                specialty: original.specialty().clone(),
                scheduled_at: new_date_time,
                initial_state: AppointmentState::Requested,
                priority: original.current_priority(),
            },
            now,
        )?;

        let mut events = closed.events;
        events.push(rescheduled);
        events.extend(opened.events);
        self.publish_all(&events).await?;

        self.appointments.save(&closed.appointment).await?;
        self.appointments.create(&opened.appointment).await?;

        tracing::info!(
            "Rescheduled {} to {} as {}",
            id,
            new_date_time,
            opened.appointment.id()
        );
        Ok(Rescheduling {
            original: closed.appointment,
            successor: opened.appointment,
        })
    }

    pub async fn change_appointment_state(
        &self,
        id: &AppointmentId,
        new_state: AppointmentState,
    ) -> Result<Appointment, UseCaseFailure> {
        let appointment = self.load(id).await?;
        let change = appointment.change_state(new_state, self.clock.now())?;
        self.commit(change).await
    }

    /// Publishes `[Cancelled, StateChanged]`.
    pub async fn cancel_appointment(
        &self,
        id: &AppointmentId,
    ) -> Result<Appointment, UseCaseFailure> {
        let appointment = self.load(id).await?;
        let change = appointment.cancel(self.clock.now())?;
        self.commit(change).await
    }

    pub async fn override_appointment_priority(
        &self,
        id: &AppointmentId,
        priority: PriorityLevel,
        justification: &str,
        modified_by: &str,
    ) -> Result<Appointment, UseCaseFailure> {
        let appointment = self.load(id).await?;
        let change = appointment.override_priority(
            priority,
            justification,
            modified_by,
            self.clock.now(),
        )?;
        self.commit(change).await
    }

    // ========== Queries ==========

    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, UseCaseFailure> {
        Ok(self.appointments.list(filter).await?)
    }

    pub async fn list_pending_decisions(&self) -> Result<Vec<PendingDecision>, UseCaseFailure> {
        Ok(self.pending.list().await?)
    }

    // ========== Helpers ==========

    async fn load(&self, id: &AppointmentId) -> Result<Appointment, UseCaseFailure> {
        self.appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| UseCaseFailure::not_found(format!("appointment {} not found", id)))
    }

    /// Looks up a pending decision. A missing decision whose appointment
    /// exists was consumed by an earlier approval.
    async fn resolve_pending(&self, pending_id: &str) -> Result<PendingDecision, UseCaseFailure> {
        if let Some(decision) = self.pending.find_by_id(pending_id).await? {
            return Ok(decision);
        }
        if let Some(request_id) = request_id_of(pending_id) {
            if self.exists(&request_id).await? {
                return Err(already_approved(&request_id));
            }
        }
        Err(UseCaseFailure::not_found(format!(
            "pending decision {} not found",
            pending_id
        )))
    }

    /// The open pending decision parked for `request_id`, if any.
    async fn pending_for(
        &self,
        request_id: &AppointmentId,
    ) -> Result<Option<PendingDecision>, StoreError> {
        Ok(self
            .pending
            .list()
            .await?
            .into_iter()
            .find(|decision| request_id_of(&decision.id).as_ref() == Some(request_id)))
    }

    async fn exists(&self, id: &AppointmentId) -> Result<bool, StoreError> {
        Ok(self.appointments.find_by_id(id).await?.is_some())
    }

    async fn publish_all(&self, events: &[AppointmentEvent]) -> Result<(), StoreError> {
        for event in events {
            self.publisher.publish(event).await?;
        }
        Ok(())
    }

    /// Records the events of a new appointment and inserts it. A taken id
    /// surfaces as `StoreError::AlreadyExists` from either step.
    async fn open_new(&self, change: &AppointmentChange) -> Result<(), StoreError> {
        self.publish_all(&change.events).await?;
        self.appointments.create(&change.appointment).await
    }

    async fn commit(&self, change: AppointmentChange) -> Result<Appointment, UseCaseFailure> {
        self.publish_all(&change.events).await?;
        self.appointments.save(&change.appointment).await?;
        tracing::info!(
            "Appointment {} is {} with priority {}",
            change.appointment.id(),
            change.appointment.current_state(),
            change.appointment.current_priority()
        );
        Ok(change.appointment)
    }
}

fn draft_from(
    request: &AppointmentRequest,
    initial_state: AppointmentState,
    priority: PriorityLevel,
) -> AppointmentDraft {
    AppointmentDraft {
        id: request.request_id.clone(),
        patient_id: request.patient_id.clone(),
        specialty: request.specialty.clone(),
        scheduled_at: request.scheduled_at,
        initial_state,
        priority,
    }
}

fn malformed_id(role: &str, id: &AppointmentId) -> UseCaseFailure {
    UseCaseFailure::validation(format!(
        "{} id '{}' may only use letters, digits, '-', '_' and '.'",
        role, id
    ))
}

fn already_approved(request_id: &AppointmentId) -> UseCaseFailure {
    UseCaseFailure::already_approved(format!(
        "the decision for request {} was already approved",
        request_id
    ))
}

/// Extracts `requestId` from `pending-{requestId}-{millis}`.
fn request_id_of(pending_id: &str) -> Option<AppointmentId> {
    let rest = pending_id.strip_prefix("pending-")?;
    let (request_id, millis) = rest.rsplit_once('-')?;
    if request_id.is_empty() || millis.parse::<i64>().is_err() {
        return None;
    }
    Some(AppointmentId::from(request_id))
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
