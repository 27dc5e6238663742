//! Requests awaiting evaluation and decisions awaiting a reviewer.

use crate::decision::{
    AutonomyLevel, DecisionContext, DecisionResult, DecisionWeight, APPOINTMENT_PRIORITY_KIND,
};
use crate::domain::{
    AppointmentId, DomainError, PatientId, PriorityLevel, Specialty, TimestampUtc,
};
use serde::{Deserialize, Serialize};

/// Metadata key under which the original request is kept in the context.
pub const REQUEST_METADATA_KEY: &str = "request";

/// A scheduling request. Its id becomes the id of the appointment it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub request_id: AppointmentId,
    pub patient_id: PatientId,
    pub specialty: Specialty,
    pub scheduled_at: TimestampUtc,
    pub reason: String,
    pub age: f64,
    pub wait_days: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<DecisionWeight>,
}

impl AppointmentRequest {
    /// Packages the request for the decision engine. The request itself is
    /// kept in the metadata so the context alone is enough to resume later.
    pub fn to_context(
        &self,
        default_weight: DecisionWeight,
    ) -> Result<DecisionContext, DomainError> {
        let snapshot = serde_json::to_value(self)
            .map_err(|e| DomainError::validation(format!("request is not serializable: {}", e)))?;
        Ok(DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
            .with_data("reason", self.reason.as_str())
            .with_data("age", self.age)
            .with_data("waitDays", self.wait_days)
            .with_weight(self.weight.unwrap_or(default_weight))
            .with_metadata(REQUEST_METADATA_KEY, snapshot))
    }

    /// Recovers the request stored by [`AppointmentRequest::to_context`].
    pub fn from_context(context: &DecisionContext) -> Result<Self, DomainError> {
        let snapshot = context.metadata.get(REQUEST_METADATA_KEY).ok_or_else(|| {
            DomainError::validation("decision context carries no request metadata")
        })?;
        serde_json::from_value(snapshot.clone())
            .map_err(|e| DomainError::validation(format!("request metadata is malformed: {}", e)))
    }
}

/// A decision parked until a person approves or rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDecision {
    pub id: String,
    pub context: DecisionContext,
    pub result: DecisionResult,
    pub autonomy_level: AutonomyLevel,
    pub reason: String,
    pub created_at: TimestampUtc,
}

impl PendingDecision {
    /// Parks `result` for review. The id is `pending-{requestId}-{millis}`.
    pub fn new(
        request_id: &AppointmentId,
        context: DecisionContext,
        result: DecisionResult,
        created_at: TimestampUtc,
    ) -> Result<Self, DomainError> {
        let reason = result
            .review_reason
            .clone()
            .unwrap_or_else(|| format!("decision requires approval ({})", result.autonomy_level));
        let decision = Self {
            id: format!("pending-{}-{}", request_id, created_at.timestamp_millis()),
            autonomy_level: result.autonomy_level,
            context,
            result,
            reason,
            created_at,
        };
        decision.validate()?;
        Ok(decision)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::validation(
                "pending decision id must not be empty",
            ));
        }
        if self.reason.trim().is_empty() {
            return Err(DomainError::validation(
                "pending decision reason must not be empty",
            ));
        }
        Ok(())
    }

    pub fn request(&self) -> Result<AppointmentRequest, DomainError> {
        AppointmentRequest::from_context(&self.context)
    }

    /// The priority the engine recommended, if it recommended one.
    pub fn recommended_priority(&self) -> Option<PriorityLevel> {
        self.result
            .primary_recommendation
            .as_ref()
            .and_then(|option| option.value.parse().ok())
    }
}
