//! Capability interfaces the scheduling workflow depends on.
//!
//! Adapters live in `event_store`. The workflow only ever talks to these
//! traits, so tests can run against the in-memory implementations.

use crate::domain::{Appointment, AppointmentEvent, AppointmentId, AppointmentState, PatientId};
use crate::workflow::pending::PendingDecision;
use async_trait::async_trait;
use std::fmt::{Display, Formatter};

/// Errors reported by repository and publisher adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No entity with the given id.
    NotFound { id: String },
    /// An insert-only write found an entity with the same id.
    AlreadyExists { id: String },
    /// The id cannot address an entity in this store.
    InvalidId { id: String },
    /// Persisted data could not be decoded or failed validation on load.
    Corrupt { message: String },
    /// The backing medium failed.
    Io { message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { id } => write!(f, "not found: {}", id),
            StoreError::AlreadyExists { id } => write!(f, "already exists: {}", id),
            StoreError::InvalidId { id } => write!(f, "invalid id: '{}'", id),
            StoreError::Corrupt { message } => write!(f, "corrupt data: {}", message),
            StoreError::Io { message } => write!(f, "storage i/o error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt {
            message: err.to_string(),
        }
    }
}

/// Optional filters for listing appointments. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub patient_id: Option<PatientId>,
    pub state: Option<AppointmentState>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id
            .as_ref()
            .is_none_or(|patient| appointment.patient_id() == patient)
            && self
                .state
                .is_none_or(|state| appointment.current_state() == state)
    }
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, StoreError>;

    /// Inserts or replaces by id.
    async fn save(&self, appointment: &Appointment) -> Result<(), StoreError>;

    /// Inserts only. Returns [`StoreError::AlreadyExists`] if the id is taken;
    /// at most one concurrent `create` for an id succeeds.
    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError>;

    /// Appointments matching `filter`, ordered by id.
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;
}

#[async_trait]
pub trait PendingDecisionRepository: Send + Sync {
    async fn save(&self, decision: &PendingDecision) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingDecision>, StoreError>;

    /// Removes the decision. Deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// All pending decisions, oldest first.
    async fn list(&self) -> Result<Vec<PendingDecision>, StoreError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers one event. Must complete or fail before returning.
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), StoreError>;
}
