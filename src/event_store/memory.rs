//! In-memory adapters. Used by tests and for dry runs of the CLI.

use crate::domain::{Appointment, AppointmentEvent, AppointmentId};
use crate::workflow::ports::{
    AppointmentFilter, AppointmentRepository, EventPublisher, PendingDecisionRepository, StoreError,
};
use crate::workflow::PendingDecision;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryAppointments {
    entries: RwLock<BTreeMap<AppointmentId, Appointment>>,
}

impl InMemoryAppointments {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointments {
    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, StoreError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn save(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(appointment.id().clone(), appointment.clone());
        Ok(())
    }

    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(appointment.id()) {
            return Err(StoreError::AlreadyExists {
                id: appointment.id().to_string(),
            });
        }
        entries.insert(appointment.id().clone(), appointment.clone());
        Ok(())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPendingDecisions {
    entries: RwLock<BTreeMap<String, PendingDecision>>,
}

impl InMemoryPendingDecisions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingDecisionRepository for InMemoryPendingDecisions {
    async fn save(&self, decision: &PendingDecision) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(decision.id.clone(), decision.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingDecision>, StoreError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PendingDecision>, StoreError> {
        let mut decisions: Vec<PendingDecision> =
            self.entries.read().await.values().cloned().collect();
        decisions.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(decisions)
    }
}

/// Publisher that keeps every event in memory, in publication order. Like the
/// file log, it refuses a second `Requested` for the same appointment.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<AppointmentEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AppointmentEvent> {
        self.events.read().await.clone()
    }

    pub async fn events_for(&self, id: &AppointmentId) -> Vec<AppointmentEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|event| event.appointment_id() == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventLog {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        if matches!(event, AppointmentEvent::Requested { .. })
            && events.iter().any(|recorded| {
                matches!(recorded, AppointmentEvent::Requested { .. })
                    && recorded.appointment_id() == event.appointment_id()
            })
        {
            return Err(StoreError::AlreadyExists {
                id: event.appointment_id().to_string(),
            });
        }
        events.push(event.clone());
        Ok(())
    }
}
