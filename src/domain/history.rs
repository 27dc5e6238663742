//! Append-only history logs backing the appointment's state and priority.
//!
//! A log is an immutable, strictly time-ordered sequence of records. Adding a
//! record produces a new log; the original is left untouched, so every earlier
//! snapshot of the aggregate stays reachable.

use crate::domain::errors::DomainError;
use crate::domain::types::{AppointmentState, PriorityLevel, PriorityOrigin, TimestampUtc};
use serde::{Deserialize, Serialize};

/// An entry that can be stored in a [`HistoryLog`].
pub trait HistoryRecord: Clone {
    type Value: Copy + PartialEq;

    fn occurred_at(&self) -> TimestampUtc;

    fn value(&self) -> Self::Value;

    /// Checks record-level invariants. Called before a record enters a log.
    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// State history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: AppointmentState,
    pub occurred_at: TimestampUtc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causing_event_id: Option<String>,
}

impl StateRecord {
    pub fn new(state: AppointmentState, occurred_at: TimestampUtc) -> Self {
        Self {
            state,
            occurred_at,
            causing_event_id: None,
        }
    }
}

impl HistoryRecord for StateRecord {
    type Value = AppointmentState;

    fn occurred_at(&self) -> TimestampUtc {
        self.occurred_at
    }

    fn value(&self) -> AppointmentState {
        self.state
    }
}

/// Priority history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRecord {
    pub priority: PriorityLevel,
    pub origin: PriorityOrigin,
    pub occurred_at: TimestampUtc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causing_event_id: Option<String>,
}

impl PriorityRecord {
    /// A priority assigned by the decision engine.
    pub fn system(priority: PriorityLevel, occurred_at: TimestampUtc) -> Self {
        Self {
            priority,
            origin: PriorityOrigin::System,
            occurred_at,
            justification: None,
            modified_by: None,
            causing_event_id: None,
        }
    }

    /// A priority set by a person. Both provenance fields are mandatory.
    pub fn human(
        priority: PriorityLevel,
        justification: &str,
        modified_by: &str,
        occurred_at: TimestampUtc,
    ) -> Result<Self, DomainError> {
        let record = Self {
            priority,
            origin: PriorityOrigin::Human,
            occurred_at,
            justification: Some(justification.trim().to_string()),
            modified_by: Some(modified_by.trim().to_string()),
            causing_event_id: None,
        };
        record.validate()?;
        Ok(record)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl HistoryRecord for PriorityRecord {
    type Value = PriorityLevel;

    fn occurred_at(&self) -> TimestampUtc {
        self.occurred_at
    }

    fn value(&self) -> PriorityLevel {
        self.priority
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.origin == PriorityOrigin::Human {
            if is_blank(&self.justification) {
                return Err(DomainError::validation(
                    "a human priority change requires a justification",
                ));
            }
            if is_blank(&self.modified_by) {
                return Err(DomainError::validation(
                    "a human priority change requires the author (modified_by)",
                ));
            }
        }
        Ok(())
    }
}

/// Immutable, strictly time-ordered collection of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog<R> {
    records: Vec<R>,
}

pub type StateHistory = HistoryLog<StateRecord>;
pub type PriorityHistory = HistoryLog<PriorityRecord>;

impl<R: HistoryRecord> HistoryLog<R> {
    /// Builds a log from records that must already be in chronological order.
    pub fn from_records(records: Vec<R>) -> Result<Self, DomainError> {
        for record in &records {
            record.validate()?;
        }
        for pair in records.windows(2) {
            check_order(&pair[0], &pair[1])?;
        }
        Ok(Self { records })
    }

    /// A log holding a single record.
    pub fn seeded(record: R) -> Result<Self, DomainError> {
        Self::from_records(vec![record])
    }

    /// Returns a new log with `record` appended. `self` is not modified.
    pub fn append(&self, record: R) -> Result<Self, DomainError> {
        record.validate()?;
        if let Some(last) = self.records.last() {
            check_order(last, &record)?;
        }
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.extend(self.records.iter().cloned());
        records.push(record);
        Ok(Self { records })
    }

    /// The latest record.
    pub fn latest(&self) -> Result<&R, DomainError> {
        self.records.last().ok_or(DomainError::EmptyHistory)
    }

    /// The value of the latest record.
    pub fn current(&self) -> Result<R::Value, DomainError> {
        self.latest().map(HistoryRecord::value)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_order<R: HistoryRecord>(previous: &R, next: &R) -> Result<(), DomainError> {
    let (prev_at, next_at) = (previous.occurred_at(), next.occurred_at());
    if next_at == prev_at {
        return Err(DomainError::HistoryOrder {
            message: format!("two entries share the timestamp {}", next_at),
        });
    }
    if next_at < prev_at {
        return Err(DomainError::HistoryOrder {
            message: format!("entry at {} precedes the entry at {}", next_at, prev_at),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
