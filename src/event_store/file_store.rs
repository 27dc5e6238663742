//! File-based event log.
//!
//! Stores published events as JSONL (one JSON object per line):
//! - Per-appointment sequence numbers assigned under an exclusive file lock
//! - At most one `Requested` per appointment; a second one is refused as
//!   `StoreError::AlreadyExists`
//! - Event type and version recorded from `cqrs_es::DomainEvent` and checked on load
//! - Appends flushed and synced before `publish` returns

use crate::domain::types::TimestampUtc;
use crate::domain::{Appointment, AppointmentEvent};
use crate::workflow::ports::{EventPublisher, StoreError};
use async_trait::async_trait;
use cqrs_es::DomainEvent;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// A stored event record in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub aggregate_id: String,
    pub sequence: u64,
    pub recorded_at: TimestampUtc,
    pub event_type: String,
    pub event_version: String,
    pub event: AppointmentEvent,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Append-only JSONL event log.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    /// Path to the JSONL event log file.
    pub log_path: PathBuf,
    /// Copied into every stored event.
    pub metadata: HashMap<String, String>,
}

impl FileEventLog {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Events recorded for one appointment, in sequence order.
    pub fn load_events(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>, StoreError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|stored| stored.aggregate_id == aggregate_id)
            .collect())
    }

    /// Every recorded event, in file order.
    pub fn load_all(&self) -> Result<Vec<StoredEvent>, StoreError> {
        let file = match File::open(&self.log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file)?;

        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let stored: StoredEvent = serde_json::from_str(&line)?;
            if stored.event_type != stored.event.event_type()
                || stored.event_version != stored.event.event_version()
            {
                return Err(StoreError::Corrupt {
                    message: format!(
                        "event {}#{} has mismatched type/version ({} v{})",
                        stored.aggregate_id,
                        stored.sequence,
                        stored.event_type,
                        stored.event_version
                    ),
                });
            }
            events.push(stored);
        }
        Ok(events)
    }

    /// Rebuilds an appointment from its recorded events. Rejections recorded
    /// before the appointment was opened are skipped. `None` when no
    /// appointment was ever opened under this id.
    pub fn replay(&self, aggregate_id: &str) -> Result<Option<Appointment>, StoreError> {
        let events: Vec<AppointmentEvent> = self
            .load_events(aggregate_id)?
            .into_iter()
            .map(|stored| stored.event)
            .skip_while(|event| matches!(event, AppointmentEvent::DecisionRejected { .. }))
            .collect();
        if events.is_empty() {
            return Ok(None);
        }
        Appointment::replay(&events)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                message: format!("cannot replay {}: {}", aggregate_id, e),
            })
    }

    fn append(&self, event: &AppointmentEvent) -> Result<StoredEvent, StoreError> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)?;
        FileExt::lock_exclusive(&file)?;

        let aggregate_id = event.appointment_id().to_string();
        let stream = read_stream(&file, &aggregate_id)?;
        if stream.opened && matches!(event, AppointmentEvent::Requested { .. }) {
            return Err(StoreError::AlreadyExists { id: aggregate_id });
        }

        let record = StoredEvent {
            sequence: stream.last_sequence + 1,
            aggregate_id,
            recorded_at: TimestampUtc::now(),
            event_type: event.event_type(),
            event_version: event.event_version(),
            event: event.clone(),
            metadata: self.metadata.clone(),
        };

        let line = serde_json::to_string(&record)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        file.sync_all()?;
        Ok(record)
    }
}

#[async_trait]
impl EventPublisher for FileEventLog {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), StoreError> {
        let record = self.append(event)?;
        tracing::debug!(
            "Recorded {} #{} for {}",
            record.event_type,
            record.sequence,
            record.aggregate_id
        );
        Ok(())
    }
}

/// What the log already holds for one aggregate.
#[derive(Debug, Default)]
struct StreamState {
    last_sequence: u64,
    opened: bool,
}

/// Scan the log file for an aggregate's last sequence number and whether its
/// `Requested` event is already recorded.
fn read_stream(file: &File, aggregate_id: &str) -> Result<StreamState, StoreError> {
    let mut reader = BufReader::new(file.try_clone()?);
    reader.seek(SeekFrom::Start(0))?;

    let mut state = StreamState::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let stored: StoredEvent = serde_json::from_str(&line)?;
        if stored.aggregate_id == aggregate_id {
            state.last_sequence = stored.sequence;
            state.opened |= matches!(stored.event, AppointmentEvent::Requested { .. });
        }
    }
    Ok(state)
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
