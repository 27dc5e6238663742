//! Storage adapters for the scheduling workflow.
//!
//! - `memory`: lock-protected maps, for tests and dry runs
//! - `file_store`: JSONL event log with replay
//! - `json_repo`: one JSON document per appointment or pending decision

pub mod file_store;
pub mod json_repo;
pub mod memory;

pub use file_store::{FileEventLog, StoredEvent};
pub use json_repo::{FileAppointmentRepository, FilePendingDecisionRepository};
pub use memory::{InMemoryAppointments, InMemoryEventLog, InMemoryPendingDecisions};
