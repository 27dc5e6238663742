//! Domain model for event-sourced appointment state.
//!
//! # Architecture
//!
//! - **History** (`history.rs`): append-only state and priority logs
//! - **Aggregate** (`appointment.rs`): validated construction and value-returning operations
//! - **Events** (`events.rs`): facts emitted by those operations
//!
//! Operations never mutate the receiver; they return an [`AppointmentChange`]
//! carrying the new instance and its events, which the workflow publishes.

pub mod appointment;
pub mod errors;
pub mod events;
pub mod history;
pub mod services;
pub mod types;

pub use appointment::{Appointment, AppointmentChange, AppointmentDraft, AppointmentRecord};
pub use errors::DomainError;
pub use events::AppointmentEvent;
pub use history::{HistoryLog, HistoryRecord, PriorityRecord, StateRecord};
pub use services::{Clock, ManualClock, SystemClock};
pub use types::{
    AppointmentId, AppointmentState, PatientId, PriorityLevel, PriorityOrigin, Specialty,
    TimestampUtc,
};
