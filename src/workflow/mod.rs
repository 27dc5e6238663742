//! Pending-decision workflow.
//!
//! - **Ports** (`ports.rs`): repository and publisher traits the use cases depend on
//! - **Pending** (`pending.rs`): the request shape and parked decisions
//! - **Outcome** (`outcome.rs`): typed failures and the `{ok, ...}` response envelope
//! - **Service** (`service.rs`): the use cases themselves

pub mod outcome;
pub mod pending;
pub mod ports;
pub mod service;

pub use outcome::{Response, UseCaseFailure};
pub use pending::{AppointmentRequest, PendingDecision};
pub use ports::{
    AppointmentFilter, AppointmentRepository, EventPublisher, PendingDecisionRepository, StoreError,
};
pub use service::{RequestOutcome, Rescheduling, SchedulingWorkflow};
