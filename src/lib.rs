//! Appointment triage: a decision engine that prioritizes scheduling requests,
//! an event-sourced appointment aggregate, and a workflow that holds risky
//! decisions for human approval.

pub mod app;
pub mod config;
pub mod decision;
pub mod domain;
pub mod event_store;
pub mod structured_logger;
pub mod triage_paths;
pub mod workflow;
