//! Triage decision engine.
//!
//! Maps a [`DecisionContext`] to ranked options, trade-offs, a primary
//! recommendation and an [`AutonomyLevel`] verdict. The workflow uses the
//! verdict to decide between creating the appointment right away and
//! parking the request for human approval.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::DecisionEngine;
pub use types::{
    AutonomyLevel, DecisionContext, DecisionOption, DecisionResult, DecisionWeight, Tradeoff,
    APPOINTMENT_PRIORITY_KIND,
};
