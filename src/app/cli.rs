use crate::decision::DecisionWeight;
use crate::domain::{AppointmentState, PriorityLevel, TimestampUtc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "Appointment triage with human review of risky decisions")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file (defaults to the embedded triage.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root (overrides config and TRIAGE_HOME)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Inputs of a priority decision.
#[derive(Debug, Clone, clap::Args)]
pub struct TriageInputs {
    /// Free-text reason for the visit
    #[arg(long)]
    pub reason: String,

    /// Patient age in years
    #[arg(long, allow_negative_numbers = true)]
    pub age: f64,

    /// Days the patient has already waited
    #[arg(long, allow_negative_numbers = true)]
    pub wait_days: f64,

    /// low, medium or high (defaults to the configured weight)
    #[arg(long)]
    pub weight: Option<DecisionWeight>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the decision engine without storing anything
    Evaluate {
        #[command(flatten)]
        inputs: TriageInputs,
    },

    /// Request an appointment; it is created now or parked for review
    Request {
        /// Request id, also the id of the resulting appointment (default: random)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        patient: String,

        #[arg(long)]
        specialty: String,

        /// Appointment time, RFC 3339
        #[arg(long, value_parser = parse_timestamp)]
        at: TimestampUtc,

        #[command(flatten)]
        inputs: TriageInputs,
    },

    /// Approve a pending decision
    Approve { pending_id: String },

    /// Reject a pending decision
    Reject {
        pending_id: String,

        /// Reviewer name
        #[arg(long)]
        by: String,

        #[arg(long)]
        reason: String,
    },

    /// Close a confirmed appointment and open a new one at another time
    Reschedule {
        id: String,

        /// New appointment time, RFC 3339
        #[arg(long, value_parser = parse_timestamp)]
        at: TimestampUtc,

        /// Id for the new appointment (default: random)
        #[arg(long)]
        successor: Option<String>,
    },

    /// Move an appointment to another state
    Transition {
        id: String,

        /// requested, confirmed, rescheduled, cancelled, attended or no_show
        #[arg(long)]
        to: AppointmentState,
    },

    /// Cancel an appointment
    Cancel { id: String },

    /// Replace the priority of an appointment
    OverridePriority {
        id: String,

        #[arg(long)]
        priority: PriorityLevel,

        #[arg(long)]
        justification: String,

        /// Reviewer name
        #[arg(long)]
        by: String,
    },

    /// List appointments
    List {
        #[arg(long)]
        patient: Option<String>,

        #[arg(long)]
        state: Option<AppointmentState>,
    },

    /// List pending decisions
    Pending,

    /// Rebuild an appointment from the event log
    History { id: String },
}

impl Command {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Evaluate { .. } => "evaluate",
            Command::Request { .. } => "request",
            Command::Approve { .. } => "approve",
            Command::Reject { .. } => "reject",
            Command::Reschedule { .. } => "reschedule",
            Command::Transition { .. } => "transition",
            Command::Cancel { .. } => "cancel",
            Command::OverridePriority { .. } => "override-priority",
            Command::List { .. } => "list",
            Command::Pending => "pending",
            Command::History { .. } => "history",
        }
    }
}

fn parse_timestamp(s: &str) -> Result<TimestampUtc, String> {
    TimestampUtc::parse_rfc3339(s).map_err(|e| e.to_string())
}
