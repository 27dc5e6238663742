//! Strongly typed domain primitives for the appointment aggregate.
//!
//! These newtypes keep identifiers, timestamps and the two value enums
//! (state and priority) from being mixed up across the domain model.

use crate::domain::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the value is empty or whitespace only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identity of an appointment. Used as the aggregate id in the event log.
    AppointmentId
);

impl AppointmentId {
    /// Creates a new random appointment ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// ASCII letters, digits, `-`, `_` and `.`, not starting with `.`.
    /// Ids are also used as storage file names.
    pub fn is_well_formed(&self) -> bool {
        is_token(&self.0)
    }
}

/// True for a non-empty run of ASCII letters, digits, `-`, `_` and `.` that
/// does not start with `.`.
pub fn is_token(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

string_id!(
    /// Identity of the patient the appointment belongs to.
    PatientId
);

string_id!(
    /// Medical specialty the appointment is booked with.
    Specialty
);

/// UTC timestamp for records and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampUtc(pub DateTime<Utc>);

impl TimestampUtc {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parses an RFC3339 timestamp and normalizes it to UTC.
    pub fn parse_rfc3339(s: &str) -> Result<Self, DomainError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| DomainError::Validation {
                message: format!("invalid timestamp '{}': {}", s, e),
            })
    }

    /// Returns the timestamp as an RFC3339 string.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl From<DateTime<Utc>> for TimestampUtc {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Display for TimestampUtc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentState {
    Requested,
    Confirmed,
    Rescheduled,
    Cancelled,
    Attended,
    NoShow,
}

impl AppointmentState {
    pub const ALL: [AppointmentState; 6] = [
        AppointmentState::Requested,
        AppointmentState::Confirmed,
        AppointmentState::Rescheduled,
        AppointmentState::Cancelled,
        AppointmentState::Attended,
        AppointmentState::NoShow,
    ];

    /// States reachable from this one in a single transition.
    pub fn allowed_targets(&self) -> &'static [AppointmentState] {
        use AppointmentState::*;
        match self {
            Requested => &[Confirmed, Cancelled],
            Confirmed => &[Rescheduled, Cancelled, Attended, NoShow],
            Rescheduled => &[Confirmed, Cancelled],
            Cancelled | Attended | NoShow => &[],
        }
    }

    pub fn can_transition_to(&self, target: AppointmentState) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentState::Requested => "requested",
            AppointmentState::Confirmed => "confirmed",
            AppointmentState::Rescheduled => "rescheduled",
            AppointmentState::Cancelled => "cancelled",
            AppointmentState::Attended => "attended",
            AppointmentState::NoShow => "no_show",
        }
    }
}

impl Display for AppointmentState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AppointmentState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        AppointmentState::ALL
            .into_iter()
            .find(|state| matches_label(state.label(), &normalized))
            .ok_or_else(|| DomainError::Validation {
                message: format!("unknown appointment state '{}'", s),
            })
    }
}

/// `no_show` also matches `noshow`.
fn matches_label(label: &str, input: &str) -> bool {
    label == input || label.replace('_', "") == input
}

/// Triage priority of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 3] = [
        PriorityLevel::High,
        PriorityLevel::Medium,
        PriorityLevel::Low,
    ];

    /// One step more urgent, saturating at High.
    pub fn escalated(&self) -> Self {
        match self {
            PriorityLevel::Low => PriorityLevel::Medium,
            PriorityLevel::Medium | PriorityLevel::High => PriorityLevel::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::High => "High",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::Low => "Low",
        }
    }
}

impl Display for PriorityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for PriorityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(PriorityLevel::High),
            "medium" => Ok(PriorityLevel::Medium),
            "low" => Ok(PriorityLevel::Low),
            _ => Err(DomainError::Validation {
                message: format!("priority must be one of High, Medium, Low (got '{}')", s),
            }),
        }
    }
}

/// Who produced a priority value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityOrigin {
    System,
    Human,
}
