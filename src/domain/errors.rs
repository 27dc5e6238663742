//! Error types for the appointment domain.

use std::fmt::{Display, Formatter};

/// Errors raised when an aggregate or value object invariant is violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing construction parameter.
    Validation { message: String },
    /// State transition not present in the transition table.
    InvalidTransition { message: String },
    /// Requested change would leave the value as it is.
    Unchanged { message: String },
    /// History entry out of order or sharing a timestamp with another entry.
    HistoryOrder { message: String },
    /// Current value read from a log with no entries.
    EmptyHistory,
}

impl DomainError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for violations of the state rules, as opposed to malformed input.
    pub fn is_state_rule(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::Unchanged { .. }
        )
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "validation error: {}", message),
            Self::InvalidTransition { message } => write!(f, "invalid transition: {}", message),
            Self::Unchanged { message } => write!(f, "no change: {}", message),
            Self::HistoryOrder { message } => write!(f, "history order violated: {}", message),
            Self::EmptyHistory => write!(f, "history log is empty"),
        }
    }
}

impl std::error::Error for DomainError {}
