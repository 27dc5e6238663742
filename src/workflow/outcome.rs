//! Typed results returned across the workflow boundary.

use crate::domain::DomainError;
use crate::workflow::ports::StoreError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Why a use case did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseCaseFailure {
    /// The referenced appointment or pending decision does not exist.
    NotFound { message: String },
    /// The entity exists but the operation is not allowed in its current state.
    InvalidState { message: String },
    /// The decision was already materialized into an appointment.
    AlreadyApproved { message: String },
    /// Malformed input or a violated construction invariant.
    Validation { message: String },
    /// Anything else, including adapter failures.
    Unexpected { message: String },
}

impl UseCaseFailure {
    /// Stable machine-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            UseCaseFailure::NotFound { .. } => "not_found",
            UseCaseFailure::InvalidState { .. } => "invalid_state",
            UseCaseFailure::AlreadyApproved { .. } => "already_approved",
            UseCaseFailure::Validation { .. } => "validation_error",
            UseCaseFailure::Unexpected { .. } => "error",
        }
    }

    /// HTTP-equivalent status code.
    pub fn status(&self) -> u16 {
        match self {
            UseCaseFailure::NotFound { .. } => 404,
            UseCaseFailure::InvalidState { .. } | UseCaseFailure::Validation { .. } => 400,
            UseCaseFailure::AlreadyApproved { .. } => 409,
            UseCaseFailure::Unexpected { .. } => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UseCaseFailure::NotFound { message }
            | UseCaseFailure::InvalidState { message }
            | UseCaseFailure::AlreadyApproved { message }
            | UseCaseFailure::Validation { message }
            | UseCaseFailure::Unexpected { message } => message,
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub(crate) fn already_approved(message: impl Into<String>) -> Self {
        Self::AlreadyApproved {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl Display for UseCaseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.tag(), self.message())
    }
}

impl std::error::Error for UseCaseFailure {}

impl From<DomainError> for UseCaseFailure {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        if err.is_state_rule() {
            UseCaseFailure::InvalidState { message }
        } else {
            UseCaseFailure::Validation { message }
        }
    }
}

impl From<StoreError> for UseCaseFailure {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => UseCaseFailure::NotFound { message },
            StoreError::InvalidId { .. } => UseCaseFailure::Validation { message },
            StoreError::AlreadyExists { .. }
            | StoreError::Corrupt { .. }
            | StoreError::Io { .. } => UseCaseFailure::Unexpected { message },
        }
    }
}

/// Tagged result rendered to callers: `{ok: true, value}` or
/// `{ok: false, error, tag, status}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Success {
        ok: bool,
        value: T,
    },
    Failure {
        ok: bool,
        error: String,
        tag: &'static str,
        status: u16,
    },
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

impl<T> From<Result<T, UseCaseFailure>> for Response<T> {
    fn from(result: Result<T, UseCaseFailure>) -> Self {
        match result {
            Ok(value) => Response::Success { ok: true, value },
            Err(failure) => Response::Failure {
                ok: false,
                error: failure.message().to_string(),
                tag: failure.tag(),
                status: failure.status(),
            },
        }
    }
}
