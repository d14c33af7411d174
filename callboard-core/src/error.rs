//! Error types for CALLBOARD operations

use thiserror::Error;

/// Failures talking to the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Session expired or missing, please log in again")]
    Unauthorized,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Backend(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}

/// Input rejected before anything is sent to the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Enter at least one contact with a name and phone number")]
    NoValidRows,

    #[error("Select at least one contact")]
    NothingSelected,

    #[error("Open a project first")]
    NoActiveProject,

    #[error("Search group {0} has no members")]
    EmptyGroup(String),
}

/// Master error type for the core crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallboardError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type BackendResult<T> = Result<T, BackendError>;

pub type CallboardResult<T> = Result<T, CallboardError>;
