//! Typed error hierarchy for the board client.
//!
//! - `ClientError`: one call against the REST API
//! - `StoreError`: a `BoardStore` operation
//!
//! Server-side request failures are mapped by `server::api::ApiError`;
//! request-body validation uses `ValidationError` from the common crate.

use thiserror::Error;

pub use taskboard_common::ValidationError;

/// Errors from a single REST API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend unreachable, timed out, or answered with a 5xx.
    #[error("Backend unavailable: {0}")]
    Transport(String),

    /// The backend answered with a 4xx and a message.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the local fallback applies to this failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Errors from a `BoardStore` operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No project selected")]
    NoProjectSelected,

    #[error("Project {id} not found")]
    ProjectNotFound { id: String },

    #[error("Task {id} not found")]
    TaskNotFound { id: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}
