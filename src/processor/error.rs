//! Error types for script processing

use std::error::Error as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status reported when the caller cancelled the run
pub const STATUS_CLIENT_CLOSED_REQUEST: u16 = 499;
/// Status reported for any other failure that aborts a run
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Errors that abort a whole script run
///
/// Failures of individual statements never surface here, they are reported
/// inline as statement outcomes.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Reading the input stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The cancellation token fired
    #[error("Request was canceled")]
    Cancelled,
}

impl ProcessError {
    /// Status code for the run as a whole
    pub fn status_code(&self) -> u16 {
        match self {
            ProcessError::Cancelled => STATUS_CLIENT_CLOSED_REQUEST,
            ProcessError::Io(_) => STATUS_INTERNAL_ERROR,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ProcessError::Cancelled => "Request was canceled".to_string(),
            ProcessError::Io(_) => "Failed to process SQL queries. Please try again later.".to_string(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ProcessError::Io(_) => "IoError",
            ProcessError::Cancelled => "Cancelled",
        }
    }

    /// Structured report describing this failure
    ///
    /// `context` names the operation that was running, e.g. the input path.
    pub fn to_error_report(&self, context: impl Into<String>) -> ErrorReport {
        ErrorReport {
            exception_type: self.type_name().to_string(),
            message: self.user_message(),
            details: ErrorDetails {
                message_exception: self.to_string(),
                inner_exception: self.source().map(|source| source.to_string()),
                error_context_type: context.into(),
            },
        }
    }
}

/// Serializable description of a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub exception_type: String,
    pub message: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub message_exception: String,
    pub inner_exception: Option<String>,
    pub error_context_type: String,
}
