//! Workflow error types.

use thiserror::Error;

/// Failure of a single release API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{operation}: unexpected status {status}: {message}")]
    Status {
        /// The API operation.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The request never got a usable answer.
    #[error("{operation}: {message}")]
    Transport {
        /// The API operation.
        operation: String,
        /// What went wrong.
        message: String,
    },

    /// A local file could not be read.
    #[error("{operation}: {source}")]
    Io {
        /// The API operation.
        operation: String,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl ApiError {
    /// Whether the failure is a gateway error worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { status: 502..=504, .. })
    }

    /// Whether the server reported a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Result type for release API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of an action's forward step.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A release API call failed.
    #[error("{action}: {cause}")]
    Api {
        /// The failing action.
        action: &'static str,
        /// The API failure.
        cause: ApiError,
    },

    /// The action cannot run in the current state.
    #[error("{action}: {reason}")]
    Precondition {
        /// The failing action.
        action: &'static str,
        /// What is missing.
        reason: String,
    },
}

impl ActionError {
    /// Whether running the actions again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { cause, .. } => cause.is_retryable(),
            Self::Precondition { .. } => false,
        }
    }
}

/// Result type for action steps.
pub type ActionResult<T> = Result<T, ActionError>;

/// Failure to compensate an applied action.
///
/// Every variant leaves a remote resource an operator must fix by hand.
#[derive(Debug, Error)]
pub enum UndoError {
    /// The compensating call failed.
    #[error("removing {resource} failed: {cause}")]
    Failed {
        /// The resource left behind.
        resource: String,
        /// The API failure.
        cause: ApiError,
    },

    /// A patched description could not be put back.
    #[error("restoring the description of tag {tag} failed: {cause}")]
    DescriptionNotRestored {
        /// The tag whose description was patched.
        tag: String,
        /// The text to put back.
        original: String,
        /// The API failure.
        cause: ApiError,
    },

    /// The operation has no compensating call.
    #[error("{resource} cannot be rolled back")]
    Irreversible {
        /// The resource left behind.
        resource: String,
    },
}

/// Terminal failure of [`Workflow::apply`](crate::Workflow::apply).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An action failed and the applied actions were rolled back.
    #[error("workflow failed after {attempts} attempt(s): {cause}")]
    Failed {
        /// The error of the last attempt.
        cause: ActionError,
        /// Whether the last error was retryable.
        retryable: bool,
        /// Number of passes over the action list.
        attempts: u32,
        /// Compensations that did not succeed.
        rollback_failures: Vec<UndoError>,
    },
}

impl WorkflowError {
    /// Compensations that need manual intervention.
    #[must_use]
    pub fn rollback_failures(&self) -> &[UndoError] {
        match self {
            Self::Failed {
                rollback_failures, ..
            } => rollback_failures,
        }
    }
}

/// Result type for workflow runs.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
