use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TIP-3 root exit code raised when the sender is not the root owner.
pub const EXIT_NOT_OWNER: i32 = 1000;
/// TIP-3 wallet exit code raised when a call claims the wrong root owner.
pub const EXIT_WRONG_ROOT_OWNER: i32 = 1001;

/// Errors surfaced by the deployment / mint / query layer.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token not found at address: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Authorization rejected: {0}")]
    AuthorizationRejected(String),

    #[error("Settlement not observed within {timeout_secs}s; transaction outcome unknown")]
    Timeout { timeout_secs: u64 },

    #[error("Broadcast interrupted; transaction outcome unknown: {0}")]
    OutcomeUnknown(String),

    #[error("Execution failed (exit code {exit_code:?}): {message}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Malformed chain response: {0}")]
    Decode(String),
}

/// Classification of errors for logging and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caller supplied bad input.
    Validation,
    /// Address has no deployed contract.
    NotFound,
    /// Chain unreachable or returned garbage.
    Backend,
    /// The acting wallet lacks on-chain permission.
    Authorization,
    /// Transaction fate unknown.
    Timeout,
    /// The contract reverted.
    Execution,
}

impl TokenError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::BackendUnavailable(_) | Self::Decode(_) => ErrorCategory::Backend,
            Self::AuthorizationRejected(_) => ErrorCategory::Authorization,
            Self::Timeout { .. } | Self::OutcomeUnknown(_) => ErrorCategory::Timeout,
            Self::ExecutionFailed { .. } => ErrorCategory::Execution,
        }
    }

    /// Only transport failures may be retried, and only for reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    /// Returns a user-friendly message (hides transport internals).
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Invalid request: {msg}"),
            Self::NotFound(addr) => format!("Token not found at address: {addr}"),
            Self::BackendUnavailable(_) => "Chain backend unavailable. Try again later.".into(),
            Self::AuthorizationRejected(msg) => format!("Not permitted: {msg}"),
            Self::Timeout { .. } => {
                "Transaction sent but not yet confirmed. Check the explorer before retrying."
                    .into()
            }
            Self::OutcomeUnknown(_) => {
                "Transaction may have been sent but its outcome is unknown. Check the explorer before retrying."
                    .into()
            }
            Self::ExecutionFailed { message, .. } => format!("Contract call failed: {message}"),
            Self::Decode(_) => "Unexpected response from the chain.".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution failure classification
// ---------------------------------------------------------------------------

/// Message fragments that indicate the acting wallet lacks permission.
const AUTHORIZATION_PATTERNS: &[&str] = &[
    "not owner",
    "not_owner",
    "permission denied",
    "unauthorized",
    "wrong root owner",
];

/// Classify a reverted live call as either an authorization failure or a
/// generic execution failure, by exit code first and message pattern second.
pub fn classify_execution_failure(exit_code: Option<i32>, message: &str) -> TokenError {
    let lower = message.to_lowercase();
    let by_code = matches!(exit_code, Some(EXIT_NOT_OWNER | EXIT_WRONG_ROOT_OWNER));
    let by_message = AUTHORIZATION_PATTERNS.iter().any(|p| lower.contains(p));

    if by_code || by_message {
        TokenError::AuthorizationRejected(message.to_string())
    } else {
        TokenError::ExecutionFailed {
            exit_code,
            message: message.to_string(),
        }
    }
}
