/// Task completion and reward claim workflow
///
/// ```text
/// status    ──> verifier::check_status      (GitHub GET per task, best effort)
/// complete  ──> completion::complete_task   (GitHub PUT, manual fallback)
/// submit    ──> eligibility::is_eligible ──> payment::submit_payment_request
/// ```
///
/// Every operation takes its collaborators (pool, GitHub client) as
/// arguments; nothing here holds global state.
///
/// # Modules
///
/// - [`catalog`]: Default task catalog and the idempotent seed
/// - [`completion`]: Completion recorder
/// - [`verifier`]: Remote verifier
/// - [`eligibility`]: Eligibility gate
/// - [`payment`]: Payment request manager

pub mod catalog;
pub mod completion;
pub mod eligibility;
pub mod payment;
pub mod verifier;

use serde::Serialize;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors surfaced by workflow operations
///
/// GitHub failures never appear here: the recorder turns them into manual
/// completions and the verifier into negative statuses.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Preconditions outside the request are not met (e.g. no GitHub token)
    #[error("{0}")]
    InvalidState(String),

    /// Malformed input; detected before any database access
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Not every active task has been completed
    #[error("{0}")]
    NotEligible(String),

    /// A pending payment request already exists
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
