/// Completion recorder
///
/// Marks a task done for a user by performing the GitHub action with their
/// token. If GitHub refuses or fails, the completion is still recorded, but
/// flagged as manual with the failure kind and a readable proof string. Users
/// are never blocked by GitHub outages or missing OAuth scopes; reviewers see
/// which completions were not confirmed.
///
/// Exactly one row exists per (user, task) no matter how often or how
/// concurrently this runs.

use super::{WorkflowError, WorkflowResult};
use crate::github::{GitHubError, RemoteAction, SocialGraph};
use crate::models::account::Account;
use crate::models::completion::{FailureKind, ManualReason, RecordCompletion, UserTaskCompletion};
use crate::models::task::Task;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a completion attempt, as reported to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub success: bool,

    pub message: String,

    /// True when GitHub did not confirm the action
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub manual: bool,

    /// Why GitHub did not confirm, for manual completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl CompletionReport {
    pub fn already_completed() -> Self {
        Self {
            success: true,
            message: "Task already completed".to_string(),
            manual: false,
            failure: None,
        }
    }

    fn verified(action: RemoteAction<'_>) -> Self {
        let message = match action {
            RemoteAction::StarRepo(repo) => format!("Successfully starred {}", repo),
            RemoteAction::FollowUser(user) => format!("Successfully followed {}", user),
        };

        Self {
            success: true,
            message,
            manual: false,
            failure: None,
        }
    }

    fn manual(kind: FailureKind, reason: &str) -> Self {
        Self {
            success: true,
            message: format!(
                "Task marked as completed manually. GitHub API error: {}",
                reason
            ),
            manual: true,
            failure: Some(kind),
        }
    }
}

/// Classifies a failed GitHub call and phrases it for the user
pub fn describe_failure(action: RemoteAction<'_>, err: &GitHubError) -> (FailureKind, String) {
    match err {
        GitHubError::PermissionDenied => (
            FailureKind::PermissionDenied,
            "Insufficient permissions. Please check your GitHub OAuth scopes.".to_string(),
        ),
        GitHubError::NotFound => {
            let reason = match action {
                RemoteAction::StarRepo(_) => "Repository not found or you don't have access to it.",
                RemoteAction::FollowUser(_) => "User not found.",
            };
            (FailureKind::NotFound, reason.to_string())
        }
        GitHubError::Status(status) => {
            (FailureKind::RemoteError, format!("GitHub API error: {}", status))
        }
        GitHubError::Transport(_) => {
            let reason = match action {
                RemoteAction::StarRepo(_) => "Failed to star repository",
                RemoteAction::FollowUser(_) => "Failed to follow user",
            };
            (FailureKind::RemoteError, reason.to_string())
        }
    }
}

/// Proof text stored with a manual completion
pub fn manual_proof(reason: &str) -> String {
    format!("Manual completion - GitHub API error: {}", reason)
}

/// Turns the outcome of the GitHub call into what gets stored and reported
fn resolve(
    action: RemoteAction<'_>,
    outcome: Result<(), GitHubError>,
) -> (Option<ManualReason>, CompletionReport) {
    match outcome {
        Ok(()) => (None, CompletionReport::verified(action)),
        Err(err) => {
            let (kind, reason) = describe_failure(action, &err);
            let stored = ManualReason {
                kind,
                proof: manual_proof(&reason),
            };
            (Some(stored), CompletionReport::manual(kind, &reason))
        }
    }
}

/// Records that `user_id` completed `task_id`
///
/// # Errors
///
/// - [`WorkflowError::NotFound`] if the task does not exist
/// - [`WorkflowError::InvalidState`] if the user has no GitHub token, or the
///   task's type/action pair has no GitHub equivalent
/// - [`WorkflowError::Database`] on query failure
pub async fn complete_task(
    pool: &PgPool,
    github: &dyn SocialGraph,
    user_id: Uuid,
    task_id: i32,
) -> WorkflowResult<CompletionReport> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Task not found".to_string()))?;

    if UserTaskCompletion::find(pool, user_id, task_id).await?.is_some() {
        return Ok(CompletionReport::already_completed());
    }

    let token = Account::github_token(pool, user_id)
        .await?
        .ok_or_else(|| WorkflowError::InvalidState("GitHub access token not found".to_string()))?;

    let action = task.remote_action().ok_or_else(|| {
        WorkflowError::InvalidState(format!(
            "Task {} has unsupported type/action {}/{}",
            task.id, task.task_type, task.action
        ))
    })?;

    let outcome = github.apply(&token, action).await;
    if let Err(err) = &outcome {
        warn!(task_id, %user_id, error = %err, "GitHub call failed, recording manual completion");
    }

    let (manual_reason, report) = resolve(action, outcome);

    let recorded = UserTaskCompletion::record(
        pool,
        RecordCompletion {
            user_id,
            task_id,
            manual_reason,
        },
    )
    .await?;

    match recorded {
        Some(completion) => {
            info!(
                task_id,
                %user_id,
                manual = completion.manual,
                "Recorded task completion"
            );
            Ok(report)
        }
        // A concurrent request inserted first.
        None => Ok(CompletionReport::already_completed()),
    }
}
