/// Task completion model
///
/// A completion row asserts that a user finished a task. It is written even
/// when GitHub could not confirm the action, in which case the row is marked
/// `manual` and carries the failure kind plus a human-readable `proof`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_task_completions (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     proof TEXT,
///     manual BOOLEAN NOT NULL DEFAULT FALSE,
///     failure_kind VARCHAR(32),
///     UNIQUE (user_id, task_id)
/// );
/// ```

use crate::models::task::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why GitHub could not confirm a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// GitHub answered 403: the token lacks the needed OAuth scope
    PermissionDenied,

    /// GitHub answered 404: target missing or invisible to the user
    NotFound,

    /// Any other status or a transport failure
    RemoteError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::NotFound => "not_found",
            FailureKind::RemoteError => "remote_error",
        }
    }
}

impl FromStr for FailureKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permission_denied" => Ok(FailureKind::PermissionDenied),
            "not_found" => Ok(FailureKind::NotFound),
            "remote_error" => Ok(FailureKind::RemoteError),
            other => Err(UnknownVariant {
                kind: "failure kind",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskCompletion {
    pub id: i64,
    pub user_id: Uuid,
    pub task_id: i32,
    pub completed_at: DateTime<Utc>,
    pub proof: Option<String>,
    pub manual: bool,
    pub failure_kind: Option<String>,
}

impl UserTaskCompletion {
    /// Parsed failure kind, `None` for verified completions
    pub fn failure(&self) -> Option<FailureKind> {
        self.failure_kind.as_deref().and_then(|k| k.parse().ok())
    }
}

/// Input for recording a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCompletion {
    pub user_id: Uuid,
    pub task_id: i32,
    /// Set when GitHub did not confirm the action
    pub manual_reason: Option<ManualReason>,
}

/// Failure details stored with a manual completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualReason {
    pub kind: FailureKind,
    pub proof: String,
}

const COMPLETION_COLUMNS: &str =
    "id, user_id, task_id, completed_at, proof, manual, failure_kind";

impl UserTaskCompletion {
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        task_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserTaskCompletion>(&format!(
            "SELECT {COMPLETION_COLUMNS}
             FROM user_task_completions
             WHERE user_id = $1 AND task_id = $2"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Inserts the completion unless one already exists for (user, task)
    ///
    /// Returns `None` when a concurrent request won the race; the unique
    /// constraint guarantees a single row either way.
    pub async fn record(pool: &PgPool, data: RecordCompletion) -> Result<Option<Self>, sqlx::Error> {
        let (manual, failure_kind, proof) = match data.manual_reason {
            Some(reason) => (true, Some(reason.kind.as_str()), Some(reason.proof)),
            None => (false, None, None),
        };

        sqlx::query_as::<_, UserTaskCompletion>(&format!(
            "INSERT INTO user_task_completions (user_id, task_id, proof, manual, failure_kind)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, task_id) DO NOTHING
             RETURNING {COMPLETION_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(proof)
        .bind(manual)
        .bind(failure_kind)
        .fetch_optional(pool)
        .await
    }

    /// Ids of every task the user has a completion row for
    pub async fn completed_task_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT task_id FROM user_task_completions WHERE user_id = $1 ORDER BY task_id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_task_completions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}
