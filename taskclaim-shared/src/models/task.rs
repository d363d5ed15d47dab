/// Task catalog model and database operations
///
/// A task is one GitHub action every user must perform before they can claim
/// a reward. Only two kinds exist: starring a repository and following a
/// user. Rows are written once by the seed operation; afterwards only
/// `is_active` changes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id SERIAL PRIMARY KEY,
///     task_type VARCHAR(10) NOT NULL,        -- 'repo' | 'user'
///     target VARCHAR(255) NOT NULL,          -- "owner/repo" or "username"
///     description TEXT NOT NULL,
///     action VARCHAR(10) NOT NULL,           -- 'star' | 'follow'
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK ((task_type = 'repo' AND action = 'star')
///         OR (task_type = 'user' AND action = 'follow'))
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskclaim_shared::models::task::Task;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// for task in Task::list_active(&pool).await? {
///     println!("{} {} {}", task.id, task.action, task.target);
/// }
/// # Ok(())
/// # }
/// ```

use crate::github::RemoteAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Returned when a stored or submitted value is not a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// What a task targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// A repository, identified as `owner/name`
    Repo,

    /// A user, identified by login
    User,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Repo => "repo",
            TaskType::User => "user",
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repo" => Ok(TaskType::Repo),
            "user" => Ok(TaskType::User),
            other => Err(UnknownVariant {
                kind: "task type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TaskType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user has to do to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    Star,
    Follow,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Star => "star",
            TaskAction::Follow => "follow",
        }
    }
}

impl FromStr for TaskAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "star" => Ok(TaskAction::Star),
            "follow" => Ok(TaskAction::Follow),
            other => Err(UnknownVariant {
                kind: "task action",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TaskAction {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required action in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,

    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub task_type: TaskType,

    /// `owner/repo` for repositories, the login for users
    pub target: String,

    pub description: String,

    #[sqlx(try_from = "String")]
    pub action: TaskAction,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// The GitHub call that performs or checks this task
    ///
    /// `None` for a type/action pair that has no GitHub equivalent. The schema
    /// rejects such rows, so this only happens if the constraint was bypassed.
    pub fn remote_action(&self) -> Option<RemoteAction<'_>> {
        match (self.task_type, self.action) {
            (TaskType::Repo, TaskAction::Star) => Some(RemoteAction::StarRepo(&self.target)),
            (TaskType::User, TaskAction::Follow) => Some(RemoteAction::FollowUser(&self.target)),
            _ => None,
        }
    }
}

/// Input for adding a task to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_type: TaskType,
    pub target: String,
    pub description: String,
    pub action: TaskAction,
}

/// Result of a seed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The catalog already had rows; nothing was written
    AlreadySeeded { existing: i64 },

    /// The catalog was empty and this many tasks were inserted
    Inserted { count: usize },
}

// Arbitrary key shared by every process seeding the same database.
const SEED_LOCK_KEY: i64 = 0x7461_736b_636c_6169;

const TASK_COLUMNS: &str =
    "id, task_type, target, description, action, is_active, created_at, updated_at";

impl Task {
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (task_type, target, description, action)
             VALUES ($1, $2, $3, $4)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.task_type.as_str())
        .bind(data.target)
        .bind(data.description)
        .bind(data.action.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists active tasks in catalog order
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE is_active = TRUE ORDER BY id"
        ))
        .fetch_all(pool)
        .await
    }

    /// Ids of every active task
    pub async fn active_ids(pool: &PgPool) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM tasks WHERE is_active = TRUE ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Toggles whether a task is required
    pub async fn set_active(
        pool: &PgPool,
        id: i32,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Inserts `tasks` only if the catalog is empty
    ///
    /// Runs under a transaction-scoped advisory lock so two concurrent seeds
    /// cannot both observe an empty table.
    pub async fn seed_if_empty(pool: &PgPool, tasks: &[NewTask]) -> Result<SeedOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SEED_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&mut *tx)
            .await?;

        if existing > 0 {
            tx.rollback().await?;
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }

        for task in tasks {
            sqlx::query(
                "INSERT INTO tasks (task_type, target, description, action)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(task.task_type.as_str())
            .bind(&task.target)
            .bind(&task.description)
            .bind(task.action.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(count = tasks.len(), "Seeded task catalog");
        Ok(SeedOutcome::Inserted { count: tasks.len() })
    }

    /// Deletes a task and, by cascade, its completions
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
