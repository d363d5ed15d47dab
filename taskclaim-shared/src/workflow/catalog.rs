/// Default task catalog
///
/// The catalog is bootstrapped once through the seed endpoint. Seeding is a
/// no-op when any task already exists, including deactivated ones.

use super::WorkflowResult;
use crate::models::task::{NewTask, SeedOutcome, Task, TaskAction, TaskType};
use serde::Serialize;
use sqlx::PgPool;

/// The tasks every user has to complete
pub fn default_catalog() -> Vec<NewTask> {
    vec![
        NewTask {
            task_type: TaskType::Repo,
            target: "w3cj/next-start".to_string(),
            description: "Star the main repository".to_string(),
            action: TaskAction::Star,
        },
        NewTask {
            task_type: TaskType::Repo,
            target: "w3cj/youtube-face-enhancer".to_string(),
            description: "Star the YouTube face enhancer repository".to_string(),
            action: TaskAction::Star,
        },
        NewTask {
            task_type: TaskType::User,
            target: "agentellisense".to_string(),
            description: "Follow the user".to_string(),
            action: TaskAction::Follow,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub success: bool,
    pub message: String,
    pub count: i64,
}

impl From<SeedOutcome> for SeedReport {
    fn from(outcome: SeedOutcome) -> Self {
        match outcome {
            SeedOutcome::AlreadySeeded { existing } => SeedReport {
                success: true,
                message: "Tasks already exist".to_string(),
                count: existing,
            },
            SeedOutcome::Inserted { count } => SeedReport {
                success: true,
                message: "Default tasks added successfully".to_string(),
                count: count as i64,
            },
        }
    }
}

/// Inserts the default catalog if the task table is empty
pub async fn seed_catalog(pool: &PgPool) -> WorkflowResult<SeedReport> {
    let outcome = Task::seed_if_empty(pool, &default_catalog()).await?;
    Ok(outcome.into())
}
