/// Eligibility gate
///
/// A user may claim the reward once every currently active task has a
/// completion row, manual or not. Completions of tasks that were later
/// deactivated are ignored, and tasks added later must be completed too.

use super::WorkflowResult;
use crate::models::completion::UserTaskCompletion;
use crate::models::task::Task;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// True if every id in `active` appears in `completed`
///
/// An empty active set is trivially covered.
pub fn covers_all(active: &[i32], completed: &[i32]) -> bool {
    let completed: HashSet<i32> = completed.iter().copied().collect();
    active.iter().all(|id| completed.contains(id))
}

/// Whether `user_id` has completed all active tasks
pub async fn is_eligible(pool: &PgPool, user_id: Uuid) -> WorkflowResult<bool> {
    let active = Task::active_ids(pool).await?;
    let completed = UserTaskCompletion::completed_task_ids(pool, user_id).await?;

    let eligible = covers_all(&active, &completed);
    debug!(
        %user_id,
        active = active.len(),
        completed = completed.len(),
        eligible,
        "Evaluated eligibility"
    );

    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_active_completed() {
        assert!(covers_all(&[1, 2, 3], &[3, 1, 2]));
    }

    #[test]
    fn test_missing_task_blocks() {
        assert!(!covers_all(&[1, 2, 3], &[1, 2]));
        assert!(!covers_all(&[1], &[]));
    }

    #[test]
    fn test_completions_of_inactive_tasks_are_ignored() {
        // Task 4 was deactivated after being completed
        assert!(covers_all(&[1, 2], &[1, 2, 4]));
        assert!(!covers_all(&[1, 2], &[1, 4]));
    }

    #[test]
    fn test_no_active_tasks_is_eligible() {
        assert!(covers_all(&[], &[]));
        assert!(covers_all(&[], &[7]));
    }
}
