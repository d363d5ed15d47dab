/// Remote verifier
///
/// Asks GitHub whether each active task is already in effect for the user.
/// Checks run concurrently and fail independently: a task whose check errors
/// is reported as not done and the rest of the batch is unaffected.

use crate::github::{RemoteAction, SocialGraph};
use crate::models::task::Task;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// GitHub's view of one task
///
/// Serializes as `{"starred": bool}` for repositories and
/// `{"followed": bool}` for users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoteStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed: Option<bool>,
}

impl RemoteStatus {
    pub fn new(action: RemoteAction<'_>, done: bool) -> Self {
        match action {
            RemoteAction::StarRepo(_) => Self {
                starred: Some(done),
                followed: None,
            },
            RemoteAction::FollowUser(_) => Self {
                starred: None,
                followed: Some(done),
            },
        }
    }

    pub fn is_done(&self) -> bool {
        self.starred.or(self.followed).unwrap_or(false)
    }
}

/// Task id → GitHub status
pub type StatusMap = BTreeMap<i32, RemoteStatus>;

/// Checks every active task against GitHub
///
/// Without a token there is nothing to ask, and the map is empty. Tasks whose
/// type/action pair has no GitHub equivalent are left out.
pub async fn check_status(github: &dyn SocialGraph, tasks: &[Task], token: Option<&str>) -> StatusMap {
    let Some(token) = token else {
        debug!("No GitHub token, skipping remote verification");
        return StatusMap::new();
    };

    let checks = tasks.iter().filter(|task| task.is_active).filter_map(|task| {
        let Some(action) = task.remote_action() else {
            warn!(task_id = task.id, "Task has no GitHub equivalent, skipping");
            return None;
        };

        Some(async move {
            let done = match github.check(token, action).await {
                Ok(done) => done,
                Err(err) => {
                    warn!(task_id = task.id, error = %err, "GitHub status check failed, assuming not done");
                    false
                }
            };
            (task.id, RemoteStatus::new(action, done))
        })
    });

    join_all(checks).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubError;
    use crate::models::task::{TaskAction, TaskType};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by target name: `yes*` → true, `no*` → 404, `err*` → 500,
    /// `denied*` → 403, anything else → transport failure.
    #[derive(Default)]
    struct ScriptedGraph {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SocialGraph for ScriptedGraph {
        async fn apply(&self, _token: &str, _action: RemoteAction<'_>) -> Result<(), GitHubError> {
            unreachable!("status checks never mutate")
        }

        async fn check(&self, _token: &str, action: RemoteAction<'_>) -> Result<bool, GitHubError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let target = match action {
                RemoteAction::StarRepo(t) | RemoteAction::FollowUser(t) => t,
            };
            if target.starts_with("yes") {
                Ok(true)
            } else if target.starts_with("no") {
                Ok(false)
            } else if target.starts_with("err") {
                Err(GitHubError::Status(500))
            } else if target.starts_with("denied") {
                Err(GitHubError::PermissionDenied)
            } else {
                Err(GitHubError::Transport("connection reset".to_string()))
            }
        }
    }

    fn task(id: i32, task_type: TaskType, action: TaskAction, target: &str, is_active: bool) -> Task {
        Task {
            id,
            task_type,
            target: target.to_string(),
            description: String::new(),
            action,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_token_yields_empty_map() {
        let graph = ScriptedGraph::default();
        let tasks = vec![task(1, TaskType::Repo, TaskAction::Star, "yes/repo", true)];

        let map = check_status(&graph, &tasks, None).await;

        assert!(map.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_statuses_per_task_kind() {
        let graph = ScriptedGraph::default();
        let tasks = vec![
            task(1, TaskType::Repo, TaskAction::Star, "yes/repo", true),
            task(2, TaskType::Repo, TaskAction::Star, "no/repo", true),
            task(3, TaskType::User, TaskAction::Follow, "yes-user", true),
        ];

        let map = check_status(&graph, &tasks, Some("token")).await;

        assert_eq!(map[&1], RemoteStatus { starred: Some(true), followed: None });
        assert_eq!(map[&2], RemoteStatus { starred: Some(false), followed: None });
        assert_eq!(map[&3], RemoteStatus { starred: None, followed: Some(true) });
    }

    #[tokio::test]
    async fn test_failing_check_does_not_affect_others() {
        let graph = ScriptedGraph::default();
        let tasks = vec![
            task(1, TaskType::Repo, TaskAction::Star, "err/repo", true),
            task(2, TaskType::Repo, TaskAction::Star, "yes/repo", true),
            task(3, TaskType::User, TaskAction::Follow, "denied", true),
            task(4, TaskType::User, TaskAction::Follow, "flaky", true),
        ];

        let map = check_status(&graph, &tasks, Some("token")).await;

        assert_eq!(map.len(), 4);
        assert!(!map[&1].is_done());
        assert!(map[&2].is_done());
        assert_eq!(map[&3], RemoteStatus { starred: None, followed: Some(false) });
        assert!(!map[&4].is_done());
    }

    #[tokio::test]
    async fn test_inactive_and_unsupported_tasks_are_skipped() {
        let graph = ScriptedGraph::default();
        let tasks = vec![
            task(1, TaskType::Repo, TaskAction::Star, "yes/repo", false),
            task(2, TaskType::User, TaskAction::Star, "yes-user", true),
            task(3, TaskType::User, TaskAction::Follow, "yes-user", true),
        ];

        let map = check_status(&graph, &tasks, Some("token")).await;

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(RemoteStatus::new(RemoteAction::StarRepo("a/b"), true)).unwrap();
        assert_eq!(json, serde_json::json!({ "starred": true }));

        let json = serde_json::to_value(RemoteStatus::new(RemoteAction::FollowUser("a"), false)).unwrap();
        assert_eq!(json, serde_json::json!({ "followed": false }));
    }
}
