/// GitHub integration
///
/// Tasks are performed and verified through four GitHub REST endpoints:
///
/// ```text
/// PUT /user/starred/{owner}/{repo}     star a repository
/// GET /user/starred/{owner}/{repo}     204 if starred, 404 if not
/// PUT /user/following/{username}       follow a user
/// GET /user/following/{username}       204 if following, 404 if not
/// ```
///
/// The [`SocialGraph`] trait is the seam between the workflow and the network,
/// so tests can swap in a scripted implementation.
///
/// # Modules
///
/// - [`client`]: `reqwest`-backed [`SocialGraph`] with explicit timeouts

pub mod client;

pub use client::{GitHubClient, GitHubConfig};

use async_trait::async_trait;

/// A GitHub action that a task maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction<'a> {
    /// Star the repository `owner/name`
    StarRepo(&'a str),

    /// Follow the user with this login
    FollowUser(&'a str),
}

impl RemoteAction<'_> {
    /// API path shared by the mutating and read-only calls
    pub fn path(&self) -> String {
        match self {
            RemoteAction::StarRepo(repo) => format!("/user/starred/{}", repo),
            RemoteAction::FollowUser(user) => format!("/user/following/{}", user),
        }
    }
}

/// Errors returned by GitHub calls
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// 403: the token lacks the OAuth scope for this call
    #[error("insufficient permissions")]
    PermissionDenied,

    /// 404: the target does not exist or is not visible to the user
    #[error("not found")]
    NotFound,

    /// Any other non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),
}

impl GitHubError {
    /// Maps a non-success HTTP status onto an error
    pub fn from_status(status: u16) -> Self {
        match status {
            403 => GitHubError::PermissionDenied,
            404 => GitHubError::NotFound,
            other => GitHubError::Status(other),
        }
    }
}

/// Remote authority for star and follow relationships
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Performs the action on behalf of the token's owner (PUT)
    async fn apply(&self, token: &str, action: RemoteAction<'_>) -> Result<(), GitHubError>;

    /// Reports whether the action is already in effect (GET)
    ///
    /// A 404 answer is a well-formed "no" and yields `Ok(false)`.
    async fn check(&self, token: &str, action: RemoteAction<'_>) -> Result<bool, GitHubError>;
}
