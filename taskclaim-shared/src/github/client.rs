/// GitHub REST client
///
/// Thin wrapper over `reqwest` that issues the star/follow calls with the
/// user's OAuth token. Every request carries an overall timeout and a connect
/// timeout so a hung GitHub call cannot pin a request handler.
///
/// # Example
///
/// ```no_run
/// use taskclaim_shared::github::{GitHubClient, GitHubConfig, RemoteAction, SocialGraph};
///
/// # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let client = GitHubClient::new(GitHubConfig::default())?;
/// let starred = client.check(token, RemoteAction::StarRepo("w3cj/next-start")).await?;
/// if !starred {
///     client.apply(token, RemoteAction::StarRepo("w3cj/next-start")).await?;
/// }
/// # Ok(())
/// # }
/// ```

use super::{GitHubError, RemoteAction, SocialGraph};
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Media type requested from the GitHub API
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Base URL, without trailing slash
    pub api_url: String,

    /// GitHub rejects requests without a User-Agent
    pub user_agent: String,

    /// Upper bound for a whole request, including the response body
    pub timeout: Duration,

    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: "Task-App".to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// `reqwest`-backed [`SocialGraph`]
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
}

impl GitHubClient {
    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GITHUB_ACCEPT));

        let http = Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GitHubError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(
        &self,
        method: Method,
        token: &str,
        action: RemoteAction<'_>,
    ) -> Result<StatusCode, GitHubError> {
        let url = format!("{}{}", self.api_url, action.path());
        debug!(%method, %url, "Calling GitHub");

        let mut request = self.http.request(method.clone(), &url).bearer_auth(token);
        if method == Method::PUT {
            request = request.header(header::CONTENT_LENGTH, "0");
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Transport(e.to_string()))?;

        Ok(response.status())
    }
}

#[async_trait]
impl SocialGraph for GitHubClient {
    async fn apply(&self, token: &str, action: RemoteAction<'_>) -> Result<(), GitHubError> {
        let status = self.send(Method::PUT, token, action).await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(GitHubError::from_status(status.as_u16()))
        }
    }

    async fn check(&self, token: &str, action: RemoteAction<'_>) -> Result<bool, GitHubError> {
        let status = self.send(Method::GET, token, action).await?;

        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(GitHubError::from_status(status.as_u16()))
        }
    }
}
