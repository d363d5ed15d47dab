/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskclaim_api::{app::{build_router, AppState}, config::Config};
/// use taskclaim_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::from_config(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{ApiConfig, Config},
    error::ApiError,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use taskclaim_shared::{
    auth::session::{bearer_token, validate_session_token, SessionUser},
    github::{GitHubClient, SocialGraph},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// GitHub access used to apply and verify tasks
    pub github: Arc<dyn SocialGraph>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, github: Arc<dyn SocialGraph>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            github,
        }
    }

    /// Creates state with a real GitHub client built from `config`
    pub fn from_config(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let github = GitHubClient::new(config.github_config())?;
        Ok(Self::new(db, config, Arc::new(github)))
    }

    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                      # Health check (public)
/// └── /api/                             # Session required
///     ├── GET  /tasks                   # Active tasks + completed ids
///     ├── GET  /tasks/status            # ... plus GitHub status per task
///     ├── POST /tasks/seed              # Bootstrap default catalog
///     ├── POST /tasks/:id/complete      # Complete one task
///     ├── GET  /payment-request         # Latest claim
///     └── POST /payment-request         # Submit claim
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (`/api` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let api_routes = Router::new()
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks/status", get(routes::tasks::task_status))
        .route("/tasks/seed", post(routes::tasks::seed_tasks))
        .route("/tasks/:id/complete", post(routes::tasks::complete_task))
        .route(
            "/payment-request",
            get(routes::payment::get_payment_request).post(routes::payment::submit_payment_request),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let cors = cors_layer(&state.config.api);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// `*` allows every origin. Otherwise only the listed origins, with credentials.
fn cors_layer(api: &ApiConfig) -> CorsLayer {
    if api.cors_origins.iter().any(|origin| origin == "*") {
        if api.production {
            tracing::warn!("CORS allows any origin in production");
        }
        return CorsLayer::permissive();
    }

    let allowed = api
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

/// Session authentication middleware layer
///
/// Validates the bearer session token and injects [`SessionUser`] into the
/// request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let claims = validate_session_token(token, state.session_secret())?;
    req.extensions_mut().insert(SessionUser::from(claims));

    Ok(next.run(req).await)
}
