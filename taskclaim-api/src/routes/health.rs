/// Health check endpoint
///
/// Reports whether the server can reach the database and whether every
/// embedded migration has been applied.
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrations": "up_to_date"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskclaim_shared::db::{migrations::get_migration_status, pool::health_check as ping};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// `up_to_date`, `pending` or `unknown`
    pub migrations: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = ping(&state.db).await.is_ok();

    let migrations = if connected {
        match get_migration_status(&state.db).await {
            Ok(status) if status.is_up_to_date => "up_to_date",
            Ok(_) => "pending",
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read migration status");
                "unknown"
            }
        }
    } else {
        "unknown"
    };

    let healthy = connected && migrations == "up_to_date";

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations: migrations.to_string(),
    })
}
