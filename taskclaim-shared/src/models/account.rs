/// OAuth account model (credential store)
///
/// The OAuth provider writes one row per linked provider. TaskClaim reads the
/// GitHub access token from here to act on the user's behalf.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     provider_id VARCHAR(50) NOT NULL,
///     account_id VARCHAR(255) NOT NULL,
///     access_token TEXT,
///     scope TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (user_id, provider_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Provider id under which GitHub accounts are stored
pub const GITHUB_PROVIDER: &str = "github";

#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: String,
    /// The user's id at the provider (GitHub numeric id as text)
    pub account_id: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Keeps access tokens out of logs.
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider_id", &self.provider_id)
            .field("account_id", &self.account_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Input for linking a provider account
#[derive(Debug, Clone)]
pub struct LinkAccount {
    pub user_id: Uuid,
    pub provider_id: String,
    pub account_id: String,
    pub access_token: Option<String>,
    pub scope: Option<String>,
}

impl Account {
    /// Creates or refreshes the account for (user, provider)
    pub async fn upsert(pool: &PgPool, data: LinkAccount) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, provider_id, account_id, access_token, scope)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, provider_id) DO UPDATE
            SET account_id = EXCLUDED.account_id,
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                updated_at = NOW()
            RETURNING id, user_id, provider_id, account_id, access_token, scope,
                      created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.provider_id)
        .bind(data.account_id)
        .bind(data.access_token)
        .bind(data.scope)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        provider_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, provider_id, account_id, access_token, scope,
                   created_at, updated_at
            FROM accounts
            WHERE user_id = $1 AND provider_id = $2
            "#,
        )
        .bind(user_id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Returns the user's GitHub access token, if one is stored
    ///
    /// A linked account with an empty or missing token counts as no credential.
    pub async fn github_token(pool: &PgPool, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let account = Self::find(pool, user_id, GITHUB_PROVIDER).await?;
        Ok(account
            .and_then(|a| a.access_token)
            .filter(|token| !token.is_empty()))
    }
}
