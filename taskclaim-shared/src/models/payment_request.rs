/// Payment request model and database operations
///
/// A payment request is a user's claim for the reward after finishing every
/// task. A user holds at most one `pending` request at a time; a partial
/// unique index enforces it even under concurrent submissions.
///
/// # State Machine
///
/// ```text
/// pending → verified → paid
///         ↘          ↘
///           rejected   rejected
/// pending → paid
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payment_requests (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     mobile_number VARCHAR(11) NOT NULL,
///     payment_method VARCHAR(20) NOT NULL,
///     github_id VARCHAR(255) NOT NULL,
///     status VARCHAR(20) NOT NULL DEFAULT 'pending',
///     admin_notes TEXT,
///     requested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     verified_at TIMESTAMPTZ,
///     paid_at TIMESTAMPTZ,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX payment_requests_one_pending_per_user
///     ON payment_requests (user_id) WHERE status = 'pending';
/// ```

use crate::models::task::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the partial unique index guarding the single-pending invariant
pub const ONE_PENDING_INDEX: &str = "payment_requests_one_pending_per_user";

/// Review status of a payment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Submitted, waiting for review
    Pending,

    /// Task completion confirmed by an administrator
    Verified,

    /// Reward sent
    Paid,

    /// Claim refused
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Rejected)
    }

    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Verified)
                | (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Rejected)
                | (PaymentStatus::Verified, PaymentStatus::Paid)
                | (PaymentStatus::Verified, PaymentStatus::Rejected)
        )
    }

    /// Statuses from which `self` can be reached
    fn sources(&self) -> Vec<&'static str> {
        [
            PaymentStatus::Pending,
            PaymentStatus::Verified,
            PaymentStatus::Paid,
            PaymentStatus::Rejected,
        ]
        .into_iter()
        .filter(|from| from.can_transition_to(*self))
        .map(|from| from.as_str())
        .collect()
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "verified" => Ok(PaymentStatus::Verified),
            "paid" => Ok(PaymentStatus::Paid),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(UnknownVariant {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mobile operators and wallets a reward can be paid through
///
/// Wire names are case-sensitive (`bKash`, not `BKash`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "GP")]
    Gp,
    #[serde(rename = "BL")]
    Bl,
    Robi,
    Airtel,
    Teletalk,
    #[serde(rename = "bKash")]
    BKash,
    Nagad,
    Rocket,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 8] = [
        PaymentMethod::Gp,
        PaymentMethod::Bl,
        PaymentMethod::Robi,
        PaymentMethod::Airtel,
        PaymentMethod::Teletalk,
        PaymentMethod::BKash,
        PaymentMethod::Nagad,
        PaymentMethod::Rocket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gp => "GP",
            PaymentMethod::Bl => "BL",
            PaymentMethod::Robi => "Robi",
            PaymentMethod::Airtel => "Airtel",
            PaymentMethod::Teletalk => "Teletalk",
            PaymentMethod::BKash => "bKash",
            PaymentMethod::Nagad => "Nagad",
            PaymentMethod::Rocket => "Rocket",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "payment method",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub id: i64,

    #[serde(skip_serializing)]
    pub user_id: Uuid,

    pub mobile_number: String,

    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,

    /// GitHub login the user claims, checked by reviewers
    pub github_id: String,

    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,

    pub admin_notes: Option<String>,

    pub requested_at: DateTime<Utc>,

    pub verified_at: Option<DateTime<Utc>>,

    pub paid_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

/// Input for a new pending request; values are already validated
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub user_id: Uuid,
    pub mobile_number: String,
    pub payment_method: PaymentMethod,
    pub github_id: String,
}

const PAYMENT_COLUMNS: &str = "id, user_id, mobile_number, payment_method, github_id, status, \
     admin_notes, requested_at, verified_at, paid_at, updated_at";

impl PaymentRequest {
    /// Inserts a `pending` request stamped with the current time
    ///
    /// Fails with a unique violation on [`ONE_PENDING_INDEX`] when the user
    /// already has a pending request; see [`is_pending_conflict`].
    pub async fn create(pool: &PgPool, data: NewPaymentRequest) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, PaymentRequest>(&format!(
            "INSERT INTO payment_requests
                 (user_id, mobile_number, payment_method, github_id, status, requested_at, updated_at)
             VALUES ($1, $2, $3, $4, 'pending', $5, $5)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.mobile_number)
        .bind(data.payment_method.as_str())
        .bind(data.github_id)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_pending(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(&format!(
            "SELECT {PAYMENT_COLUMNS}
             FROM payment_requests
             WHERE user_id = $1 AND status = 'pending'"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The user's most recently submitted request
    pub async fn latest_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(&format!(
            "SELECT {PAYMENT_COLUMNS}
             FROM payment_requests
             WHERE user_id = $1
             ORDER BY requested_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Moves a request to `target`, stamping `verified_at` / `paid_at`
    ///
    /// Returns `None` if the request does not exist or its current status
    /// cannot reach `target`. Passing `admin_notes = None` keeps existing notes.
    pub async fn transition(
        pool: &PgPool,
        id: i64,
        target: PaymentStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sources = target.sources();
        if sources.is_empty() {
            return Ok(None);
        }

        sqlx::query_as::<_, PaymentRequest>(&format!(
            "UPDATE payment_requests
             SET status = $2,
                 admin_notes = COALESCE($3, admin_notes),
                 verified_at = CASE WHEN $2 = 'verified' THEN NOW() ELSE verified_at END,
                 paid_at = CASE WHEN $2 = 'paid' THEN NOW() ELSE paid_at END,
                 updated_at = NOW()
             WHERE id = $1 AND status = ANY($4)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(target.as_str())
        .bind(admin_notes)
        .bind(sources)
        .fetch_optional(pool)
        .await
    }
}

/// True if `err` is the unique violation raised by a second pending request
pub fn is_pending_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(ONE_PENDING_INDEX),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_accepts_only_wire_names() {
        assert_eq!("bKash".parse::<PaymentMethod>(), Ok(PaymentMethod::BKash));
        assert_eq!("GP".parse::<PaymentMethod>(), Ok(PaymentMethod::Gp));
        assert_eq!("Teletalk".parse::<PaymentMethod>(), Ok(PaymentMethod::Teletalk));

        assert!("Foo".parse::<PaymentMethod>().is_err());
        assert!("bkash".parse::<PaymentMethod>().is_err());
        assert!("gp".parse::<PaymentMethod>().is_err());
        assert!("".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde_matches_as_str() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_value(method).unwrap();
            assert_eq!(json, method.as_str());
        }
    }

    #[test]
    fn test_status_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Verified));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Rejected));
        assert!(PaymentStatus::Verified.can_transition_to(PaymentStatus::Paid));

        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Rejected.can_transition_to(PaymentStatus::Verified));
        assert!(!PaymentStatus::Verified.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn test_transition_sources() {
        assert_eq!(PaymentStatus::Verified.sources(), vec!["pending"]);
        assert_eq!(PaymentStatus::Paid.sources(), vec!["pending", "verified"]);
        assert!(PaymentStatus::Pending.sources().is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Verified.is_terminal());
    }

    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        assert!(!is_pending_conflict(&sqlx::Error::RowNotFound));
    }
}
