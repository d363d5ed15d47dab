/// Payment request manager
///
/// One reward claim per user may be pending at a time. A claim can only be
/// submitted once the eligibility gate passes; paid or rejected claims do not
/// block a new one.

use super::eligibility::is_eligible;
use super::{FieldError, WorkflowError, WorkflowResult};
use crate::models::payment_request::{
    is_pending_conflict, NewPaymentRequest, PaymentMethod, PaymentRequest,
};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::info;
use uuid::Uuid;

static MOBILE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[0-9]{10}$").expect("mobile number pattern is valid"));

const REQUIRED: &str = "All fields are required";

/// An 11 digit mobile number with a leading zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub fn parse(value: &str) -> Option<Self> {
        MOBILE_NUMBER
            .is_match(value)
            .then(|| MobileNumber(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw claim as submitted by the client
#[derive(Debug, Clone, Default)]
pub struct PaymentSubmission {
    pub mobile_number: String,
    pub payment_method: String,
    pub github_id: String,
}

/// A submission whose fields have all been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub mobile_number: MobileNumber,
    pub payment_method: PaymentMethod,
    pub github_id: String,
}

impl PaymentSubmission {
    /// Checks presence, mobile number format and payment method
    ///
    /// Every problem is reported, not just the first.
    pub fn validate(&self) -> Result<ValidSubmission, WorkflowError> {
        let mut errors = Vec::new();

        let fields = [
            ("mobileNumber", self.mobile_number.as_str()),
            ("paymentMethod", self.payment_method.as_str()),
            ("githubId", self.github_id.as_str()),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, REQUIRED));
            }
        }
        if !errors.is_empty() {
            return Err(WorkflowError::Validation(errors));
        }

        let mobile_number = MobileNumber::parse(&self.mobile_number);
        if mobile_number.is_none() {
            errors.push(FieldError::new("mobileNumber", "Invalid mobile number format"));
        }

        let payment_method = self.payment_method.parse::<PaymentMethod>().ok();
        if payment_method.is_none() {
            errors.push(FieldError::new("paymentMethod", "Invalid payment method"));
        }

        match (mobile_number, payment_method) {
            (Some(mobile_number), Some(payment_method)) => Ok(ValidSubmission {
                mobile_number,
                payment_method,
                github_id: self.github_id.trim().to_string(),
            }),
            _ => Err(WorkflowError::Validation(errors)),
        }
    }
}

/// Submits a reward claim for `user_id`
///
/// # Errors
///
/// - [`WorkflowError::Validation`] on malformed input, before any query runs
/// - [`WorkflowError::NotEligible`] if an active task is not completed
/// - [`WorkflowError::Conflict`] if a pending claim already exists
pub async fn submit_payment_request(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    submission: &PaymentSubmission,
) -> WorkflowResult<PaymentRequest> {
    let valid = submission.validate()?;

    if !is_eligible(pool, user_id).await? {
        return Err(WorkflowError::NotEligible(
            "You must complete all tasks before submitting a payment request".to_string(),
        ));
    }

    if PaymentRequest::find_pending(pool, user_id).await?.is_some() {
        return Err(pending_conflict());
    }

    let request = PaymentRequest::create(
        pool,
        NewPaymentRequest {
            user_id,
            mobile_number: valid.mobile_number.into_inner(),
            payment_method: valid.payment_method,
            github_id: valid.github_id,
        },
    )
    .await
    .map_err(|err| {
        if is_pending_conflict(&err) {
            pending_conflict()
        } else {
            WorkflowError::Database(err)
        }
    })?;

    info!(
        %user_id,
        payment_request_id = request.id,
        payment_method = %request.payment_method,
        "Payment request submitted"
    );

    Ok(request)
}

/// The user's most recent claim, if any
pub async fn payment_status(
    pool: &sqlx::PgPool,
    user_id: Uuid,
) -> WorkflowResult<Option<PaymentRequest>> {
    Ok(PaymentRequest::latest_for_user(pool, user_id).await?)
}

fn pending_conflict() -> WorkflowError {
    WorkflowError::Conflict("You already have a pending payment request".to_string())
}
