/// Payment request endpoints
///
/// # Endpoints
///
/// - `GET /api/payment-request` - The user's latest claim
/// - `POST /api/payment-request` - Submit a claim

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskclaim_shared::{
    auth::session::SessionUser,
    models::payment_request::PaymentRequest,
    workflow::payment::{self, PaymentSubmission},
};
use validator::Validate;

/// Submit request body
///
/// Missing fields deserialize as empty strings so they are reported as
/// validation errors rather than as a JSON rejection.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitPaymentRequest {
    #[validate(length(min = 1, message = "All fields are required"))]
    pub mobile_number: String,

    #[validate(length(min = 1, message = "All fields are required"))]
    pub payment_method: String,

    #[validate(length(min = 1, message = "All fields are required"))]
    pub github_id: String,
}

impl From<SubmitPaymentRequest> for PaymentSubmission {
    fn from(req: SubmitPaymentRequest) -> Self {
        PaymentSubmission {
            mobile_number: req.mobile_number,
            payment_method: req.payment_method,
            github_id: req.github_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitPaymentResponse {
    pub success: bool,

    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub has_payment_request: bool,

    pub payment_request: Option<PaymentRequest>,
}

pub async fn get_payment_request(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<PaymentStatusResponse>> {
    let payment_request = payment::payment_status(&state.db, user.id).await?;

    Ok(Json(PaymentStatusResponse {
        has_payment_request: payment_request.is_some(),
        payment_request,
    }))
}

/// Submits a reward claim
///
/// # Errors
///
/// - `400 Bad Request`: validation failure, tasks incomplete, or a claim is
///   already pending
pub async fn submit_payment_request(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<SubmitPaymentRequest>,
) -> ApiResult<Json<SubmitPaymentResponse>> {
    req.validate()?;

    let submission = PaymentSubmission::from(req);
    payment::submit_payment_request(&state.db, user.id, &submission).await?;

    Ok(Json(SubmitPaymentResponse {
        success: true,
        message: "Payment request submitted successfully".to_string(),
    }))
}
