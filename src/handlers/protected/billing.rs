// handlers/protected/billing.rs - the caller's payment details
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::database::models::{PaymentDetails, ValidationError};
use crate::error::ApiError;
use crate::handlers::require_account;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// GET /api/billing
pub async fn billing_get(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Json<PaymentDetails>, ApiError> {
    let account = require_account(&state, &profile).await?;
    state
        .repos
        .billing
        .find_by_created_by_id(account.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no payment details on file"))
}

/// POST /api/billing - one row per account, replaced on resubmission
pub async fn billing_save(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<PaymentDetails>, JsonRejection>,
) -> Result<Json<PaymentDetails>, ApiError> {
    let Json(details) = payload?;
    if details.token.id.is_empty() {
        return Err(ApiError::validation_error(
            "validation failed",
            vec![ValidationError::required("token.id")],
        ));
    }
    let account = require_account(&state, &profile).await?;
    Ok(Json(state.repos.billing.save_or_update(details, account.id).await?))
}
