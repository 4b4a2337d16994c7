// handlers/admin/reports.rs - GET /api/admin/users, /students, /payments
use axum::{extract::State, response::Json};

use crate::database::models::{PaymentDetails, Profile, Student};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn report_users(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, ApiError> {
    Ok(Json(state.repos.profile.list().await?))
}

pub async fn report_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, ApiError> {
    Ok(Json(state.repos.student.list().await?))
}

pub async fn report_payments(State(state): State<AppState>) -> Result<Json<Vec<PaymentDetails>>, ApiError> {
    Ok(Json(state.repos.billing.list().await?))
}
