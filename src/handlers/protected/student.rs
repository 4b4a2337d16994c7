// handlers/protected/student.rs - the caller's students
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::database::models::Student;
use crate::error::ApiError;
use crate::handlers::{parse_id, require_account};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// GET /api/student
pub async fn student_list(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Json<Vec<Student>>, ApiError> {
    let account = require_account(&state, &profile).await?;
    Ok(Json(state.repos.student.find_by_user_id(account.id).await?))
}

/// POST /api/student
pub async fn student_add(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<Student>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let Json(mut student) = payload?;
    ApiError::check(student.validate())?;
    let account = require_account(&state, &profile).await?;

    student.user_id = account.id;
    student.created = Utc::now();
    student.created_by = account.id;
    student.id = state.repos.student.save(&student).await?;
    info!("student {} added for user {}", student.id, account.id);
    Ok(Json(student))
}

/// PUT /api/student/:id - only students belonging to the caller
pub async fn student_update(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Student>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id, "student")?;
    let Json(mut student) = payload?;
    ApiError::check(student.validate())?;
    let account = require_account(&state, &profile).await?;

    let owned = state.repos.student.find_by_user_id(account.id).await?;
    let Some(existing) = owned.into_iter().find(|s| s.id == id) else {
        return Err(ApiError::not_found(format!("student {} not found", id)));
    };

    student.id = id;
    student.user_id = account.id;
    student.created = existing.created;
    student.created_by = existing.created_by;
    student.updated = Some(Utc::now());
    student.updated_by = Some(account.id);
    state.repos.student.update(&student).await?;
    Ok(Json(student))
}
