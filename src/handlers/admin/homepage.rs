// handlers/admin/homepage.rs - POST /api/homepage
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::database::models::Homepage;
use crate::error::ApiError;
use crate::state::AppState;

/// Replaces the single homepage document, creating it on first save
pub async fn homepage_save(
    State(state): State<AppState>,
    payload: Result<Json<Homepage>, JsonRejection>,
) -> Result<Json<Homepage>, ApiError> {
    let Json(mut homepage) = payload?;

    let existing = state.repos.homepage.get().await?;
    let now = Utc::now();
    match existing {
        Some(current) => {
            homepage.id = current.id;
            homepage.created = current.created;
            homepage.updated = Some(now);
        }
        None => {
            homepage.id = 0;
            homepage.created = Some(now);
            homepage.updated = None;
        }
    }

    homepage.id = state.repos.homepage.save(&homepage).await?;
    info!("homepage {} saved", homepage.id);
    Ok(Json(homepage))
}
