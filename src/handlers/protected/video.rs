// handlers/protected/video.rs - read-only video API
use axum::{
    extract::{Path, State},
    response::Json,
};
use std::collections::BTreeMap;

use crate::database::models::Video;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// GET /api/video
pub async fn video_list(State(state): State<AppState>) -> Result<Json<Vec<Video>>, ApiError> {
    Ok(Json(state.videos.list().await?))
}

/// GET /api/video/:id - includes a short-lived download link when a file is attached
pub async fn video_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Video>, ApiError> {
    let id = parse_id(&id, "video")?;
    Ok(Json(state.videos.get_with_signed_url(id).await?))
}

/// GET /api/video/taxonomy/:id
pub async fn video_by_taxonomy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Video>>, ApiError> {
    let taxonomy_id = parse_id(&id, "taxonomy")?;
    Ok(Json(state.videos.find_by_taxonomy_id(taxonomy_id).await?))
}

/// GET /api/video/grade/:name - `{"Math > Adding": [...], ...}`
pub async fn video_by_grade(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BTreeMap<String, Vec<Video>>>, ApiError> {
    Ok(Json(state.videos.find_by_grade(&name).await?))
}
