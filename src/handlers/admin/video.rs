// handlers/admin/video.rs - video CRUD and file upload
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use tracing::info;

use crate::database::models::{ValidationError, Video};
use crate::error::ApiError;
use crate::handlers::{actor_id, parse_id};
use crate::middleware::CurrentUser;
use crate::state::AppState;

async fn check_taxonomy(state: &AppState, video: &Video, errors: &mut Vec<ValidationError>) -> Result<(), ApiError> {
    if video.taxonomy_id > 0 && state.repos.taxonomy.get(video.taxonomy_id).await?.is_none() {
        errors.push(ValidationError::new(
            "taxonomy_id",
            format!("taxonomy {} does not exist", video.taxonomy_id),
        ));
    }
    Ok(())
}

/// POST /api/video - metadata only; the file follows via the upload route
pub async fn video_add(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<Video>, JsonRejection>,
) -> Result<Json<Video>, ApiError> {
    let Json(mut video) = payload?;
    video.id = 0;
    video.bucket.clear();
    video.object_key.clear();

    let mut errors = video.validate();
    check_taxonomy(&state, &video, &mut errors).await?;
    ApiError::check(errors)?;

    let actor = actor_id(&state, &profile).await?;
    state.videos.save(&mut video, actor).await?;
    Ok(Json(video))
}

/// PUT /api/video/:id - metadata update; storage location is kept
pub async fn video_update(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Video>, JsonRejection>,
) -> Result<Json<Video>, ApiError> {
    let id = parse_id(&id, "video")?;
    let Json(mut video) = payload?;
    let existing = state
        .repos
        .video
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {} not found", id)))?;

    video.id = id;
    let mut errors = video.validate();
    check_taxonomy(&state, &video, &mut errors).await?;
    ApiError::check(errors)?;

    video.bucket = existing.bucket;
    video.object_key = existing.object_key;
    video.file_size = existing.file_size;
    video.created = existing.created;
    video.created_by = existing.created_by;

    let actor = actor_id(&state, &profile).await?;
    state.videos.update(&mut video, actor).await?;
    Ok(Json(video))
}

/// DELETE /api/video/:id
pub async fn video_delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "video")?;
    state.videos.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/video/:id/upload - raw request body becomes the video file
pub async fn video_upload(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Video>, ApiError> {
    let id = id
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("invalid video id '{}'", id)))?;
    if body.is_empty() {
        return Err(ApiError::bad_request("upload body is empty"));
    }

    let mut video = state
        .repos
        .video
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {} not found", id)))?;

    if let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        if content_type != "application/octet-stream" {
            video.file_type = content_type.to_string();
        }
    }

    let size = body.len();
    let actor = actor_id(&state, &profile).await?;
    state.videos.set_file(&mut video, body, actor).await?;
    info!("stored {} bytes for video {} at {}/{}", size, id, video.bucket, video.object_key);
    Ok(Json(video))
}
