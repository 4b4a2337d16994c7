// handlers/public/media.rs - GET /media/:bucket/*key (signed links only)
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{content_type_for, validate_bucket, validate_key, SignedQuery};

pub async fn media(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Ok(Query(query)) = query else {
        return Err(ApiError::forbidden("media links must be signed"));
    };

    let key = key.trim_start_matches('/');
    validate_bucket(&bucket)?;
    validate_key(key)?;
    state.signer.verify(&bucket, key, &query, Utc::now())?;

    let body = state.objects.get(&bucket, key).await?;
    debug!("serving {}/{} ({} bytes)", bucket, key, body.len());
    Ok(([(header::CONTENT_TYPE, content_type_for(key))], body).into_response())
}
