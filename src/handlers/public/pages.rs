// handlers/public/pages.rs - GET /401, /403, /404, /500 and the fallback
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::templates::{render, ErrorTemplate};

/// Error page carrying its own status code
pub fn error_page(state: &AppState, status: StatusCode) -> Response {
    let template = ErrorTemplate::new(status.as_u16(), state.auth.ga_tracking_id.clone());
    match render(&template) {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn unauthorized_page(State(state): State<AppState>) -> Response {
    error_page(&state, StatusCode::UNAUTHORIZED)
}

pub async fn forbidden_page(State(state): State<AppState>) -> Response {
    error_page(&state, StatusCode::FORBIDDEN)
}

pub async fn not_found_page(State(state): State<AppState>) -> Response {
    error_page(&state, StatusCode::NOT_FOUND)
}

pub async fn server_error_page(State(state): State<AppState>) -> Response {
    // rendering here must not redirect back to /500
    let template = ErrorTemplate::new(500, state.auth.ga_tracking_id.clone());
    match render(&template) {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, html).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response(),
    }
}

/// Unknown routes: JSON under `/api`, the 404 page elsewhere
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        ApiError::not_found(format!("no route for {}", uri.path())).into_response()
    } else {
        error_page(&state, StatusCode::NOT_FOUND)
    }
}
