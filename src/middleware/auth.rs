use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::state::AppState;

/// Profile of the logged-in user, placed in request extensions by the guards
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Profile);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("no authenticated user on this request"))
    }
}

fn is_api(request: &Request) -> bool {
    request.uri().path().starts_with("/api/")
}

/// Lets the request through only when the session holds a profile
pub async fn require_authenticated(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(profile) = state.sessions.load(&jar).profile() else {
        debug!("unauthenticated request for {}", request.uri().path());
        return Err(if is_api(&request) {
            ApiError::login_required("/login").into_response()
        } else {
            Redirect::to("/401").into_response()
        });
    };

    request.extensions_mut().insert(CurrentUser(profile));
    Ok(next.run(request).await)
}

/// Lets the request through only for an authenticated admin
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(profile) = state.sessions.load(&jar).profile() else {
        return Err(if is_api(&request) {
            ApiError::login_required("/login").into_response()
        } else {
            Redirect::to("/401").into_response()
        });
    };

    if !profile.is_admin(&state.auth.admin_email_suffix) {
        debug!("{} is not an admin, denying {}", profile.email, request.uri().path());
        return Err(if is_api(&request) {
            ApiError::forbidden("you are not authorized to access this resource").into_response()
        } else {
            Redirect::to("/403").into_response()
        });
    }

    request.extensions_mut().insert(CurrentUser(profile));
    Ok(next.run(request).await)
}
