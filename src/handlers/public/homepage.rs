// handlers/public/homepage.rs - GET /, GET /api/homepage
use axum::{
    extract::State,
    response::{Html, Json},
};
use axum_extra::extract::cookie::CookieJar;

use crate::database::models::Homepage;
use crate::error::{ApiError, PageError};
use crate::state::AppState;
use crate::templates::{render, HomepageTemplate, PageContext};

pub async fn homepage_view(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, PageError> {
    let homepage = state.repos.homepage.get().await?.unwrap_or_default();

    let title = match homepage.content.header.title.as_str() {
        "" => "Home".to_string(),
        title => title.to_string(),
    };
    let mut page = PageContext::new(title, state.auth.ga_tracking_id.clone());
    if let Some(profile) = state.sessions.load(&jar).profile() {
        let is_admin = profile.is_admin(&state.auth.admin_email_suffix);
        page = page.for_user(&profile, is_admin);
    }

    render(&HomepageTemplate {
        page,
        content: homepage.content,
    })
}

/// Stored document, or an empty one before anything has been saved
pub async fn homepage_json(State(state): State<AppState>) -> Result<Json<Homepage>, ApiError> {
    Ok(Json(state.repos.homepage.get().await?.unwrap_or_default()))
}
