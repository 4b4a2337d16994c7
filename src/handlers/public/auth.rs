// handlers/public/auth.rs - GET /login, GET /callback, GET /logout
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ApiError, PageError};
use crate::handlers::dashboard_path;
use crate::session::{ACCESS_TOKEN_KEY, ID_TOKEN_KEY, PROFILE_KEY};
use crate::state::AppState;
use crate::templates::{render, LoginTemplate, PageContext};

/// GET /login - login page, or straight to the dashboard when already signed in
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    if let Some(profile) = state.sessions.load(&jar).profile() {
        return Ok(Redirect::to(dashboard_path(&state, &profile)).into_response());
    }

    let template = LoginTemplate {
        page: PageContext::new("Log in", state.auth.ga_tracking_id.clone()),
        authorize_url: state.idp.authorize_url()?,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /callback - finish the authorization-code flow.
///
/// The session is written only after the token exchange and the userinfo
/// fetch both succeed; any failure answers 500 with the error text.
pub async fn callback(State(state): State<AppState>, jar: CookieJar, Query(query): Query<CallbackQuery>) -> Response {
    match complete_login(&state, jar, query).await {
        Ok((jar, target)) => (jar, Redirect::to(target)).into_response(),
        Err(e) => {
            error!("login callback failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn complete_login(state: &AppState, jar: CookieJar, query: CallbackQuery) -> anyhow::Result<(CookieJar, &'static str)> {
    if let Some(error) = query.error {
        anyhow::bail!("{}: {}", error, query.error_description.unwrap_or_default());
    }
    if query.code.is_empty() {
        anyhow::bail!("callback is missing the authorization code");
    }

    let tokens = state.idp.exchange_code(&query.code).await?;
    let profile = state.idp.fetch_userinfo(&tokens.access_token).await?;

    let mut session = state.sessions.load(&jar);
    session.insert(ID_TOKEN_KEY, &tokens.id_token)?;
    session.insert(ACCESS_TOKEN_KEY, &tokens.access_token)?;
    session.insert(PROFILE_KEY, &profile)?;
    let jar = state.sessions.save(jar, &session)?;

    info!("{} logged in", profile.email);
    Ok((jar, dashboard_path(state, &profile)))
}

/// GET /logout - expire the session cookie and leave
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Redirect), ApiError> {
    let jar = state.sessions.clear(jar);
    let target = if state.config.security.federated_logout {
        state.idp.logout_url(&state.auth.logout_redirect_to)?
    } else {
        "/".to_string()
    };
    info!("logging out, redirecting to {}", target);
    Ok((jar, Redirect::to(&target)))
}
