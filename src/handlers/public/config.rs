// handlers/public/config.rs - GET /api/config, GET /auth/config.js
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::state::AppState;

/// Values the browser login widget needs; never includes secrets
#[derive(Debug, Serialize)]
pub struct BrowserConfig {
    pub auth0_domain: String,
    pub auth0_client_id: String,
    pub callback_url: String,
    pub ga_tracking_id: Option<String>,
}

impl BrowserConfig {
    fn from_state(state: &AppState) -> Self {
        Self {
            auth0_domain: state.auth.domain_host().to_string(),
            auth0_client_id: state.auth.client_id.clone(),
            callback_url: state.auth.callback_url.clone(),
            ga_tracking_id: state.auth.ga_tracking_id.clone(),
        }
    }
}

pub async fn api_config(State(state): State<AppState>) -> Json<BrowserConfig> {
    Json(BrowserConfig::from_state(&state))
}

pub async fn config_js(State(state): State<AppState>) -> impl IntoResponse {
    let config = BrowserConfig::from_state(&state);
    let quoted = |value: &str| serde_json::Value::from(value).to_string();

    let body = format!(
        "var AUTH0_CLIENT_ID = {};\nvar AUTH0_DOMAIN = {};\nvar AUTH0_CALLBACK_URL = {};\n",
        quoted(&config.auth0_client_id),
        quoted(&config.auth0_domain),
        quoted(&config.callback_url),
    );
    ([(header::CONTENT_TYPE, "application/javascript")], body)
}
