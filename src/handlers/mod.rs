// handlers/mod.rs - three security tiers
//
// Public (no session) → Protected (session profile required) → Admin (admin profile required)
pub mod admin;
pub mod protected;
pub mod public;

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::state::AppState;

/// Numeric path id; anything else is treated as a missing resource
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found(format!("{} '{}' not found", entity, raw)))
}

/// Persisted account row behind the session profile, matched by email
pub(crate) async fn account_for(state: &AppState, profile: &Profile) -> Result<Option<Profile>, ApiError> {
    Ok(state.repos.profile.find_by_email(&profile.email).await?)
}

/// Account row, or 404 when the user has not created a profile yet
pub(crate) async fn require_account(state: &AppState, profile: &Profile) -> Result<Profile, ApiError> {
    account_for(state, profile)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no profile exists for {}", profile.email)))
}

/// Id recorded in audit columns; 0 until the user has an account row
pub(crate) async fn actor_id(state: &AppState, profile: &Profile) -> Result<i64, ApiError> {
    Ok(account_for(state, profile).await?.map(|p| p.id).unwrap_or(0))
}

pub(crate) fn dashboard_path(state: &AppState, profile: &Profile) -> &'static str {
    if profile.is_admin(&state.auth.admin_email_suffix) {
        "/admin/dashboard"
    } else {
        "/dashboard"
    }
}
