// handlers/protected/profile.rs - /api/profile and /api/profile/preferences
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::database::models::{BillingStatus, Preferences, Profile, Student, ValidationError};
use crate::error::ApiError;
use crate::handlers::{account_for, require_account};
use crate::middleware::CurrentUser;
use crate::session::PROFILE_KEY;
use crate::state::AppState;

/// GET /api/profile - the caller's account row
pub async fn profile_get(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(require_account(&state, &profile).await?))
}

/// POST /api/profile - get-or-create the caller's account, starting a trial
pub async fn profile_create(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<Profile>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let Json(mut incoming) = payload?;

    if let Some(existing) = account_for(&state, &profile).await? {
        info!("returning existing profile for {}", existing.email);
        return Ok(Json(existing));
    }

    let now = Utc::now();
    incoming.id = 0;
    incoming.email = profile.email.clone();
    incoming.email_verified = profile.email_verified;
    incoming.sub = profile.subject().to_string();
    incoming.enabled = true;
    incoming.billing_status = BillingStatus::Trial;
    incoming.trial_start = Some(now);
    incoming.created = Some(now);
    incoming.updated = None;
    if incoming.full_name.is_empty() {
        incoming.full_name = profile.full_name.clone();
    }

    incoming.id = state.repos.profile.save(&incoming).await?;
    info!("created profile {} for {}", incoming.id, incoming.email);
    Ok(Json(incoming))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, rename = "name")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub onboarded: bool,
    /// Complete replacement set when present
    #[serde(default)]
    pub students: Option<Vec<Student>>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<Student>>,
}

/// PUT /api/profile - update contact details and, optionally, the student list
pub async fn profile_update(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    jar: CookieJar,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<(CookieJar, Json<ProfileResponse>), ApiError> {
    let Json(incoming) = payload?;
    let mut account = require_account(&state, &profile).await?;

    let mut errors: Vec<ValidationError> = Vec::new();
    if let Some(students) = &incoming.students {
        let mut seen = HashSet::new();
        for (i, student) in students.iter().enumerate() {
            errors.extend(
                student
                    .validate()
                    .into_iter()
                    .map(|e| ValidationError::new(format!("students[{}].{}", i, e.field), e.error)),
            );
            if student.id != 0 && !seen.insert(student.id) {
                errors.push(ValidationError::new(
                    format!("students[{}].id", i),
                    format!("student {} is listed more than once", student.id),
                ));
            }
        }
    }
    ApiError::check(errors)?;

    account.full_name = incoming.full_name;
    let email_changed = !incoming.email.is_empty() && incoming.email != account.email;
    if email_changed {
        // self-asserted addresses start unverified
        account.email = incoming.email;
        account.email_verified = false;
    }
    account.state = incoming.state;
    account.county = incoming.county;
    account.onboarded = incoming.onboarded;
    account.updated = Some(Utc::now());

    let students = state
        .repos
        .profile
        .update_with_students(&account, incoming.students, account.id)
        .await?;

    // keep the session pointed at the account after an email change
    let mut jar = jar;
    if email_changed {
        let mut session = state.sessions.load(&jar);
        let mut session_profile = profile;
        session_profile.email = account.email.clone();
        session_profile.email_verified = false;
        session.insert(PROFILE_KEY, &session_profile)?;
        jar = state.sessions.save(jar, &session)?;
        info!("profile {} changed email to {}", account.id, account.email);
    }

    Ok((
        jar,
        Json(ProfileResponse {
            profile: account,
            students,
        }),
    ))
}

/// POST /api/profile/preferences - `{newsletter, beta_program}`
pub async fn preferences_save(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<Preferences>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let Json(preferences) = payload?;
    let mut account = require_account(&state, &profile).await?;

    account.preferences = preferences;
    account.updated = Some(Utc::now());
    state.repos.profile.update(&account).await?;
    Ok(Json(account))
}
