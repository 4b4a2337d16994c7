// handlers/protected/dashboard.rs - GET /dashboard
use axum::{extract::State, response::Html};

use crate::error::PageError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::templates::{render, DashboardTemplate, PageContext};

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Html<String>, PageError> {
    let account = state.repos.profile.find_by_email(&profile.email).await?;

    let (billing_status, student_count) = match &account {
        Some(account) => (
            account.billing_status.to_string(),
            state.repos.student.find_by_user_id(account.id).await?.len(),
        ),
        None => ("not set up".to_string(), 0),
    };

    let is_admin = profile.is_admin(&state.auth.admin_email_suffix);
    let template = DashboardTemplate {
        page: PageContext::new("Dashboard", state.auth.ga_tracking_id.clone()).for_user(&profile, is_admin),
        profile,
        billing_status,
        student_count,
    };
    render(&template)
}
