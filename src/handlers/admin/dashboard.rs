// handlers/admin/dashboard.rs - GET /admin/dashboard, GET /admin/taxonomy
use axum::{extract::State, response::Html};

use crate::error::PageError;
use crate::middleware::CurrentUser;
use crate::services::TaxonomyTree;
use crate::state::AppState;
use crate::templates::{render, AdminDashboardTemplate, PageContext, TaxonomyListTemplate, TaxonomyRow};

pub async fn admin_dashboard(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Html<String>, PageError> {
    let template = AdminDashboardTemplate {
        page: PageContext::new("Administration", state.auth.ga_tracking_id.clone()).for_user(&profile, true),
        user_count: state.repos.profile.list().await?.len(),
        student_count: state.repos.student.list().await?.len(),
        video_count: state.repos.video.list().await?.len(),
        grade_count: state.repos.taxonomy.list().await?.len(),
    };
    render(&template)
}

pub async fn taxonomy_view(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> Result<Html<String>, PageError> {
    let tree = state.repos.taxonomy.list_recursive().await?;
    let template = TaxonomyListTemplate {
        page: PageContext::new("Taxonomy", state.auth.ga_tracking_id.clone()).for_user(&profile, true),
        rows: TaxonomyRow::from_tree(&tree),
    };
    render(&template)
}
