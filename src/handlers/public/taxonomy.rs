// handlers/public/taxonomy.rs - GET /api/taxonomy/flatten
use axum::{extract::State, response::Json};
use tracing::warn;

use crate::database::models::Taxonomy;
use crate::error::ApiError;
use crate::services::TaxonomyTree;
use crate::state::AppState;

/// Every leaf category named by its full path; roots that fail to flatten are skipped
pub async fn flatten_all(State(state): State<AppState>) -> Result<Json<Vec<Taxonomy>>, ApiError> {
    let repo = state.repos.taxonomy.as_ref();
    let mut flattened = Vec::new();
    for root in repo.list().await? {
        let root_id = root.id;
        match repo.flatten(Some(root)).await {
            Ok(leaves) => flattened.extend(leaves),
            Err(e) => warn!("failed to flatten taxonomy {}: {}", root_id, e),
        }
    }
    Ok(Json(flattened))
}
