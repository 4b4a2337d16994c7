// handlers/protected/taxonomy.rs - read-only taxonomy API
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

use crate::database::models::Taxonomy;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::services::TaxonomyTree;
use crate::state::AppState;

/// GET /api/taxonomy - root categories (grades)
pub async fn taxonomy_list(State(state): State<AppState>) -> Result<Json<Vec<Taxonomy>>, ApiError> {
    Ok(Json(state.repos.taxonomy.list().await?))
}

#[derive(Debug, Serialize)]
pub struct ChildrenResponse {
    pub parent_id: i64,
    pub children: Vec<Taxonomy>,
}

/// GET /api/taxonomy/:id/children
pub async fn taxonomy_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChildrenResponse>, ApiError> {
    let parent_id = parse_id(&id, "taxonomy")?;
    let children = state.repos.taxonomy.list_children(parent_id).await?;
    Ok(Json(ChildrenResponse { parent_id, children }))
}

/// GET /api/taxonomy/:id/children/recursive
pub async fn taxonomy_children_recursive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Taxonomy>>, ApiError> {
    let parent_id = parse_id(&id, "taxonomy")?;
    Ok(Json(state.repos.taxonomy.list_children_recursive(parent_id).await?))
}
