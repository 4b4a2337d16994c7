// handlers/admin/taxonomy.rs - POST /api/taxonomy, PUT /api/taxonomy/:id
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::database::models::{Taxonomy, ValidationError};
use crate::error::ApiError;
use crate::handlers::{actor_id, parse_id};
use crate::middleware::CurrentUser;
use crate::services::TaxonomyTree;
use crate::state::AppState;

async fn check_parent(state: &AppState, taxonomy: &Taxonomy, errors: &mut Vec<ValidationError>) -> Result<(), ApiError> {
    let Some(parent_id) = taxonomy.parent() else {
        return Ok(());
    };
    if state.repos.taxonomy.get(parent_id).await?.is_none() {
        errors.push(ValidationError::new("parent_id", format!("parent category {} does not exist", parent_id)));
    } else if taxonomy.id != 0 && state.repos.taxonomy.would_create_cycle(taxonomy.id, Some(parent_id)).await? {
        errors.push(ValidationError::new(
            "parent_id",
            "a category cannot be moved under one of its own descendants",
        ));
    }
    Ok(())
}

pub async fn taxonomy_add(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    payload: Result<Json<Taxonomy>, JsonRejection>,
) -> Result<Json<Taxonomy>, ApiError> {
    let Json(mut taxonomy) = payload?;
    taxonomy.id = 0;
    taxonomy.parent_id = taxonomy.parent();

    let mut errors = taxonomy.validate();
    check_parent(&state, &taxonomy, &mut errors).await?;
    ApiError::check(errors)?;

    taxonomy.created = Utc::now();
    taxonomy.created_by = actor_id(&state, &profile).await?;
    taxonomy.id = state.repos.taxonomy.save(&taxonomy).await?;
    info!("taxonomy {} '{}' created", taxonomy.id, taxonomy.name);
    Ok(Json(taxonomy))
}

pub async fn taxonomy_update(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Taxonomy>, JsonRejection>,
) -> Result<Json<Taxonomy>, ApiError> {
    let id = parse_id(&id, "taxonomy")?;
    let Json(mut taxonomy) = payload?;
    let existing = state
        .repos
        .taxonomy
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("taxonomy {} not found", id)))?;

    taxonomy.id = id;
    taxonomy.parent_id = taxonomy.parent();
    let mut errors = taxonomy.validate();
    check_parent(&state, &taxonomy, &mut errors).await?;
    ApiError::check(errors)?;

    taxonomy.created = existing.created;
    taxonomy.created_by = existing.created_by;
    taxonomy.updated = Some(Utc::now());
    taxonomy.updated_by = Some(actor_id(&state, &profile).await?);
    state.repos.taxonomy.update(&taxonomy).await?;
    Ok(Json(taxonomy))
}
