use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{ExerciseFilter, ExerciseRecord, RecipeQuery, RecipeRecord},
    filter::filter_exercises,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/body-parts", get(body_parts))
        .route("/catalog/equipment", get(equipment))
        .route("/catalog/targets", get(targets))
        .route("/catalog/exercises", get(exercises))
        .route("/catalog/recipes", get(recipes))
}

fn upstream(e: anyhow::Error) -> AppError {
    warn!(error = ?e, "catalog unavailable");
    AppError::Transport(e.to_string())
}

#[instrument(skip(state))]
async fn body_parts(State(state): State<AppState>, _user: AuthUser) -> AppResult<Json<Vec<String>>> {
    let snapshot = state
        .catalog_cache
        .exercises(state.catalog.as_ref())
        .await
        .map_err(upstream)?;
    Ok(Json(snapshot.body_parts.clone()))
}

#[instrument(skip(state))]
async fn equipment(State(state): State<AppState>, _user: AuthUser) -> AppResult<Json<Vec<String>>> {
    let snapshot = state
        .catalog_cache
        .exercises(state.catalog.as_ref())
        .await
        .map_err(upstream)?;
    Ok(Json(snapshot.equipment.clone()))
}

#[instrument(skip(state))]
async fn targets(State(state): State<AppState>, _user: AuthUser) -> AppResult<Json<Vec<String>>> {
    let snapshot = state
        .catalog_cache
        .exercises(state.catalog.as_ref())
        .await
        .map_err(upstream)?;
    Ok(Json(snapshot.targets.clone()))
}

#[instrument(skip(state))]
async fn exercises(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<ExerciseFilter>,
) -> AppResult<Json<Vec<ExerciseRecord>>> {
    let snapshot = state
        .catalog_cache
        .exercises(state.catalog.as_ref())
        .await
        .map_err(upstream)?;
    Ok(Json(filter_exercises(&snapshot, &filter)))
}

#[instrument(skip(state))]
async fn recipes(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<Vec<RecipeRecord>>> {
    let found = state
        .catalog_cache
        .recipes(state.catalog.as_ref(), &query)
        .await
        .map_err(upstream)?;
    Ok(Json(found.as_ref().clone()))
}
