use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        AnalysisResult, RenameAnalysisRequest, RunAnalysisRequest, SaveAnalysisRequest,
        SavedAnalysisResponse,
    },
    repo::SavedAnalysis,
    services,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult, Resource},
    state::AppState,
};

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analyses/run", post(run_analysis))
        .route("/analyses", get(list_analyses).post(save_analysis))
        .route(
            "/analyses/:id",
            get(get_analysis).put(rename_analysis).delete(delete_analysis),
        )
}

/// Computes without storing.
#[instrument(skip(state))]
async fn run_analysis(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<RunAnalysisRequest>,
) -> AppResult<Json<AnalysisResult>> {
    Ok(Json(services::run(state.datasets.as_ref(), body).await?))
}

#[instrument(skip(state))]
async fn save_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SaveAnalysisRequest>,
) -> AppResult<(StatusCode, Json<SavedAnalysisResponse>)> {
    let name = services::check_name(&body.name)?;
    let result = services::run(state.datasets.as_ref(), body.run).await?;
    let saved = SavedAnalysis::insert(&state.db, user_id, &name, &result).await?;
    info!(%user_id, analysis_id = %saved.id, "analysis saved");
    Ok((StatusCode::CREATED, Json(saved.into())))
}

#[instrument(skip(state))]
async fn list_analyses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<SavedAnalysisResponse>>> {
    let rows = SavedAnalysis::list_by_user(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
async fn get_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SavedAnalysisResponse>> {
    let row = SavedAnalysis::find(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound(Resource::Analysis))?;
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
async fn rename_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameAnalysisRequest>,
) -> AppResult<Json<SavedAnalysisResponse>> {
    let name = services::check_name(&body.name)?;
    let row = SavedAnalysis::rename(&state.db, user_id, id, &name)
        .await?
        .ok_or(AppError::NotFound(Resource::Analysis))?;
    info!(%user_id, analysis_id = %id, "analysis renamed");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
async fn delete_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !SavedAnalysis::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound(Resource::Analysis));
    }
    Ok(StatusCode::NO_CONTENT)
}
