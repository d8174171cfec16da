use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ProgressResponse, RecordProgressRequest},
    repo::ProgressEntry,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult, Resource},
    state::AppState,
};

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress", get(list_progress).post(record_progress))
        .route("/progress/:id", delete(delete_progress))
}

#[instrument(skip(state))]
async fn list_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<ProgressResponse>>> {
    let entries = ProgressEntry::list_by_user(&state.db, user_id).await?;
    Ok(Json(entries.into_iter().map(ProgressResponse::from).collect()))
}

#[instrument(skip(state))]
async fn record_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RecordProgressRequest>,
) -> AppResult<(StatusCode, Json<ProgressResponse>)> {
    let sample = body.validate().map_err(|e| {
        warn!(%user_id, error = %e, "progress sample rejected");
        e
    })?;

    match sample.id {
        Some(id) => {
            let entry = ProgressEntry::update(&state.db, user_id, id, &sample)
                .await?
                .ok_or(AppError::NotFound(Resource::ProgressEntry))?;
            info!(%user_id, entry_id = %entry.id, "progress updated");
            Ok((StatusCode::OK, Json(entry.into())))
        }
        None => {
            let entry = ProgressEntry::insert(&state.db, user_id, &sample).await?;
            info!(%user_id, entry_id = %entry.id, "progress recorded");
            Ok((StatusCode::CREATED, Json(entry.into())))
        }
    }
}

#[instrument(skip(state))]
async fn delete_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !ProgressEntry::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound(Resource::ProgressEntry));
    }
    Ok(StatusCode::NO_CONTENT)
}
