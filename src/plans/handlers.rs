use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ExportQuery, MoveRequest},
    duplicates::DuplicateStrategy,
    items::{ItemInput, PlanItem},
    model::{DayUpdate, Plan},
    services::{self, PlanEdit},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult, Resource, Violation},
    i18n::Lang,
    state::AppState,
};

/// Full set of plan routes for one plan kind, mounted under `base`.
pub fn plan_routes<I: PlanItem>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list_plans::<I>).post(create_plan::<I>))
        .route(
            &format!("{base}/import"),
            post(import_plan::<I>).layer(DefaultBodyLimit::max(5 * 1024 * 1024)),
        )
        .route(
            &format!("{base}/:id"),
            get(get_plan::<I>).put(replace_plan::<I>).delete(delete_plan::<I>),
        )
        .route(&format!("{base}/:id/activate"), post(activate_plan::<I>))
        .route(&format!("{base}/:id/export"), get(export_plan::<I>))
        .route(&format!("{base}/:id/days"), post(add_day::<I>))
        .route(
            &format!("{base}/:id/days/:day"),
            put(update_day::<I>).delete(remove_day::<I>),
        )
        .route(&format!("{base}/:id/days/:day/items"), post(add_item::<I>))
        .route(
            &format!("{base}/:id/days/:day/items/:item"),
            put(edit_item::<I>).delete(remove_item::<I>),
        )
        .route(
            &format!("{base}/:id/days/:day/items/:item/move"),
            post(move_item::<I>),
        )
}

/// Days and items are addressed by 1-based position in the URL.
fn index(position: usize, resource: Resource) -> AppResult<usize> {
    position
        .checked_sub(1)
        .ok_or(AppError::NotFound(resource))
}

fn transport(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "multipart stream failed");
    AppError::Transport(e.to_string())
}

#[instrument(skip(state))]
async fn list_plans<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Plan<I>>>> {
    Ok(Json(services::list(state.plans.as_ref(), user_id).await?))
}

#[instrument(skip(state))]
async fn get_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Plan<I>>> {
    Ok(Json(services::get(state.plans.as_ref(), user_id, id).await?))
}

#[instrument(skip(state, plan))]
async fn create_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(plan): Json<Plan<I>>,
) -> AppResult<(StatusCode, Json<Plan<I>>)> {
    let plan = services::create(state.plans.as_ref(), user_id, plan).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state, plan))]
async fn replace_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(plan): Json<Plan<I>>,
) -> AppResult<Json<Plan<I>>> {
    Ok(Json(services::replace(state.plans.as_ref(), user_id, id, plan).await?))
}

#[instrument(skip(state))]
async fn delete_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete::<I>(state.plans.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn activate_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Plan<I>>> {
    Ok(Json(services::activate(state.plans.as_ref(), user_id, id).await?))
}

/// POST multipart: `file` plus optional `duplicateStrategy`.
#[instrument(skip(state, mp))]
async fn import_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<Plan<I>>)> {
    let mut file: Option<(String, Bytes)> = None;
    let mut strategy = DuplicateStrategy::default();

    while let Some(field) = mp.next_field().await.map_err(transport)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(transport)?;
                file = Some((filename, data));
            }
            Some("duplicateStrategy") => {
                let raw = field.text().await.map_err(transport)?;
                if !raw.trim().is_empty() {
                    strategy = raw
                        .parse()
                        .map_err(|_| AppError::validation("duplicateStrategy", Violation::Malformed))?;
                }
            }
            _ => {}
        }
    }
    let (filename, data) = file.ok_or_else(|| AppError::validation("file", Violation::Required))?;

    let imported =
        services::import::<I>(state.plans.as_ref(), user_id, &filename, &data, strategy, locale).await?;
    let status = if imported.replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(imported.plan)))
}

#[instrument(skip(state))]
async fn export_plan<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let format = q.file_format()?;
    let (filename, content_type, bytes) =
        services::export::<I>(state.plans.as_ref(), user_id, id, format).await?;
    let headers = [
        (CONTENT_TYPE, content_type.to_string()),
        (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];
    Ok((headers, bytes))
}

#[instrument(skip(state))]
async fn add_day<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Plan<I>>)> {
    let plan = services::edit(state.plans.as_ref(), user_id, id, PlanEdit::AddDay, locale).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state))]
async fn update_day<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day)): Path<(Uuid, usize)>,
    Json(update): Json<DayUpdate>,
) -> AppResult<Json<Plan<I>>> {
    let change = PlanEdit::UpdateDay {
        day: index(day, Resource::Day)?,
        update,
    };
    Ok(Json(services::edit(state.plans.as_ref(), user_id, id, change, locale).await?))
}

#[instrument(skip(state))]
async fn remove_day<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day)): Path<(Uuid, usize)>,
) -> AppResult<Json<Plan<I>>> {
    let change = PlanEdit::RemoveDay {
        day: index(day, Resource::Day)?,
    };
    Ok(Json(services::edit(state.plans.as_ref(), user_id, id, change, locale).await?))
}

#[instrument(skip(state, input))]
async fn add_item<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day)): Path<(Uuid, usize)>,
    Json(input): Json<ItemInput<I::Record, I::Custom>>,
) -> AppResult<(StatusCode, Json<Plan<I>>)> {
    let change = PlanEdit::AddItem {
        day: index(day, Resource::Day)?,
        input,
    };
    let plan = services::edit(state.plans.as_ref(), user_id, id, change, locale).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state, input))]
async fn edit_item<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day, item)): Path<(Uuid, usize, usize)>,
    Json(input): Json<ItemInput<I::Record, I::Custom>>,
) -> AppResult<Json<Plan<I>>> {
    let change = PlanEdit::EditItem {
        day: index(day, Resource::Day)?,
        item: index(item, Resource::Item)?,
        input,
    };
    Ok(Json(services::edit(state.plans.as_ref(), user_id, id, change, locale).await?))
}

#[instrument(skip(state))]
async fn remove_item<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day, item)): Path<(Uuid, usize, usize)>,
) -> AppResult<Json<Plan<I>>> {
    let change = PlanEdit::RemoveItem {
        day: index(day, Resource::Day)?,
        item: index(item, Resource::Item)?,
    };
    Ok(Json(services::edit(state.plans.as_ref(), user_id, id, change, locale).await?))
}

#[instrument(skip(state))]
async fn move_item<I: PlanItem>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Lang(locale): Lang,
    Path((id, day, item)): Path<(Uuid, usize, usize)>,
    Json(body): Json<MoveRequest>,
) -> AppResult<Json<Plan<I>>> {
    let change = PlanEdit::MoveItem {
        day: index(day, Resource::Day)?,
        item: index(item, Resource::Item)?,
        direction: body.direction,
    };
    Ok(Json(services::edit(state.plans.as_ref(), user_id, id, change, locale).await?))
}
