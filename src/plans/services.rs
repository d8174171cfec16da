use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    duplicates::{plan_import, resolve, DuplicateStrategy, ImportAction},
    items::{ItemInput, PlanItem},
    model::{DayUpdate, Direction, Plan, PlanError},
    store::{PlanRecord, PlanStore, PlanWrite, StoreError},
    transfer::{export_filename, export_plan, parse_plan, FileFormat},
};
use crate::{
    error::{AppError, AppResult, Resource},
    i18n::Locale,
};

/// One editing step applied to a stored plan. Indexes are zero based.
#[derive(Debug, Clone)]
pub enum PlanEdit<I: PlanItem> {
    AddDay,
    UpdateDay { day: usize, update: DayUpdate },
    RemoveDay { day: usize },
    AddItem { day: usize, input: ItemInput<I::Record, I::Custom> },
    EditItem { day: usize, item: usize, input: ItemInput<I::Record, I::Custom> },
    RemoveItem { day: usize, item: usize },
    MoveItem { day: usize, item: usize, direction: Direction },
}

impl<I: PlanItem> PlanEdit<I> {
    fn apply(self, plan: &mut Plan<I>, locale: Locale) -> Result<(), PlanError> {
        match self {
            PlanEdit::AddDay => {
                plan.add_day(locale);
            }
            PlanEdit::UpdateDay { day, update } => {
                plan.update_day(day, update, locale)?;
            }
            PlanEdit::RemoveDay { day } => {
                plan.remove_day(day)?;
            }
            PlanEdit::AddItem { day, input } => {
                plan.day_mut(day)?.add_item(input);
            }
            PlanEdit::EditItem { day, item, input } => {
                plan.day_mut(day)?.edit_item(item, input)?;
            }
            PlanEdit::RemoveItem { day, item } => {
                plan.day_mut(day)?.remove_item(item)?;
            }
            PlanEdit::MoveItem { day, item, direction } => {
                plan.day_mut(day)?.move_item(item, direction)?;
            }
        }
        Ok(())
    }
}

/// Result of an import; `replaced` is set when an existing plan was overwritten.
#[derive(Debug, Clone)]
pub struct Imported<I> {
    pub plan: Plan<I>,
    pub replaced: bool,
}

fn name_taken(name: &str, conflict_id: Option<Uuid>) -> impl FnOnce(StoreError) -> AppError + '_ {
    move |e| match e {
        StoreError::NameTaken => AppError::DuplicateName {
            name: name.to_string(),
            conflict_id,
        },
        StoreError::Other(e) => AppError::Internal(e),
    }
}

fn other(e: StoreError) -> AppError {
    match e {
        StoreError::NameTaken => AppError::Internal(anyhow::anyhow!("unexpected name conflict")),
        StoreError::Other(e) => AppError::Internal(e),
    }
}

fn to_plan<I: PlanItem>(record: PlanRecord) -> AppResult<Plan<I>> {
    Ok(record.into_plan()?)
}

/// Canonical shape plus completeness check; runs before anything is written.
fn prepare<I: PlanItem>(plan: &mut Plan<I>) -> AppResult<()> {
    plan.normalize();
    plan.validate()?;
    plan.strip_temporary_ids();
    Ok(())
}

async fn ensure_free<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    name: &str,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let names = store.names(user_id, I::KIND).await.map_err(other)?;
    let res = resolve(names.iter().map(|(id, n)| (*id, n.as_str())), name, exclude_id);
    match res.conflict_id {
        Some(conflict_id) => Err(AppError::DuplicateName {
            name: name.to_string(),
            conflict_id: Some(conflict_id),
        }),
        None => Ok(()),
    }
}

pub async fn list<I: PlanItem>(store: &dyn PlanStore, user_id: Uuid) -> AppResult<Vec<Plan<I>>> {
    store
        .list(user_id, I::KIND)
        .await
        .map_err(other)?
        .into_iter()
        .map(to_plan)
        .collect()
}

pub async fn get<I: PlanItem>(store: &dyn PlanStore, user_id: Uuid, id: Uuid) -> AppResult<Plan<I>> {
    let record = store
        .get(user_id, I::KIND, id)
        .await
        .map_err(other)?
        .ok_or(AppError::NotFound(Resource::Plan))?;
    to_plan(record)
}

pub async fn create<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    mut plan: Plan<I>,
) -> AppResult<Plan<I>> {
    prepare(&mut plan)?;
    ensure_free::<I>(store, user_id, &plan.name, None).await?;
    plan.date_created = OffsetDateTime::now_utc();

    let write = PlanWrite::from_plan(&plan)?;
    let record = store
        .insert(user_id, I::KIND, write)
        .await
        .map_err(name_taken(&plan.name, None))?;
    info!(%user_id, plan_id = %record.id, kind = %I::KIND, "plan created");
    to_plan(record)
}

/// Replaces the whole document of an existing plan.
pub async fn replace<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    id: Uuid,
    mut plan: Plan<I>,
) -> AppResult<Plan<I>> {
    prepare(&mut plan)?;
    ensure_free::<I>(store, user_id, &plan.name, Some(id)).await?;

    let write = PlanWrite::from_plan(&plan)?;
    let record = store
        .update(user_id, I::KIND, id, write)
        .await
        .map_err(name_taken(&plan.name, None))?
        .ok_or(AppError::NotFound(Resource::Plan))?;
    info!(%user_id, plan_id = %id, kind = %I::KIND, "plan updated");
    to_plan(record)
}

pub async fn delete<I: PlanItem>(store: &dyn PlanStore, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !store.delete(user_id, I::KIND, id).await.map_err(other)? {
        return Err(AppError::NotFound(Resource::Plan));
    }
    info!(%user_id, plan_id = %id, kind = %I::KIND, "plan deleted");
    Ok(())
}

pub async fn activate<I: PlanItem>(store: &dyn PlanStore, user_id: Uuid, id: Uuid) -> AppResult<Plan<I>> {
    if !store.activate(user_id, I::KIND, id).await.map_err(other)? {
        return Err(AppError::NotFound(Resource::Plan));
    }
    info!(%user_id, plan_id = %id, kind = %I::KIND, "plan activated");
    get(store, user_id, id).await
}

/// Loads a plan, applies one edit and writes the row back. Nothing is written
/// when the edit leaves the plan incomplete.
pub async fn edit<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    id: Uuid,
    change: PlanEdit<I>,
    locale: Locale,
) -> AppResult<Plan<I>> {
    let mut plan: Plan<I> = get(store, user_id, id).await?;
    change.apply(&mut plan, locale)?;
    prepare(&mut plan)?;

    let write = PlanWrite::from_plan(&plan)?;
    let record = store
        .update(user_id, I::KIND, id, write)
        .await
        .map_err(name_taken(&plan.name, None))?
        .ok_or(AppError::NotFound(Resource::Plan))?;
    to_plan(record)
}

/// Reads an uploaded file and stores it according to `strategy`. The plan is
/// fully checked before the name collision is looked at, and written once.
pub async fn import<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    filename: &str,
    content: &[u8],
    strategy: DuplicateStrategy,
    locale: Locale,
) -> AppResult<Imported<I>> {
    let mut plan: Plan<I> = parse_plan(filename, content)?;
    prepare(&mut plan)?;

    let names = store.names(user_id, I::KIND).await.map_err(other)?;
    let action = plan_import(
        names.iter().map(|(id, n)| (*id, n.as_str())),
        &plan.name,
        strategy,
        locale.copy_prefix(),
    );

    match action {
        ImportAction::Reject { conflict_id } => {
            warn!(%user_id, %conflict_id, kind = %I::KIND, "import rejected, name taken");
            Err(AppError::DuplicateName {
                name: plan.name,
                conflict_id: Some(conflict_id),
            })
        }
        ImportAction::Insert { name } => {
            plan.name = name;
            plan.is_active = false;
            let write = PlanWrite::from_plan(&plan)?;
            let record = store
                .insert(user_id, I::KIND, write)
                .await
                .map_err(name_taken(&plan.name, None))?;
            info!(%user_id, plan_id = %record.id, kind = %I::KIND, ?strategy, "plan imported");
            Ok(Imported {
                plan: to_plan(record)?,
                replaced: false,
            })
        }
        ImportAction::Replace { id } => {
            let existing = store
                .get(user_id, I::KIND, id)
                .await
                .map_err(other)?
                .ok_or(AppError::NotFound(Resource::Plan))?;
            plan.is_active = existing.is_active;
            let write = PlanWrite::from_plan(&plan)?;
            let record = store
                .update(user_id, I::KIND, id, write)
                .await
                .map_err(name_taken(&plan.name, Some(id)))?
                .ok_or(AppError::NotFound(Resource::Plan))?;
            info!(%user_id, plan_id = %id, kind = %I::KIND, "plan replaced by import");
            Ok(Imported {
                plan: to_plan(record)?,
                replaced: true,
            })
        }
    }
}

/// File name, content type and bytes of a plan download.
pub async fn export<I: PlanItem>(
    store: &dyn PlanStore,
    user_id: Uuid,
    id: Uuid,
    format: FileFormat,
) -> AppResult<(String, &'static str, Vec<u8>)> {
    let plan: Plan<I> = get(store, user_id, id).await?;
    let bytes = export_plan(&plan, format)?;
    let filename = export_filename(I::KIND, &plan.name, format);
    Ok((filename, format.content_type(), bytes))
}
