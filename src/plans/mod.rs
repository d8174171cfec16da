mod dto;
pub mod duplicates;
mod handlers;
pub mod items;
pub(crate) mod lenient;
pub mod model;
pub mod services;
pub mod store;
pub mod transfer;

use axum::Router;

use crate::state::AppState;
use items::{ExerciseItem, MealItem};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::plan_routes::<ExerciseItem>("/training-plans"))
        .merge(handlers::plan_routes::<MealItem>("/diet-plans"))
}
