pub mod correlation;
pub mod dataset;
mod dto;
mod handlers;
mod repo;
mod services;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::analysis_routes()
}
