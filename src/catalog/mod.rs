pub mod cache;
pub mod client;
pub mod dto;
mod filter;
mod handlers;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
