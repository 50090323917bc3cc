pub mod dto;
pub mod guard;
pub mod handlers;
pub mod registration;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::event_routes()
}
