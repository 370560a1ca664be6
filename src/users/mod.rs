use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
