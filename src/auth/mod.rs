use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod context;
mod dto;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
