use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod flash;
pub mod forms;
pub mod handlers;
pub mod session;

/// Server-rendered form surface: session-cookie authentication, mutations as
/// redirect-with-flash, read endpoints returning the view model. Gated by
/// [`session::web_gate`] in the app assembly.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/auth/login", get(handlers::login_page).post(handlers::login_form))
        .route(
            "/auth/register",
            get(handlers::register_page).post(handlers::register_form),
        )
        .route("/auth/logout", get(handlers::logout))
        .route("/health-records/add", post(handlers::add_record))
        .route("/health-records/edit", post(handlers::edit_record))
        .route("/health-records/delete", post(handlers::delete_record))
        .route(
            "/health-records/edit-photo",
            post(handlers::edit_photo)
                // Leaves room for multipart framing; the 5 MiB photo limit
                // itself is enforced by the attachment flow.
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/health-records/photo/:filename", get(handlers::photo))
        .route("/health-records/:id", get(handlers::record_detail))
}
