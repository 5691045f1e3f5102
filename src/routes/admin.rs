use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Admin Router Module
///
/// Nested under `/admin` and wrapped in the same auth middleware as the authenticated
/// routes. The resources behind these routes (dashboard, batches, hires, other users'
/// accounts) are granted to admins only by the default policy.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/create-mentor", post(handlers::admin::create_mentor))
        .route("/dashboard", get(handlers::admin::get_dashboard))
        .route("/users/{id}/role", patch(handlers::admin::change_role))
        .route("/users/{id}", delete(handlers::admin::delete_user))
        .route(
            "/batches",
            get(handlers::admin::list_batches).post(handlers::admin::create_batch),
        )
        .route(
            "/batches/{id}/status",
            patch(handlers::admin::update_batch_status),
        )
        .route(
            "/hires",
            get(handlers::admin::list_hires).post(handlers::admin::create_hire),
        )
}
