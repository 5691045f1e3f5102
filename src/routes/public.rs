use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without credentials.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::auth::root))
        // Load balancer probe.
        .route("/health", get(|| async { "ok" }))
        .route(
            "/auth/register/student",
            post(handlers::auth::register_student),
        )
        .route("/auth/register/mentor", post(handlers::auth::register_mentor))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/forgot", post(handlers::auth::forgot_password))
        .route("/auth/reset", post(handlers::auth::reset_password))
        // Registration uploads happen before an account exists.
        .route(
            "/upload/presigned",
            post(handlers::uploads::get_presigned_url),
        )
}
