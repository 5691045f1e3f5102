use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod tokens;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{Identity, IdentityResolver, ResolverState, TokenResolver};
pub use config::AppConfig;
pub use error::AppError;
pub use gate::{AccessGate, AccessRequest, Decision};
pub use policy::{PolicyError, RolePolicy};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use tokens::TokenKeys;

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`, with Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::root, handlers::auth::register_student, handlers::auth::register_mentor,
        handlers::auth::login, handlers::auth::refresh, handlers::auth::forgot_password,
        handlers::auth::reset_password, handlers::uploads::get_presigned_url,
        handlers::users::get_me, handlers::users::get_user, handlers::users::list_students,
        handlers::users::get_student, handlers::users::student_details,
        handlers::users::list_mentors, handlers::users::get_mentor,
        handlers::courses::list_courses, handlers::courses::create_course,
        handlers::courses::get_course, handlers::courses::update_course,
        handlers::courses::delete_course, handlers::courses::course_enrollments,
        handlers::courses::enroll, handlers::courses::delete_enrollment,
        handlers::courses::my_enrollments,
        handlers::admin::create_mentor, handlers::admin::get_dashboard,
        handlers::admin::change_role, handlers::admin::delete_user,
        handlers::admin::list_batches, handlers::admin::create_batch,
        handlers::admin::update_batch_status, handlers::admin::list_hires,
        handlers::admin::create_hire
    ),
    components(
        schemas(
            models::Role, models::Gender, models::Mode, models::UserOut, models::StudentOut,
            models::MentorOut, models::MeResponse, models::TokenPair, models::LoginRequest,
            models::RefreshRequest, models::ForgotPasswordRequest,
            models::ForgotPasswordResponse, models::ResetPasswordRequest,
            models::MessageResponse, models::StudentRegisterRequest,
            models::MentorRegisterRequest, models::CreateMentorRequest,
            models::RoleChangeRequest, models::Course, models::CreateCourseRequest,
            models::UpdateCourseRequest, models::Enrollment, models::CreateEnrollmentRequest,
            models::Batch, models::CreateBatchRequest, models::UpdateBatchStatusRequest,
            models::Hire, models::CreateHireRequest, models::AdminDashboard,
            models::UploadCategory, models::PresignedUrlRequest, models::PresignedUrlResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "lms-portal", description = "LMS Portal API")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` (JWT) scheme referenced by the authenticated paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// AppState
///
/// Unified state shared by every request. All members are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
    /// Signing keys for access and refresh tokens.
    pub tokens: TokenKeys,
    pub resolver: ResolverState,
    pub gate: AccessGate,
}

impl AppState {
    /// new
    ///
    /// Wires the token resolver and the gate. The policy is the built-in table unless
    /// `config.policy_file` names a replacement.
    pub fn new(
        repo: RepositoryState,
        storage: StorageState,
        config: AppConfig,
    ) -> Result<Self, PolicyError> {
        let policy = RolePolicy::load(config.policy_file.as_deref())?;
        Ok(Self::with_policy(repo, storage, config, policy))
    }

    pub fn with_policy(
        repo: RepositoryState,
        storage: StorageState,
        config: AppConfig,
        policy: RolePolicy,
    ) -> Self {
        let tokens = TokenKeys::from_config(&config);
        let resolver: ResolverState = Arc::new(TokenResolver::new(repo.clone(), tokens.clone()));
        Self {
            repo,
            storage,
            config,
            tokens,
            resolver,
            gate: AccessGate::new(policy),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for ResolverState {
    fn from_ref(app_state: &AppState) -> ResolverState {
        app_state.resolver.clone()
    }
}

/// auth_middleware
///
/// Resolves the caller before any protected handler runs. A request without a usable
/// identity is answered with 401 here; otherwise the identity is stored in the request
/// extensions for the handler's `Identity` extractor.
async fn auth_middleware(identity: Identity, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// create_router
///
/// Assembles public, authenticated and admin routes with the shared observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the `x-request-id` set by `SetRequestIdLayer`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
