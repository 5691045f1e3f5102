use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{email_taken, require_any, required_text};
use crate::{
    AppState,
    auth::Identity,
    error::AppError,
    extract::{Json, Path},
    gate::AccessRequest,
    models::{
        AdminDashboard, Batch, CreateBatchRequest, CreateHireRequest, CreateMentorRequest, Hire,
        NewUser, Role, RoleChangeRequest, UpdateBatchStatusRequest, UserOut, normalize_email,
    },
    password::hash_password,
    policy::{Operation, Resource, Scope},
};

/// create_mentor
///
/// [Admin Route] Creates a mentor account without a profile. The mentor completes the
/// profile later.
#[utoipa::path(
    post,
    path = "/admin/create-mentor",
    request_body = CreateMentorRequest,
    responses(
        (status = 201, description = "Mentor account created", body = UserOut),
        (status = 400, description = "Email already registered"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_mentor(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateMentorRequest>,
) -> Result<(StatusCode, Json<UserOut>), AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::User, Operation::Create))?;
    require_any(scope)?;

    let email = normalize_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("password hashing: {e}")))?;

    let user = state
        .repo
        .create_user(NewUser {
            email,
            full_name: payload.full_name,
            phone_number: payload.phone_number,
            password_hash,
            role: Role::Mentor,
        })
        .await
        .map_err(email_taken)?;

    tracing::info!(user_id = %user.id, created_by = %identity.id, "Mentor account created");
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

/// get_dashboard
///
/// [Admin Route] Live counters: completed batches, hired students, students and mentors.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminDashboard),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboard>, AppError> {
    state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Dashboard, Operation::Read))?;
    Ok(Json(state.repo.dashboard().await?))
}

/// change_role
///
/// [Admin Route] Replaces a user's role. Needs `any` scope on user updates, so nobody can
/// promote themselves through an `own` grant. Takes effect on the next request.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Role changed", body = UserOut),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleChangeRequest>,
) -> Result<Json<UserOut>, AppError> {
    let scope = state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::User, Operation::Update).owned_by(id),
    )?;
    require_any(scope)?;

    let user = state
        .repo
        .set_role(id, payload.role)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = %id, role = %payload.role, changed_by = %identity.id, "Role changed");
    Ok(Json(UserOut::from(user)))
}

/// delete_user
///
/// [Admin Route] Removes an account with its profiles, enrollments and reset tokens.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::User, Operation::Delete).owned_by(id),
    )?;

    if !state.repo.delete_user(id).await? {
        return Err(AppError::not_found("User not found"));
    }
    tracing::info!(user_id = %id, deleted_by = %identity.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// list_batches
///
/// [Admin Route] All batches, or only the caller's with `own` scope.
#[utoipa::path(
    get,
    path = "/admin/batches",
    responses((status = 200, description = "Batches", body = [Batch])),
    security(("bearer_auth" = []))
)]
pub async fn list_batches(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Batch>>, AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Batch, Operation::Read))?;
    let mentor = (scope == Scope::Own).then_some(identity.id);
    Ok(Json(state.repo.list_batches(mentor).await?))
}

#[utoipa::path(
    post,
    path = "/admin/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = Batch),
        (status = 422, description = "Invalid payload")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_batch(
    identity: Identity,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<Batch>), AppError> {
    let mut request = AccessRequest::new(Resource::Batch, Operation::Create);
    request.owner = payload.mentor_id;
    state.gate.authorize(&identity, request)?;

    payload.batch_name = required_text("batch_name", &payload.batch_name)?;
    if payload.no_of_students < 0 {
        return Err(AppError::validation("no_of_students must be >= 0"));
    }
    if payload.completion_date < payload.start_date {
        return Err(AppError::validation(
            "completion_date must not precede start_date",
        ));
    }

    let batch = state.repo.create_batch(payload).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

#[utoipa::path(
    patch,
    path = "/admin/batches/{id}/status",
    params(("id" = Uuid, Path, description = "Batch id")),
    request_body = UpdateBatchStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Batch),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_batch_status(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBatchStatusRequest>,
) -> Result<Json<Batch>, AppError> {
    let mut request = AccessRequest::new(Resource::Batch, Operation::Update);
    state.gate.authorize(&identity, request)?;
    let batch = state
        .repo
        .get_batch(id)
        .await?
        .ok_or_else(|| AppError::not_found("Batch not found"))?;

    request.owner = batch.mentor_id;
    let scope = state.gate.authorize(&identity, request)?;
    // A batch without a mentor has no owner to match.
    if batch.mentor_id.is_none() {
        require_any(scope)?;
    }

    let status = required_text("status", &payload.status)?;
    let updated = state
        .repo
        .set_batch_status(id, &status)
        .await?
        .ok_or_else(|| AppError::not_found("Batch not found"))?;
    Ok(Json(updated))
}

/// list_hires
///
/// [Admin Route] Hire records; `own` scope sees only the caller's.
#[utoipa::path(
    get,
    path = "/admin/hires",
    responses((status = 200, description = "Hires", body = [Hire])),
    security(("bearer_auth" = []))
)]
pub async fn list_hires(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Hire>>, AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Hire, Operation::Read))?;

    let mut hires = state.repo.list_hires().await?;
    if scope == Scope::Own {
        hires.retain(|h| h.user_id == identity.id);
    }
    Ok(Json(hires))
}

#[utoipa::path(
    post,
    path = "/admin/hires",
    request_body = CreateHireRequest,
    responses(
        (status = 201, description = "Hire recorded", body = Hire),
        (status = 409, description = "Email already recorded")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_hire(
    identity: Identity,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateHireRequest>,
) -> Result<(StatusCode, Json<Hire>), AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::Hire, Operation::Create).owned_by(payload.user_id),
    )?;

    payload.fullname = required_text("fullname", &payload.fullname)?;
    payload.hired_company = required_text("hired_company", &payload.hired_company)?;
    payload.email = normalize_email(&payload.email)?;
    if state.repo.find_user(payload.user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let hire = state.repo.create_hire(payload).await?;
    tracing::info!(hire_id = %hire.id, user_id = %hire.user_id, "Hire recorded");
    Ok((StatusCode::CREATED, Json(hire)))
}
