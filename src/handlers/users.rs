use axum::extract::State;
use uuid::Uuid;

use crate::{
    AppState,
    auth::Identity,
    error::AppError,
    extract::{Json, Path, Query},
    gate::AccessRequest,
    models::{MeResponse, MentorOut, MentorQuery, ListQuery, Page, StudentOut, UserOut, non_blank},
    policy::{Operation, Resource, Scope},
    repository::{MentorFilter, StudentFilter},
};

async fn profile_bundle(state: &AppState, user_id: Uuid) -> Result<MeResponse, AppError> {
    let user = state
        .repo
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(MeResponse {
        user: UserOut::from(&user),
        student_profile: state.repo.student_by_user(user_id).await?,
        mentor_profile: state.repo.mentor_by_user(user_id).await?,
    })
}

/// get_me
///
/// [Authenticated Route] The caller's user record plus whichever profile they have.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::User, Operation::Read).owned_by(identity.id),
    )?;
    Ok(Json(profile_bundle(&state, identity.id).await?))
}

/// get_user
///
/// [Authenticated Route] Any user by id. Own-scoped callers only reach themselves.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = MeResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MeResponse>, AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::User, Operation::Read).owned_by(id),
    )?;
    Ok(Json(profile_bundle(&state, id).await?))
}

/// list_students
///
/// [Authenticated Route] Student directory. With `own` scope the listing holds at most
/// the caller's own profile.
#[utoipa::path(
    get,
    path = "/students",
    params(ListQuery),
    responses(
        (status = 200, description = "Students", body = [StudentOut]),
        (status = 422, description = "Bad paging parameters")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_students(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StudentOut>>, AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Student, Operation::Read))?;

    let filter = StudentFilter {
        search: query.search(),
        user_id: (scope == Scope::Own).then_some(identity.id),
        page: query.page()?,
    };
    Ok(Json(state.repo.list_students(filter).await?))
}

/// get_student
///
/// [Authenticated Route] One student profile by profile id.
#[utoipa::path(
    get,
    path = "/students/{id}",
    params(("id" = Uuid, Path, description = "Student profile id")),
    responses(
        (status = 200, description = "Student", body = StudentOut),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_student(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentOut>, AppError> {
    let request = AccessRequest::new(Resource::Student, Operation::Read);
    state.gate.authorize(&identity, request)?;
    let student = state
        .repo
        .get_student(id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    state
        .gate
        .authorize(&identity, request.owned_by(student.user.id))?;
    Ok(Json(student))
}

/// student_details
///
/// [Authenticated Route] The caller's own user record, for the student dashboard.
#[utoipa::path(
    get,
    path = "/student/details",
    responses((status = 200, description = "Current user", body = UserOut)),
    security(("bearer_auth" = []))
)]
pub async fn student_details(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserOut>, AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::Student, Operation::Read).owned_by(identity.id),
    )?;

    let user = state
        .repo
        .find_user(identity.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserOut::from(user)))
}

/// list_mentors
///
/// [Authenticated Route] Mentor directory with technology and experience filters.
#[utoipa::path(
    get,
    path = "/mentors",
    params(MentorQuery),
    responses((status = 200, description = "Mentors", body = [MentorOut])),
    security(("bearer_auth" = []))
)]
pub async fn list_mentors(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<MentorQuery>,
) -> Result<Json<Vec<MentorOut>>, AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Mentor, Operation::Read))?;
    let page = Page::new(query.skip, query.limit)?;

    if scope == Scope::Own {
        let own = state.repo.mentor_by_user(identity.id).await?;
        return Ok(Json(own.into_iter().collect()));
    }

    let filter = MentorFilter {
        search: non_blank(query.search.as_deref()),
        technology: non_blank(query.technology.as_deref()),
        min_years: query.min_years,
        page,
    };
    Ok(Json(state.repo.list_mentors(filter).await?))
}

/// get_mentor
///
/// [Authenticated Route] One mentor profile by profile id.
#[utoipa::path(
    get,
    path = "/mentors/{id}",
    params(("id" = Uuid, Path, description = "Mentor profile id")),
    responses(
        (status = 200, description = "Mentor", body = MentorOut),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_mentor(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MentorOut>, AppError> {
    let request = AccessRequest::new(Resource::Mentor, Operation::Read);
    state.gate.authorize(&identity, request)?;
    let mentor = state
        .repo
        .get_mentor(id)
        .await?
        .ok_or_else(|| AppError::not_found("Mentor not found"))?;

    state
        .gate
        .authorize(&identity, request.owned_by(mentor.user.id))?;
    Ok(Json(mentor))
}
