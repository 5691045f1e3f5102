use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::required_text;
use crate::{
    AppState,
    auth::Identity,
    error::AppError,
    extract::{Json, Path, Query},
    gate::AccessRequest,
    models::{
        Course, CreateCourseRequest, CreateEnrollmentRequest, Enrollment, ListQuery,
        UpdateCourseRequest,
    },
    policy::{Operation, Resource, Scope},
};

async fn load_course(state: &AppState, id: Uuid) -> Result<Course, AppError> {
    state
        .repo
        .get_course(id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))
}

/// list_courses
///
/// [Authenticated Route] Course catalog, newest first. Own-scoped callers see only the
/// courses they teach.
#[utoipa::path(
    get,
    path = "/courses",
    params(ListQuery),
    responses((status = 200, description = "Courses", body = [Course])),
    security(("bearer_auth" = []))
)]
pub async fn list_courses(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Course>>, AppError> {
    let scope = state
        .gate
        .authorize(&identity, AccessRequest::new(Resource::Course, Operation::Read))?;
    let mentor = (scope == Scope::Own).then_some(identity.id);
    Ok(Json(state.repo.list_courses(query.page()?, mentor).await?))
}

/// create_course
///
/// [Authenticated Route] Creates a course. The owning mentor defaults to the caller;
/// naming another mentor needs `any` scope.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Invalid payload")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_course(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let mentor_id = payload.mentor_id.unwrap_or(identity.id);
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::Course, Operation::Create).owned_by(mentor_id),
    )?;

    let title = required_text("title", &payload.title)?;
    if state.repo.find_user(mentor_id).await?.is_none() {
        return Err(AppError::validation("mentor_id does not name a user"));
    }

    let course = state
        .repo
        .create_course(&title, payload.description.as_deref(), mentor_id)
        .await?;

    tracing::info!(course_id = %course.id, mentor_id = %mentor_id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_course(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let request = AccessRequest::new(Resource::Course, Operation::Read);
    state.gate.authorize(&identity, request)?;
    let course = load_course(&state, id).await?;
    state
        .gate
        .authorize(&identity, request.owned_by(course.mentor_id))?;
    Ok(Json(course))
}

/// update_course
///
/// [Authenticated Route] Partial update; absent fields are left alone.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the owning mentor"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_course(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let request = AccessRequest::new(Resource::Course, Operation::Update);
    state.gate.authorize(&identity, request)?;
    let course = load_course(&state, id).await?;
    state
        .gate
        .authorize(&identity, request.owned_by(course.mentor_id))?;

    if let Some(title) = payload.title.as_deref() {
        payload.title = Some(required_text("title", title)?);
    }

    let updated = state
        .repo
        .update_course(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_course(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let request = AccessRequest::new(Resource::Course, Operation::Delete);
    state.gate.authorize(&identity, request)?;
    let course = load_course(&state, id).await?;
    state
        .gate
        .authorize(&identity, request.owned_by(course.mentor_id))?;

    if !state.repo.delete_course(id).await? {
        return Err(AppError::not_found("Course not found"));
    }
    tracing::info!(course_id = %id, user_id = %identity.id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// course_enrollments
///
/// [Authenticated Route] Roster of a course. Owned by the course's mentor.
#[utoipa::path(
    get,
    path = "/courses/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollments", body = [Enrollment]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn course_enrollments(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let request = AccessRequest::new(Resource::Enrollment, Operation::Read);
    state.gate.authorize(&identity, request)?;
    let course = load_course(&state, id).await?;
    state
        .gate
        .authorize(&identity, request.owned_by(course.mentor_id))?;
    Ok(Json(state.repo.course_enrollments(id).await?))
}

/// enroll
///
/// [Authenticated Route] Enrolls a student in a course. The student defaults to the
/// caller; enrolling someone else needs `any` scope.
#[utoipa::path(
    post,
    path = "/courses/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Course or student not found"),
        (status = 409, description = "Already enrolled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn enroll(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let student_id = payload.student_id.unwrap_or(identity.id);
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::Enrollment, Operation::Create).owned_by(student_id),
    )?;

    load_course(&state, id).await?;
    if state.repo.find_user(student_id).await?.is_none() {
        return Err(AppError::not_found("Student not found"));
    }

    let enrollment = state.repo.enroll(id, student_id).await?;
    tracing::info!(course_id = %id, student_id = %student_id, "Student enrolled");
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    delete,
    path = "/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment id")),
    responses(
        (status = 204, description = "Unenrolled"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_enrollment(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let request = AccessRequest::new(Resource::Enrollment, Operation::Delete);
    state.gate.authorize(&identity, request)?;
    let enrollment = state
        .repo
        .get_enrollment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment not found"))?;
    state
        .gate
        .authorize(&identity, request.owned_by(enrollment.student_id))?;

    if !state.repo.delete_enrollment(id).await? {
        return Err(AppError::not_found("Enrollment not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// my_enrollments
///
/// [Authenticated Route] The caller's own enrollments.
#[utoipa::path(
    get,
    path = "/me/enrollments",
    responses((status = 200, description = "Enrollments", body = [Enrollment])),
    security(("bearer_auth" = []))
)]
pub async fn my_enrollments(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    state.gate.authorize(
        &identity,
        AccessRequest::new(Resource::Enrollment, Operation::Read).owned_by(identity.id),
    )?;
    Ok(Json(state.repo.student_enrollments(identity.id).await?))
}
