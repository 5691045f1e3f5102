use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Authenticated Router Module
///
/// Every route here runs behind `auth_middleware`, so handlers always receive a resolved
/// `Identity`. Whether that identity may act is decided inside each handler by the gate,
/// with the owner of the target record when one exists.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users & Profiles ---
        .route("/users/me", get(handlers::users::get_me))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/students", get(handlers::users::list_students))
        .route("/students/{id}", get(handlers::users::get_student))
        .route("/student/details", get(handlers::users::student_details))
        .route("/mentors", get(handlers::users::list_mentors))
        .route("/mentors/{id}", get(handlers::users::get_mentor))
        // --- Courses ---
        .route(
            "/courses",
            get(handlers::courses::list_courses).post(handlers::courses::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        )
        // --- Enrollments ---
        .route(
            "/courses/{id}/enrollments",
            get(handlers::courses::course_enrollments).post(handlers::courses::enroll),
        )
        .route(
            "/enrollments/{id}",
            delete(handlers::courses::delete_enrollment),
        )
        .route("/me/enrollments", get(handlers::courses::my_enrollments))
}
