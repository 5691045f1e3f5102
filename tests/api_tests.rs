use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use lms_portal::{
    AppConfig, AppState, MemoryRepository, MockStorageService, RolePolicy, create_router,
    config::Env,
    models::{NewUser, Role, TokenPair, User},
    password::hash_password,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
}

impl TestApp {
    fn new(env: Env) -> Self {
        Self::with_policy(env, RolePolicy::standard())
    }

    fn with_policy(env: Env, policy: RolePolicy) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let config = AppConfig {
            env,
            ..AppConfig::default()
        };
        let state = AppState::with_policy(
            repo.clone() as RepositoryState,
            Arc::new(MockStorageService::new()) as StorageState,
            config,
            policy,
        );
        let router = create_router(state.clone());
        TestApp {
            router,
            repo,
            state,
        }
    }

    async fn seed(&self, email: &str, password: &str, role: Role) -> User {
        self.repo
            .create_user(NewUser {
                email: email.to_string(),
                full_name: Some(email.to_string()),
                phone_number: None,
                password_hash: hash_password(password).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    fn token_for(&self, user: &User) -> String {
        self.state
            .tokens
            .issue_pair(user.id, &user.role)
            .unwrap()
            .access_token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

fn student_payload(email: &str, password: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "gender": "female",
        "dob": "2001-12-10",
        "phoneNumber": "+44 7000 000000",
        "email": email,
        "password": password,
        "confirmPassword": password,
        "courseInterest": "Rust"
    })
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    app.send(
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

// --- Public surface ---

#[tokio::test]
async fn test_health_and_root() {
    let app = TestApp::new(Env::Production);

    let (status, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new(Env::Production);
    let (status, body) = app
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

// --- Registration & login ---

#[tokio::test]
async fn test_register_login_me_flow() {
    let app = TestApp::new(Env::Production);

    let (status, user) = app
        .send(
            Method::POST,
            "/auth/register/student",
            None,
            Some(student_payload("Ada@Example.com", "pw")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "student");

    let (status, tokens) = login(&app, "ada@example.com", "pw").await;
    assert_eq!(status, StatusCode::OK);
    let pair: TokenPair = serde_json::from_value(tokens).unwrap();
    assert_eq!(pair.token_type, "bearer");

    let (status, me) = app
        .send(Method::GET, "/users/me", Some(&pair.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "ada@example.com");
    assert_eq!(me["studentProfile"]["firstName"], "Ada");
    assert!(me["mentorProfile"].is_null());
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let app = TestApp::new(Env::Production);
    let payload = student_payload("dup@example.com", "pw");

    let (status, _) = app
        .send(Method::POST, "/auth/register/student", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::POST, "/auth/register/student", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test]
async fn test_mentor_registration_validates_password_length() {
    let app = TestApp::new(Env::Production);
    let (status, _) = app
        .send(
            Method::POST,
            "/auth/register/mentor",
            None,
            Some(json!({
                "email": "m@example.com",
                "password": "short",
                "confirmPassword": "short",
                "name": "Grace"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_inactive() {
    let app = TestApp::new(Env::Production);
    let user = app.seed("s@example.com", "right", Role::Student).await;

    let (status, body) = login(&app, "s@example.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid credentials");

    app.repo.set_active(user.id, false).await.unwrap();
    let (status, _) = login(&app, "s@example.com", "right").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let app = TestApp::new(Env::Production);
    app.seed("r@example.com", "pw", Role::Student).await;
    let (_, tokens) = login(&app, "r@example.com", "pw").await;
    let pair: TokenPair = serde_json::from_value(tokens).unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": pair.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    // An access token is not a refresh token.
    let (status, body) = app
        .send(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": pair.access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid refresh token");
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = TestApp::new(Env::Local);
    app.seed("f@example.com", "old-password", Role::Student).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/forgot",
            None,
            Some(json!({ "email": "f@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/reset",
            None,
            Some(json!({ "token": token, "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset successful");

    let (status, _) = login(&app, "f@example.com", "brand-new-pass").await;
    assert_eq!(status, StatusCode::OK);

    // Tokens are single-use.
    let (status, body) = app
        .send(
            Method::POST,
            "/auth/reset",
            None,
            Some(json!({ "token": token, "new_password": "another-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid or expired token");
}

#[tokio::test]
async fn test_forgot_password_hides_token_in_production() {
    let app = TestApp::new(Env::Production);
    app.seed("p@example.com", "pw", Role::Student).await;

    let (status, known) = app
        .send(
            Method::POST,
            "/auth/forgot",
            None,
            Some(json!({ "email": "p@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(known.get("token").is_none());

    let (_, unknown) = app
        .send(
            Method::POST,
            "/auth/forgot",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;
    assert_eq!(known, unknown);
}

// --- Access gate through the router ---

#[tokio::test]
async fn test_protected_routes_require_identity() {
    let app = TestApp::new(Env::Production);

    for uri in ["/users/me", "/courses", "/admin/dashboard"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body["detail"].is_string());
    }

    let (status, _) = app
        .send(Method::GET, "/users/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_course_ownership_rules() {
    let app = TestApp::new(Env::Production);
    let mentor = app.seed("mentor@example.com", "pw", Role::Mentor).await;
    let other = app.seed("other@example.com", "pw", Role::Mentor).await;
    let student = app.seed("student@example.com", "pw", Role::Student).await;
    let admin = app.seed("admin@example.com", "pw", Role::Admin).await;

    let (status, course) = app
        .send(
            Method::POST,
            "/courses",
            Some(&app.token_for(&mentor)),
            Some(json!({ "title": "Intro to Rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["mentor_id"], mentor.id.to_string());
    let course_uri = format!("/courses/{}", course["id"].as_str().unwrap());

    // Students can read but not delete.
    let (status, _) = app
        .send(Method::GET, &course_uri, Some(&app.token_for(&student)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::DELETE, &course_uri, Some(&app.token_for(&student)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Students cannot create courses at all.
    let (status, _) = app
        .send(
            Method::POST,
            "/courses",
            Some(&app.token_for(&student)),
            Some(json!({ "title": "Nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Another mentor cannot edit it; the owner can.
    let update = json!({ "title": "Rust 101" });
    let (status, _) = app
        .send(Method::PUT, &course_uri, Some(&app.token_for(&other)), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, updated) = app
        .send(Method::PUT, &course_uri, Some(&app.token_for(&mentor)), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Rust 101");

    // A mentor cannot create a course on someone else's behalf.
    let (status, _) = app
        .send(
            Method::POST,
            "/courses",
            Some(&app.token_for(&other)),
            Some(json!({ "title": "Hijack", "mentor_id": mentor.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin can delete anything.
    let (status, _) = app
        .send(Method::DELETE, &course_uri, Some(&app.token_for(&admin)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(Method::GET, &course_uri, Some(&app.token_for(&admin)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrollment_lifecycle() {
    let app = TestApp::new(Env::Production);
    let mentor = app.seed("mentor@example.com", "pw", Role::Mentor).await;
    let student = app.seed("student@example.com", "pw", Role::Student).await;
    let classmate = app.seed("classmate@example.com", "pw", Role::Student).await;
    let course = app
        .repo
        .create_course("Systems", None, mentor.id)
        .await
        .unwrap();
    let enroll_uri = format!("/courses/{}/enrollments", course.id);
    let student_token = app.token_for(&student);

    let (status, enrollment) = app
        .send(Method::POST, &enroll_uri, Some(&student_token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(enrollment["student_id"], student.id.to_string());

    let (status, _) = app
        .send(Method::POST, &enroll_uri, Some(&student_token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A student cannot enroll someone else.
    let (status, _) = app
        .send(
            Method::POST,
            &enroll_uri,
            Some(&student_token),
            Some(json!({ "student_id": classmate.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The course's mentor sees the roster; students do not.
    let (status, roster) = app
        .send(Method::GET, &enroll_uri, Some(&app.token_for(&mentor)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 1);
    let (status, _) = app
        .send(Method::GET, &enroll_uri, Some(&student_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, mine) = app
        .send(Method::GET, "/me/enrollments", Some(&student_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Only the enrolled student can drop the enrollment.
    let drop_uri = format!("/enrollments/{}", enrollment["id"].as_str().unwrap());
    let (status, _) = app
        .send(Method::DELETE, &drop_uri, Some(&app.token_for(&classmate)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(Method::DELETE, &drop_uri, Some(&student_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_student_directory_is_scoped() {
    let app = TestApp::new(Env::Production);
    for (i, email) in ["a@example.com", "b@example.com"].iter().enumerate() {
        let (status, _) = app
            .send(
                Method::POST,
                "/auth/register/student",
                None,
                Some(student_payload(email, &format!("pw{i}"))),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let a = app
        .repo
        .find_user_by_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    let mentor = app.seed("m@example.com", "pw", Role::Mentor).await;

    let (status, own) = app
        .send(Method::GET, "/students", Some(&app.token_for(&a)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let own = own.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["user"]["email"], "a@example.com");

    let (status, all) = app
        .send(Method::GET, "/students", Some(&app.token_for(&mentor)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(
            Method::GET,
            "/students?limit=1000",
            Some(&app.token_for(&mentor)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// --- Admin surface ---

#[tokio::test]
async fn test_admin_dashboard_and_forbidden_for_others() {
    let app = TestApp::new(Env::Production);
    let admin = app.seed("admin@example.com", "pw", Role::Admin).await;
    let mentor = app.seed("mentor@example.com", "pw", Role::Mentor).await;
    let student = app.seed("student@example.com", "pw", Role::Student).await;

    for user in [&mentor, &student] {
        let (status, body) = app
            .send(Method::GET, "/admin/dashboard", Some(&app.token_for(user)), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["detail"].is_string());
    }

    let (status, body) = app
        .send(Method::GET, "/admin/dashboard", Some(&app.token_for(&admin)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["no_of_students"], 1);
    assert_eq!(body["no_of_mentors"], 1);
    assert_eq!(body["students_hired"], 0);
}

#[tokio::test]
async fn test_role_change_takes_effect_on_next_request() {
    let app = TestApp::new(Env::Production);
    let admin = app.seed("admin@example.com", "pw", Role::Admin).await;
    let student = app.seed("student@example.com", "pw", Role::Student).await;
    let student_token = app.token_for(&student);
    let role_uri = format!("/admin/users/{}/role", student.id);

    // Nobody promotes themselves.
    let (status, _) = app
        .send(
            Method::PATCH,
            &role_uri,
            Some(&student_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/courses",
            Some(&student_token),
            Some(json!({ "title": "Before" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PATCH,
            &role_uri,
            Some(&app.token_for(&admin)),
            Some(json!({ "role": "mentor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "mentor");

    // Same token, new role.
    let (status, _) = app
        .send(
            Method::POST,
            "/courses",
            Some(&student_token),
            Some(json!({ "title": "After" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_role_tag_is_denied() {
    let app = TestApp::new(Env::Production);
    let user = app.seed("odd@example.com", "pw", Role::Student).await;
    app.repo.force_role_tag(user.id, "superuser").await;
    let token = app.token_for(&user);

    // Authenticated, but no grants at all.
    let (status, _) = app.send(Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::GET, "/courses", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_mentor_and_deletes_user() {
    let app = TestApp::new(Env::Production);
    let admin = app.seed("admin@example.com", "pw", Role::Admin).await;
    let admin_token = app.token_for(&admin);

    let (status, mentor) = app
        .send(
            Method::POST,
            "/admin/create-mentor",
            Some(&admin_token),
            Some(json!({ "email": "New.Mentor@example.com", "password": "longenough" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(mentor["role"], "mentor");
    assert_eq!(mentor["email"], "new.mentor@example.com");

    let (status, _) = login(&app, "new.mentor@example.com", "longenough").await;
    assert_eq!(status, StatusCode::OK);

    let mentor_id = mentor["id"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/users/{mentor_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/users/{}", Uuid::new_v4()),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batches_and_hires_feed_dashboard() {
    let app = TestApp::new(Env::Production);
    let admin = app.seed("admin@example.com", "pw", Role::Admin).await;
    let mentor = app.seed("mentor@example.com", "pw", Role::Mentor).await;
    let student = app.seed("student@example.com", "pw", Role::Student).await;
    let admin_token = app.token_for(&admin);

    let (status, batch) = app
        .send(
            Method::POST,
            "/admin/batches",
            Some(&admin_token),
            Some(json!({
                "batch_name": "Spring",
                "no_of_students": 12,
                "start_date": "2025-01-06",
                "completion_date": "2025-04-25",
                "mentor_id": mentor.id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let status_uri = format!("/admin/batches/{}/status", batch["id"].as_str().unwrap());

    // Mentors only read their batches.
    let (status, closed) = app
        .send(
            Method::PATCH,
            &status_uri,
            Some(&app.token_for(&mentor)),
            Some(json!({ "status": "Completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(closed["detail"].is_string());

    let (status, _) = app
        .send(
            Method::PATCH,
            &status_uri,
            Some(&admin_token),
            Some(json!({ "status": "Completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, mine) = app
        .send(Method::GET, "/admin/batches", Some(&app.token_for(&mentor)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let hire = json!({
        "user_id": student.id,
        "fullname": "Student One",
        "email": "student@example.com",
        "hired_company": "Acme",
        "hired_date": "2025-05-01"
    });
    let (status, _) = app
        .send(Method::POST, "/admin/hires", Some(&admin_token), Some(hire.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send(Method::POST, "/admin/hires", Some(&admin_token), Some(hire))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, dashboard) = app
        .send(Method::GET, "/admin/dashboard", Some(&admin_token), None)
        .await;
    assert_eq!(dashboard["batches_completed_count"], 1);
    assert_eq!(dashboard["students_hired"], 1);
}

// --- Uploads ---

#[tokio::test]
async fn test_presigned_upload_url() {
    let app = TestApp::new(Env::Production);

    let (status, body) = app
        .send(
            Method::POST,
            "/upload/presigned",
            None,
            Some(json!({
                "category": "mentor-resume",
                "filename": "cv.pdf",
                "file_type": "application/pdf"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let key = body["resource_key"].as_str().unwrap();
    assert!(key.starts_with("uploads/mentor-resume/"));
    assert!(key.ends_with(".pdf"));
    assert!(body["upload_url"].as_str().unwrap().contains(key));

    let (status, _) = app
        .send(
            Method::POST,
            "/upload/presigned",
            None,
            Some(json!({
                "category": "student-photo",
                "filename": "cv.pdf",
                "file_type": "application/pdf"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// --- Mentor directory ---

async fn register_mentor(app: &TestApp, email: &str, name: &str, years: i32, technologies: &[&str]) {
    let (status, _) = app
        .send(
            Method::POST,
            "/auth/register/mentor",
            None,
            Some(json!({
                "email": email,
                "password": "longenough",
                "confirmPassword": "longenough",
                "name": name,
                "totalExperienceYears": years,
                "technologies": technologies
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_mentor_directory_filters() {
    let app = TestApp::new(Env::Production);
    register_mentor(&app, "ada@mentors.io", "Ada Byron", 10, &["Rust"]).await;
    register_mentor(&app, "grace@mentors.io", "Grace Hopper", 2, &["Go"]).await;
    register_mentor(&app, "linus@mentors.io", "Linus Kernel", 5, &["rust", "Postgres"]).await;
    let student = app.seed("reader@example.com", "pw", Role::Student).await;
    let token = app.token_for(&student);

    let list = async |query: &str| {
        app.send(Method::GET, &format!("/mentors{query}"), Some(&token), None)
            .await
    };

    let (status, body) = list("").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Linus Kernel", "Grace Hopper", "Ada Byron"]);

    let (_, body) = list("?technology=RUST").await;
    assert_eq!(names(&body), ["Linus Kernel", "Ada Byron"]);

    let (_, body) = list("?min_years=5").await;
    assert_eq!(names(&body), ["Linus Kernel", "Ada Byron"]);

    let (_, body) = list("?technology=rust&min_years=6").await;
    assert_eq!(names(&body), ["Ada Byron"]);

    let (_, body) = list("?search=HOPPER").await;
    assert_eq!(names(&body), ["Grace Hopper"]);

    let (_, body) = list("?search=_").await;
    assert!(names(&body).is_empty());

    let (_, body) = list("?skip=1&limit=1").await;
    assert_eq!(names(&body), ["Grace Hopper"]);

    let (status, body) = list("?limit=0").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_mentor_directory_own_scope_lists_only_caller() {
    let policy = RolePolicy::from_json(
        r#"{"grants":[{"role":"mentor","resource":"mentor","operations":["read"],"scope":"own"}]}"#,
    )
    .unwrap();
    let app = TestApp::with_policy(Env::Production, policy);
    register_mentor(&app, "ada@mentors.io", "Ada Byron", 10, &["Rust"]).await;
    register_mentor(&app, "grace@mentors.io", "Grace Hopper", 2, &["Go"]).await;

    let (status, tokens) = login(&app, "grace@mentors.io", "longenough").await;
    assert_eq!(status, StatusCode::OK);
    let token = tokens["access_token"].as_str().unwrap();

    let (status, body) = app
        .send(Method::GET, "/mentors?technology=rust", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Grace Hopper"]);
}

// --- Gate ordering & error bodies ---

#[tokio::test]
async fn test_ungranted_operation_is_forbidden_even_for_missing_records() {
    let app = TestApp::new(Env::Production);
    let student = app.seed("nosy@example.com", "pw", Role::Student).await;
    let mentor = app.seed("mentor@example.com", "pw", Role::Mentor).await;
    let student_token = app.token_for(&student);
    let missing = Uuid::new_v4();

    let (status, _) = app
        .send(Method::DELETE, &format!("/courses/{missing}"), Some(&student_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/courses/{missing}"),
            Some(&student_token),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/admin/batches/{missing}/status"),
            Some(&student_token),
            Some(json!({ "status": "Completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A role holding the grant still learns the record is absent.
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/courses/{missing}"),
            Some(&app.token_for(&mentor)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_input_gets_detail_body() {
    let app = TestApp::new(Env::Production);
    let student = app.seed("shape@example.com", "pw", Role::Student).await;
    let token = app.token_for(&student);

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "shape@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("password"));

    let (status, body) = app
        .send(Method::GET, "/courses/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, body) = app
        .send(Method::GET, "/students?limit=abc", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}
