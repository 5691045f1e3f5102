use axum::http::StatusCode;
use lms_portal::models::{
    AdminDashboard, ForgotPasswordResponse, Gender, MentorRegisterRequest, Page, Role,
    StudentRegisterRequest, UpdateCourseRequest, UploadCategory,
};
use serde_json::json;

fn student(overrides: serde_json::Value) -> StudentRegisterRequest {
    let mut base = json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "gender": "female",
        "dob": "2001-12-10",
        "phoneNumber": "0700",
        "email": "  Ada@Example.COM ",
        "password": "x",
        "confirmPassword": "x"
    });
    for (k, v) in overrides.as_object().unwrap() {
        base[k] = v.clone();
    }
    serde_json::from_value(base).unwrap()
}

fn mentor(overrides: serde_json::Value) -> MentorRegisterRequest {
    let mut base = json!({
        "email": "grace@example.com",
        "password": "longenough",
        "confirmPassword": "longenough",
        "name": "Grace Hopper"
    });
    for (k, v) in overrides.as_object().unwrap() {
        base[k] = v.clone();
    }
    serde_json::from_value(base).unwrap()
}

// --- Student registration ---

#[test]
fn test_student_registration_normalizes_email() {
    let (email, password, profile) = student(json!({})).validate().unwrap();
    assert_eq!(email, "ada@example.com");
    assert_eq!(password, "x");
    assert_eq!(profile.gender, Some(Gender::Female));
    assert_eq!(profile.phone_number.as_deref(), Some("0700"));
}

#[test]
fn test_student_registration_accepts_snake_case_confirm() {
    let req: StudentRegisterRequest = serde_json::from_value(json!({
        "firstName": "A", "lastName": "B", "gender": "male", "dob": "2000-01-01",
        "phoneNumber": "1", "email": "a@b.io", "password": "p", "confirm_password": "p"
    }))
    .unwrap();
    assert!(req.validate().is_ok());
}

#[test]
fn test_student_registration_rejections() {
    let cases = [
        json!({ "confirmPassword": "y" }),
        json!({ "gender": "prefer_not_to_say" }),
        json!({ "phoneNumber": "   " }),
        json!({ "email": "not-an-email" }),
        json!({ "firstName": "" }),
        json!({ "photoKey": "uploads/student-document/a.pdf" }),
        json!({ "documentKey": "uploads/student-document/../../secret" }),
    ];
    for case in cases {
        let err = student(case.clone()).validate().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY, "{case}");
    }
}

#[test]
fn test_student_registration_accepts_matching_upload_keys() {
    let req = student(json!({
        "photoKey": "uploads/student-photo/1.png",
        "documentKey": "uploads/student-document/2.pdf"
    }));
    let (_, _, profile) = req.validate().unwrap();
    assert_eq!(profile.photo_key.as_deref(), Some("uploads/student-photo/1.png"));
}

// --- Mentor registration ---

#[test]
fn test_mentor_technologies_are_deduplicated() {
    let (_, _, profile) = mentor(json!({
        "technologies": ["Rust", " rust ", "", "Go", "GO", "Postgres"]
    }))
    .validate()
    .unwrap();
    assert_eq!(profile.technologies, vec!["Rust", "Go", "Postgres"]);
}

#[test]
fn test_mentor_registration_ranges() {
    let cases = [
        json!({ "password": "short", "confirmPassword": "short" }),
        json!({ "totalExperienceYears": 61 }),
        json!({ "totalExperienceMonths": 12 }),
        json!({ "availabilityHoursPerWeek": -1 }),
        json!({ "resumeKey": "uploads/student-photo/x.png" }),
        json!({ "name": "  " }),
    ];
    for case in cases {
        let err = mentor(case.clone()).validate().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY, "{case}");
    }

    let ok = mentor(json!({
        "totalExperienceYears": 60,
        "totalExperienceMonths": 11,
        "availabilityHoursPerWeek": 80,
        "preferredMode": "hybrid"
    }));
    assert!(ok.validate().is_ok());
}

// --- Enums & small types ---

#[test]
fn test_role_round_trips_through_text() {
    for role in Role::ALL {
        assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        assert_eq!(serde_json::to_value(role).unwrap(), json!(role.as_str()));
    }
    assert!("Admin".parse::<Role>().is_err());
    assert!("superuser".parse::<Role>().is_err());
}

#[test]
fn test_upload_categories() {
    assert!(UploadCategory::StudentPhoto.accepts("image/webp"));
    assert!(!UploadCategory::StudentPhoto.accepts("application/pdf"));
    assert!(UploadCategory::MentorResume.accepts("application/msword"));
    assert!(!UploadCategory::StudentDocument.accepts("image/png"));
    let parsed: UploadCategory = serde_json::from_value(json!("student-document")).unwrap();
    assert_eq!(parsed, UploadCategory::StudentDocument);
}

#[test]
fn test_page_bounds() {
    assert_eq!(Page::new(None, None).unwrap(), Page::default());
    assert!(Page::new(Some(-1), None).is_err());
    assert!(Page::new(None, Some(0)).is_err());
    assert!(Page::new(None, Some(101)).is_err());
    assert_eq!(Page::new(Some(40), Some(100)).unwrap().limit, 100);
}

#[test]
fn test_update_course_request_optionality() {
    let partial = UpdateCourseRequest {
        title: Some("New Title Only".to_string()),
        ..Default::default()
    };
    let json_output = serde_json::to_string(&partial).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    assert!(!json_output.contains("description"));
}

#[test]
fn test_forgot_password_response_omits_missing_token() {
    let response = ForgotPasswordResponse {
        message: "If the email exists, a reset link has been sent".to_string(),
        token: None,
    };
    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("token").is_none());
}

#[test]
fn test_dashboard_field_names() {
    let value = serde_json::to_value(AdminDashboard::default()).unwrap();
    for field in [
        "batches_completed_count",
        "students_hired",
        "no_of_students",
        "no_of_mentors",
    ] {
        assert_eq!(value[field], 0, "{field}");
    }
}
