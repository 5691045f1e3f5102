use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

// --- Role Tags ---

/// Role
///
/// The closed set of user types. Stored as lower-case text in `users.role`;
/// `mentor` is the instructor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Mentor,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Mentor, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "mentor" => Ok(Role::Mentor),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }
}

/// Preferred teaching mode of a mentor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Mode {
    Online,
    Offline,
    Hybrid,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Online => "online",
            Mode::Offline => "offline",
            Mode::Hybrid => "hybrid",
        }
    }
}

// --- Core Records (Mapped to Database) ---

/// User
///
/// The canonical identity record in `users`. Never serialized directly: the password hash
/// must not leave the service, responses use [`UserOut`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    // Argon2 PHC string.
    pub password_hash: String,
    // RBAC tag: 'admin', 'mentor' or 'student'.
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new `users` row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// UserOut
///
/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
        }
    }
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        UserOut::from(&user)
    }
}

/// StudentProfile
///
/// One row per student user in `student_profiles`.
#[derive(Debug, Clone, FromRow)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    // Object keys produced by the presigned upload flow.
    pub photo_key: Option<String>,
    pub document_key: Option<String>,
    pub course_interest: Option<String>,
    pub is_referred: bool,
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile columns of a student, before ids are assigned.
#[derive(Debug, Clone)]
pub struct NewStudentProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub photo_key: Option<String>,
    pub document_key: Option<String>,
    pub course_interest: Option<String>,
    pub is_referred: bool,
    pub referral_code: Option<String>,
}

/// MentorProfile
///
/// One row per mentor user in `mentor_profiles`. Technologies live in the
/// `mentor_technologies` link table.
#[derive(Debug, Clone, FromRow)]
pub struct MentorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub experience_summary: Option<String>,
    pub total_experience_years: Option<i32>,
    pub total_experience_months: Option<i32>,
    pub resume_key: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub preferred_mode: Option<String>,
    pub availability_hours_per_week: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMentorProfile {
    pub name: String,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub experience_summary: Option<String>,
    pub total_experience_years: Option<i32>,
    pub total_experience_months: Option<i32>,
    pub resume_key: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub preferred_mode: Option<Mode>,
    pub availability_hours_per_week: Option<i32>,
    pub technologies: Vec<String>,
}

// --- Profile Views (Output) ---

/// StudentOut
///
/// A student profile joined with its user record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentOut {
    pub id: Uuid,
    pub user: UserOut,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub course_interest: Option<String>,
    pub is_referred: bool,
    pub referral_code: Option<String>,
    pub photo_key: Option<String>,
    pub document_key: Option<String>,
}

impl StudentOut {
    pub fn new(profile: StudentProfile, user: &User) -> Self {
        Self {
            id: profile.id,
            user: UserOut::from(user),
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone_number: profile.phone_number,
            whatsapp_number: profile.whatsapp_number,
            dob: profile.dob,
            gender: profile.gender,
            address: profile.address,
            course_interest: profile.course_interest,
            is_referred: profile.is_referred,
            referral_code: profile.referral_code,
            photo_key: profile.photo_key,
            document_key: profile.document_key,
        }
    }
}

/// MentorOut
///
/// A mentor profile joined with its user record and technology names.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MentorOut {
    pub id: Uuid,
    pub user: UserOut,
    pub name: String,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub total_experience_years: Option<i32>,
    pub total_experience_months: Option<i32>,
    pub experience_summary: Option<String>,
    pub preferred_mode: Option<String>,
    pub availability_hours_per_week: Option<i32>,
    pub technologies: Vec<String>,
    pub resume_key: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

impl MentorOut {
    pub fn new(profile: MentorProfile, user: &User, technologies: Vec<String>) -> Self {
        Self {
            id: profile.id,
            user: UserOut::from(user),
            name: profile.name,
            phone_number: profile.phone_number,
            dob: profile.dob,
            gender: profile.gender,
            address: profile.address,
            total_experience_years: profile.total_experience_years,
            total_experience_months: profile.total_experience_months,
            experience_summary: profile.experience_summary,
            preferred_mode: profile.preferred_mode,
            availability_hours_per_week: profile.availability_hours_per_week,
            technologies,
            resume_key: profile.resume_key,
            linkedin_url: profile.linkedin_url,
            portfolio_url: profile.portfolio_url,
        }
    }
}

/// MeResponse
///
/// Combined payload for `GET /users/me` and `GET /users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MeResponse {
    pub user: UserOut,
    pub student_profile: Option<StudentOut>,
    pub mentor_profile: Option<MentorOut>,
}

// --- Auth Payloads ---

/// TokenPair
///
/// Returned by login and refresh. `token_type` is always "bearer".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// ForgotPasswordResponse
///
/// `token` is only populated in the local environment, where no mailer exists.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Registration Payloads (Input Schemas) ---

/// StudentRegisterRequest
///
/// Body of `POST /auth/register/student`. File uploads happen beforehand through
/// `/upload/presigned`; only the resulting object keys are sent here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentRegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub dob: NaiveDate,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: String,
    #[serde(default)]
    pub is_referred: bool,
    #[serde(default)]
    pub course_interest: Option<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub photo_key: Option<String>,
    #[serde(default)]
    pub document_key: Option<String>,
}

impl StudentRegisterRequest {
    /// Checks the payload and splits it into (normalized email, plaintext password, profile).
    pub fn validate(self) -> Result<(String, String, NewStudentProfile), AppError> {
        let email = normalize_email(&self.email)?;
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::validation("firstName and lastName are required"));
        }
        if self.gender == Gender::PreferNotToSay {
            return Err(AppError::validation(
                "gender must be one of male, female, other",
            ));
        }
        if self.phone_number.trim().is_empty() {
            return Err(AppError::validation("phoneNumber is required"));
        }
        check_passwords(&self.password, &self.confirm_password, 1)?;
        check_upload_key("photoKey", self.photo_key.as_deref(), UploadCategory::StudentPhoto)?;
        check_upload_key(
            "documentKey",
            self.document_key.as_deref(),
            UploadCategory::StudentDocument,
        )?;

        let profile = NewStudentProfile {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: Some(self.phone_number.trim().to_string()),
            whatsapp_number: self.whatsapp_number,
            dob: Some(self.dob),
            gender: Some(self.gender),
            address: self.address,
            photo_key: self.photo_key,
            document_key: self.document_key,
            course_interest: self.course_interest,
            is_referred: self.is_referred,
            referral_code: self.referral_code,
        };
        Ok((email, self.password, profile))
    }
}

/// MentorRegisterRequest
///
/// Body of `POST /auth/register/mentor`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MentorRegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub total_experience_years: Option<i32>,
    #[serde(default)]
    pub total_experience_months: Option<i32>,
    #[serde(default)]
    pub experience_summary: Option<String>,
    #[serde(default)]
    pub preferred_mode: Option<Mode>,
    #[serde(default)]
    pub availability_hours_per_week: Option<i32>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub resume_key: Option<String>,
}

impl MentorRegisterRequest {
    pub fn validate(self) -> Result<(String, String, NewMentorProfile), AppError> {
        let email = normalize_email(&self.email)?;
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        check_passwords(&self.password, &self.confirm_password, 8)?;
        check_upload_key("resumeKey", self.resume_key.as_deref(), UploadCategory::MentorResume)?;
        check_range("totalExperienceYears", self.total_experience_years, 0, 60)?;
        check_range("totalExperienceMonths", self.total_experience_months, 0, 11)?;
        check_range(
            "availabilityHoursPerWeek",
            self.availability_hours_per_week,
            0,
            80,
        )?;

        // Blank names dropped; duplicates collapse case-insensitively.
        let mut technologies: Vec<String> = Vec::new();
        for raw in self.technologies {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            if !technologies.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                technologies.push(name.to_string());
            }
        }

        let profile = NewMentorProfile {
            name: self.name.trim().to_string(),
            phone_number: self.phone_number,
            dob: self.dob,
            gender: self.gender,
            address: self.address,
            experience_summary: self.experience_summary,
            total_experience_years: self.total_experience_years,
            total_experience_months: self.total_experience_months,
            resume_key: self.resume_key,
            linkedin_url: self.linkedin_url,
            portfolio_url: self.portfolio_url,
            preferred_mode: self.preferred_mode,
            availability_hours_per_week: self.availability_hours_per_week,
            technologies,
        };
        Ok((email, self.password, profile))
    }
}

/// CreateMentorRequest
///
/// Admin-side mentor account creation (no profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateMentorRequest {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleChangeRequest {
    pub role: Role,
}

/// Lower-cases and trims an email, rejecting values without a usable '@'.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(email)
}

fn check_passwords(password: &str, confirm: &str, min_len: usize) -> Result<(), AppError> {
    if password.chars().count() < min_len {
        return Err(AppError::validation(format!(
            "password must be at least {min_len} characters"
        )));
    }
    if password != confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Upload keys must come from the presigned flow of the matching category.
fn check_upload_key(
    field: &str,
    key: Option<&str>,
    category: UploadCategory,
) -> Result<(), AppError> {
    let prefix = format!("uploads/{}/", category.prefix());
    match key {
        Some(key) if !key.starts_with(&prefix) || key.contains("..") => Err(AppError::validation(
            format!("{field} is not a {} upload", category.prefix()),
        )),
        _ => Ok(()),
    }
}

fn check_range(field: &str, value: Option<i32>, min: i32, max: i32) -> Result<(), AppError> {
    match value {
        Some(v) if v < min || v > max => Err(AppError::validation(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

// --- Courses & Enrollments ---

/// Course
///
/// A course in `courses`, owned by the mentor in `mentor_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub mentor_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateCourseRequest
///
/// `mentor_id` defaults to the caller; naming someone else needs `any` scope.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mentor_id: Option<Uuid>,
}

/// UpdateCourseRequest
///
/// Partial update: only provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Enrollment {
    pub id: Uuid,
    pub course_id: Uuid,
    // The enrolled student's user id.
    pub student_id: Uuid,
    #[ts(type = "string")]
    pub enrolled_at: DateTime<Utc>,
}

/// CreateEnrollmentRequest
///
/// `student_id` defaults to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEnrollmentRequest {
    #[serde(default)]
    pub student_id: Option<Uuid>,
}

// --- Batches, Hires & Dashboard ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Batch {
    pub id: Uuid,
    pub batch_name: String,
    pub no_of_students: i32,
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub status: Option<String>,
    pub mentor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateBatchRequest {
    pub batch_name: String,
    pub no_of_students: i32,
    pub start_date: NaiveDate,
    pub completion_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mentor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateBatchStatusRequest {
    pub status: String,
}

/// Batches with this status count as completed on the dashboard.
pub const BATCH_COMPLETED: &str = "Completed";

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Hire {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fullname: String,
    pub email: String,
    pub hired_company: String,
    pub hired_date: NaiveDate,
    pub batch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateHireRequest {
    pub user_id: Uuid,
    pub fullname: String,
    pub email: String,
    pub hired_company: String,
    pub hired_date: NaiveDate,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
}

/// AdminDashboard
///
/// Live counters for `GET /admin/dashboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboard {
    pub batches_completed_count: i64,
    pub students_hired: i64,
    pub no_of_students: i64,
    pub no_of_mentors: i64,
}

// --- Uploads ---

/// UploadCategory
///
/// What a registration upload is for; decides the key prefix and the accepted MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum UploadCategory {
    StudentPhoto,
    StudentDocument,
    MentorResume,
}

impl UploadCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            UploadCategory::StudentPhoto => "student-photo",
            UploadCategory::StudentDocument => "student-document",
            UploadCategory::MentorResume => "mentor-resume",
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        const DOCUMENTS: [&str; 3] = [
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ];
        match self {
            UploadCategory::StudentPhoto => {
                matches!(content_type, "image/jpeg" | "image/png" | "image/webp")
            }
            UploadCategory::StudentDocument | UploadCategory::MentorResume => {
                DOCUMENTS.contains(&content_type)
            }
        }
    }
}

/// PresignedUrlRequest
///
/// Input for `POST /upload/presigned`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct PresignedUrlRequest {
    pub category: UploadCategory,
    /// The original filename, used to derive the file extension.
    #[schema(example = "resume.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// Short-lived URL for the client-to-storage PUT, plus the key to send back at registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

// --- Listing Queries ---

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Validated offset window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if skip < 0 {
            return Err(AppError::validation("skip must be >= 0"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { skip, limit })
    }
}

/// ListQuery
///
/// Query string of the paginated list endpoints.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive substring over name, email and phone.
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> Result<Page, AppError> {
        Page::new(self.skip, self.limit)
    }

    pub fn search(&self) -> Option<String> {
        non_blank(self.search.as_deref())
    }
}

/// MentorQuery
///
/// `ListQuery` plus the mentor directory filters.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct MentorQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Technology name, matched case-insensitively.
    pub technology: Option<String>,
    /// Minimum whole years of experience.
    pub min_years: Option<i32>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
