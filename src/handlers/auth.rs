use axum::{extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use super::email_taken;
use crate::{
    AppState,
    config::Env,
    error::AppError,
    extract::Json,
    models::{
        ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, MentorRegisterRequest,
        MessageResponse, NewUser, RefreshRequest, ResetPasswordRequest, Role,
        StudentRegisterRequest, TokenPair, UserOut, normalize_email,
    },
    password::{generate_reset_token, hash_password, hash_reset_token, verify_password},
    tokens::TokenKind,
};

const MIN_NEW_PASSWORD: usize = 8;

fn hash_or_internal(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::Internal(format!("password hashing: {e}")))
}

/// root
///
/// Liveness payload for the API root.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up"))
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// register_student
///
/// [Public Route] Creates a student account together with its profile.
#[utoipa::path(
    post,
    path = "/auth/register/student",
    request_body = StudentRegisterRequest,
    responses(
        (status = 201, description = "Student registered", body = UserOut),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<StudentRegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), AppError> {
    let (email, password, profile) = payload.validate()?;
    let user = NewUser {
        email,
        full_name: Some(format!("{} {}", profile.first_name, profile.last_name)),
        phone_number: profile.phone_number.clone(),
        password_hash: hash_or_internal(&password)?,
        role: Role::Student,
    };

    let (user, _) = state
        .repo
        .create_student(user, profile)
        .await
        .map_err(email_taken)?;

    tracing::info!(user_id = %user.id, "Student registered");
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

/// register_mentor
///
/// [Public Route] Creates a mentor account, its profile and technology links.
#[utoipa::path(
    post,
    path = "/auth/register/mentor",
    request_body = MentorRegisterRequest,
    responses(
        (status = 201, description = "Mentor registered", body = UserOut),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn register_mentor(
    State(state): State<AppState>,
    Json(payload): Json<MentorRegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), AppError> {
    let (email, password, profile) = payload.validate()?;
    let user = NewUser {
        email,
        full_name: Some(profile.name.clone()),
        phone_number: profile.phone_number.clone(),
        password_hash: hash_or_internal(&password)?,
        role: Role::Mentor,
    };

    let (user, _) = state
        .repo
        .create_mentor(user, profile)
        .await
        .map_err(email_taken)?;

    tracing::info!(user_id = %user.id, "Mentor registered");
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

/// login
///
/// [Public Route] Exchanges email and password for an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let invalid = || AppError::unauthenticated("Invalid credentials");

    let email = normalize_email(&payload.email).map_err(|_| invalid())?;
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }
    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login refused: inactive account");
        return Err(invalid());
    }

    let pair = state
        .tokens
        .issue_pair(user.id, &user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(pair))
}

/// refresh
///
/// [Public Route] Trades a valid refresh token for a new pair. The user must still exist
/// and be active.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let invalid = || AppError::unauthenticated("Invalid refresh token");

    let claims = state
        .tokens
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            tracing::warn!("Refresh rejected: {}", e);
            invalid()
        })?;

    let user = state
        .repo
        .find_user(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    let pair = state
        .tokens
        .issue_pair(user.id, &user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(pair))
}

/// forgot_password
///
/// [Public Route] Issues a single-use reset token when the email is known. The answer is
/// the same either way; locally the plaintext token is included since no mail is sent.
#[utoipa::path(
    post,
    path = "/auth/forgot",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Request accepted", body = ForgotPasswordResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let accepted = ForgotPasswordResponse {
        message: "If the email exists, a reset link has been sent".to_string(),
        token: None,
    };

    let Ok(email) = normalize_email(&payload.email) else {
        return Ok(Json(accepted));
    };
    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        return Ok(Json(accepted));
    };

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.reset_token_minutes);
    state
        .repo
        .create_reset_token(user.id, &hash_reset_token(&token), expires_at)
        .await?;

    tracing::info!(user_id = %user.id, "Password reset token issued");
    Ok(Json(ForgotPasswordResponse {
        token: (state.config.env == Env::Local).then_some(token),
        ..accepted
    }))
}

/// reset_password
///
/// [Public Route] Consumes a reset token and stores the new password.
#[utoipa::path(
    post,
    path = "/auth/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid or expired token"),
        (status = 422, description = "Password too short")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.new_password.chars().count() < MIN_NEW_PASSWORD {
        return Err(AppError::validation(format!(
            "new_password must be at least {MIN_NEW_PASSWORD} characters"
        )));
    }

    let new_hash = hash_or_internal(&payload.new_password)?;
    let user_id = state
        .repo
        .consume_reset_token(&hash_reset_token(payload.token.trim()), &new_hash, Utc::now())
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired token"))?;

    tracing::info!(user_id = %user_id, "Password reset");
    Ok(Json(MessageResponse::new("Password reset successful")))
}
