//! HTTP handlers, grouped by surface. Every authenticated handler asks the `AccessGate`
//! before touching the repository.

pub mod admin;
pub mod auth;
pub mod courses;
pub mod uploads;
pub mod users;

use crate::{error::AppError, policy::Scope, repository::RepositoryError};

/// Registration writes report a taken email as a client error, not a conflict.
pub(crate) fn email_taken(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(msg) => AppError::bad_request(msg),
        other => other.into(),
    }
}

/// Operations that act on somebody else's account need the `any` scope even when the
/// caller happens to name themselves.
pub(crate) fn require_any(scope: Scope) -> Result<(), AppError> {
    match scope {
        Scope::Any => Ok(()),
        Scope::Own => Err(AppError::forbidden("Forbidden")),
    }
}

pub(crate) fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
