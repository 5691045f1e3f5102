use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    models::Role,
    repository::{RepositoryError, RepositoryState},
    tokens::{TokenError, TokenKeys, TokenKind},
};

/// Development-only header naming the acting user.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Credentials
///
/// Raw credential material pulled off a request, before any verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    /// `x-user-id` bypass. Only produced in `Env::Local`.
    DevUser(Uuid),
}

impl Credentials {
    /// from_headers
    ///
    /// A well-formed `x-user-id` wins in the local environment; otherwise the
    /// `Authorization: Bearer` token is used. `None` when neither is present.
    pub fn from_headers(headers: &HeaderMap, env: Env) -> Option<Self> {
        if env == Env::Local {
            let dev_user = headers
                .get(DEV_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value.trim()).ok());
            if let Some(id) = dev_user {
                return Some(Credentials::DevUser(id));
            }
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Credentials::Bearer(token.to_string()))
    }
}

/// Identity
///
/// The authenticated caller. `role` is the tag currently stored for the user, which may
/// not be a known role; the gate treats such identities as forbidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl Identity {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    Token(#[from] TokenError),

    #[error("user not found")]
    UnknownUser,

    #[error("user is inactive")]
    Inactive,

    /// The store failed; says nothing about the credentials.
    #[error("identity store unavailable: {0}")]
    Store(#[from] RepositoryError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => AppError::from(e),
            other => {
                tracing::warn!("Rejected credentials: {}", other);
                AppError::unauthenticated("Could not validate credentials")
            }
        }
    }
}

/// IdentityResolver
///
/// Turns credentials into an `Identity`. The only place that knows how credentials are
/// verified.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}

/// The shared resolver handle stored in `AppState`.
pub type ResolverState = Arc<dyn IdentityResolver>;

/// TokenResolver
///
/// Resolves HS256 access tokens (and, locally, `x-user-id`) against the user store.
pub struct TokenResolver {
    repo: RepositoryState,
    keys: TokenKeys,
}

impl TokenResolver {
    pub fn new(repo: RepositoryState, keys: TokenKeys) -> Self {
        Self { repo, keys }
    }
}

#[async_trait]
impl IdentityResolver for TokenResolver {
    async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let user_id = match credentials {
            Credentials::Bearer(token) => self.keys.verify(token, TokenKind::Access)?.sub,
            Credentials::DevUser(id) => *id,
        };

        // Stored state wins over token claims.
        let user = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        Ok(Identity {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

/// Identity Extractor
///
/// Reuses the identity the auth middleware stored in the request extensions; resolves
/// from the headers when used on a route without the middleware.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    ResolverState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }

        let config = AppConfig::from_ref(state);
        let resolver = ResolverState::from_ref(state);

        let credentials = Credentials::from_headers(&parts.headers, config.env)
            .ok_or_else(|| AppError::unauthenticated("Not authenticated"))?;
        let identity = resolver.resolve(&credentials).await?;

        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}
