use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::{Credentials, Identity, IdentityResolver},
    error::AppError,
    policy::{Operation, Resource, RolePolicy, Scope},
};

/// AccessRequest
///
/// What the caller wants to do. `owner` is the user owning the target record, when the
/// handler knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest {
    pub resource: Resource,
    pub operation: Operation,
    pub owner: Option<Uuid>,
}

impl AccessRequest {
    pub fn new(resource: Resource, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Decision
///
/// Terminal outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Carries the scope the handler must respect when no owner was named.
    Admitted(Scope),
    Unauthenticated,
    Forbidden,
}

/// AccessGate
///
/// Combines an identity with the role policy. Cheap to clone; the policy is shared.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: Arc<RolePolicy>,
}

impl AccessGate {
    pub fn new(policy: RolePolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// decide
    ///
    /// Pure: the same identity, request and policy always give the same decision.
    pub fn decide(&self, identity: Option<&Identity>, request: &AccessRequest) -> Decision {
        let Some(identity) = identity else {
            return Decision::Unauthenticated;
        };
        let Some(role) = identity.role() else {
            return Decision::Forbidden;
        };

        match self
            .policy
            .lookup(role, request.resource, request.operation)
        {
            None => Decision::Forbidden,
            Some(Scope::Any) => Decision::Admitted(Scope::Any),
            Some(Scope::Own) => match request.owner {
                Some(owner) if owner != identity.id => Decision::Forbidden,
                _ => Decision::Admitted(Scope::Own),
            },
        }
    }

    /// authorize
    ///
    /// `decide` for an already resolved identity, as a `Result` for handlers.
    pub fn authorize(&self, identity: &Identity, request: AccessRequest) -> Result<Scope, AppError> {
        match self.decide(Some(identity), &request) {
            Decision::Admitted(scope) => Ok(scope),
            Decision::Unauthenticated => Err(AppError::unauthenticated("Not authenticated")),
            Decision::Forbidden => {
                tracing::warn!(
                    user_id = %identity.id,
                    role = %identity.role,
                    resource = %request.resource,
                    operation = %request.operation,
                    "Access denied"
                );
                Err(AppError::forbidden("Forbidden"))
            }
        }
    }

    /// admit
    ///
    /// Full sequence: resolve the credentials, fail with 401 when that is impossible, then
    /// consult the policy.
    pub async fn admit(
        &self,
        resolver: &dyn IdentityResolver,
        credentials: Option<&Credentials>,
        request: AccessRequest,
    ) -> Result<(Identity, Scope), AppError> {
        let credentials =
            credentials.ok_or_else(|| AppError::unauthenticated("Not authenticated"))?;
        let identity = resolver.resolve(credentials).await?;
        let scope = self.authorize(&identity, request)?;
        Ok((identity, scope))
    }
}
