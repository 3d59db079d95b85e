//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use docseal_core::workflow::{Actor, Role};
use docseal_shared::{Claims, JwtError};
use docseal_shared::types::UserId;

use crate::{AppState, error::ApiError};

/// Authentication middleware that validates bearer tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return ApiError::unauthorized(
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    match state.jwt_service.validate_token(bearer.token()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => {
            ApiError::unauthorized("TOKEN_EXPIRED", "Token has expired").into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized("INVALID_TOKEN", "Invalid or malformed token").into_response()
        }
    }
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     let actor = user.actor()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.user_id())
    }

    /// The role the token was issued for.
    ///
    /// # Errors
    ///
    /// Returns 403 `UNKNOWN_ROLE` if the claim is not a recognised role.
    pub fn role(&self) -> Result<Role, ApiError> {
        Role::parse(&self.0.role).ok_or_else(|| {
            ApiError::forbidden("UNKNOWN_ROLE", format!("unknown role '{}'", self.0.role))
        })
    }

    /// Acting user and role for workflow operations.
    ///
    /// # Errors
    ///
    /// Same as [`role`](Self::role).
    pub fn actor(&self) -> Result<Actor, ApiError> {
        Ok(Actor::new(self.user_id(), self.role()?))
    }

    /// Require one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns 403 `FORBIDDEN` otherwise.
    pub fn require_any(&self, roles: &[Role]) -> Result<Role, ApiError> {
        let role = self.role()?;
        if roles.contains(&role) {
            Ok(role)
        } else {
            Err(ApiError::forbidden(
                "FORBIDDEN",
                format!("role '{role}' may not perform this operation"),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("UNAUTHORIZED", "Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(role: &str) -> AuthUser {
        AuthUser(Claims::new(
            uuid::Uuid::now_v7(),
            role,
            Utc::now() + Duration::minutes(5),
        ))
    }

    #[test]
    fn test_actor_from_claims() {
        let auth = user("department_head");
        let actor = auth.actor().unwrap();
        assert_eq!(actor.role, Role::DepartmentHead);
        assert_eq!(actor.user_id, auth.user_id());
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let err = user("chancellor").actor().unwrap_err();
        assert_eq!(err.status().as_u16(), 403);
        assert_eq!(err.body().error, "UNKNOWN_ROLE");
    }

    #[test]
    fn test_require_any() {
        assert_eq!(user("admin").require_any(&[Role::Admin]).unwrap(), Role::Admin);
        let err = user("student").require_any(&[Role::Admin, Role::Registrar]).unwrap_err();
        assert_eq!(err.body().error, "FORBIDDEN");
    }
}
