use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{error::AppError, repo::User, state::AppState};

/// Extracts and validates an access token, then loads the user it belongs to.
///
/// A request without an `Authorization` header is rejected with
/// [`AppError::NotAuthenticated`]. Anything presented but unusable, including
/// a token for a user that has since been deleted, is
/// [`AppError::Unauthorized`]. Handlers that have to tell anonymous callers
/// apart take [`MaybeAuthUser`] instead.
pub struct AuthUser(pub User);

/// Like [`AuthUser`], but missing or unusable credentials give `None`.
///
/// Repository failures while loading the user are still errors.
pub struct MaybeAuthUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::NotAuthenticated)?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "rejected access token");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token for unknown user");
            AppError::Unauthorized("User not found".into())
        })?;

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(user)) => Ok(MaybeAuthUser(Some(user))),
            Err(e @ (AppError::Repo(_) | AppError::Internal(_))) => Err(e),
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}
