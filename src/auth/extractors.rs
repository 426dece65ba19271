use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{jwt::JwtKeys, session::token_from_headers},
    error::ApiError,
    state::AppState,
    users::repo::{Role, User},
};

/// Route guard: resolves the session token to a live user. Handlers
/// taking `CurrentUser` only run for authenticated requests.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            ApiError::Authentication(
                "You are not logged in! Please log in to get access.".into(),
            )
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Authentication("Invalid or expired token".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                ApiError::Authentication(
                    "The user belonging to this token does no longer exist.".into(),
                )
            })?;

        if user.changed_password_after(claims.iat as i64) {
            warn!(user_id = %user.id, "token predates password change");
            return Err(ApiError::Authentication(
                "User recently changed password! Please log in again.".into(),
            ));
        }

        Ok(CurrentUser(user))
    }
}

/// Role gate for already-authenticated users.
pub fn restrict_to(user: &User, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "You do not have permission to perform this action".into(),
        ))
    }
}
