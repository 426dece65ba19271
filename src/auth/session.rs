use axum::{
    extract::FromRef,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{
    auth::{dto::UserEnvelope, jwt::JwtKeys},
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub const SESSION_COOKIE: &str = "token";

pub const PENDING_APPROVAL_MESSAGE: &str = "Your account is pending approval";

/// Issue a session for a verified and approved account: sign the token,
/// set it as an HttpOnly cookie and return the user document (credential
/// fields stripped by serialization). Unverified or unapproved accounts
/// get a 403 and no cookie, even though a token could be computed.
pub fn create_send_token(state: &AppState, user: User) -> Result<Response, ApiError> {
    if !(user.verified && user.approved) {
        return Err(ApiError::Authorization(PENDING_APPROVAL_MESSAGE.into()));
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&token, state.config.jwt.cookie_expires_days)
            .parse()
            .map_err(ApiError::internal)?,
    );

    info!(user_id = %user.id, "session issued");
    Ok((StatusCode::OK, headers, Json(UserEnvelope::success(user))).into_response())
}

pub fn session_cookie(token: &str, days: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly",
        days * 24 * 60 * 60
    )
}

/// An already-expired cookie value; the browser drops the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=loggedout; Max-Age=10; Path=/; HttpOnly")
}

/// Bearer token from the Authorization header, falling back to the
/// session cookie. Header wins when both are present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            return Some(token.to_string());
        }
    }

    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|pair| pair.strip_prefix(&prefix))
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_with_day_expiry() {
        let cookie = session_cookie("abc123", 90);
        assert_eq!(cookie, "token=abc123; Max-Age=7776000; Path=/; HttpOnly");
    }

    #[test]
    fn clear_cookie_overwrites_the_session() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("token=loggedout"));
        assert!(cookie.contains("Max-Age=10"));
    }

    #[test]
    fn bearer_header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(header::COOKIE, "token=from-cookie".parse().unwrap());
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_is_used_when_no_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; token=xyz; lang=en".parse().unwrap(),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_both_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn non_bearer_auth_scheme_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        headers.insert(header::COOKIE, "token=cookie-token".parse().unwrap());
        assert_eq!(
            token_from_headers(&headers).as_deref(),
            Some("cookie-token")
        );
    }
}
