use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ApiMessage, ForgotPasswordRequest, ResetPasswordRequest, SigninRequest,
            SignupRequest, UpdatePasswordRequest,
        },
        extractors::CurrentUser,
        password::{hash_password, verify_password},
        reset_token,
        session::{clear_session_cookie, create_send_token},
    },
    error::ApiError,
    state::AppState,
    users::repo::{Role, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    if password != confirm {
        return Err(ApiError::Validation("Passwords are not the same!".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.first_name.trim().is_empty() {
        return Err(ApiError::Validation("please provide first name".into()));
    }
    if payload.last_name.trim().is_empty() {
        return Err(ApiError::Validation("please provide last name".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Please provide a valid email".into()));
    }
    validate_new_password(&payload.password, &payload.confirm_password)?;

    // The very first account becomes the approved owner. The count is
    // taken before any stale record is removed, so re-signup over an
    // abandoned first registration yields a regular unapproved user.
    let existing_users = User::count_all(&state.db).await?;
    let (role, approved) = if existing_users == 0 {
        (Role::Owner, true)
    } else {
        (Role::User, false)
    };

    match User::find_by_email(&state.db, &payload.email).await? {
        Some(existing) if existing.verified => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Some(_) => {
            // Abandoned signup: discard it, reset token state included.
            User::delete_unverified_by_email(&state.db, &payload.email).await?;
        }
        None => {}
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        payload.first_name.trim(),
        payload.last_name.trim(),
        &payload.email,
        &hash,
        role,
        approved,
    )
    .await?;

    let token = reset_token::generate();
    User::set_reset_token(&state.db, user.id, &token.hashed, token.expires_at).await?;

    let verification_url = format!("{}/verify/{}", state.config.frontend_url, token.plaintext);
    let message = format!(
        "click the link to verify your email: {verification_url}.\nIf you didn't signup, please ignore this email!"
    );
    state
        .mailer
        .send(
            &payload.email,
            "Account verification (valid for an hour)",
            &message,
        )
        .await?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(Json(ApiMessage::success(format!(
        "We have sent a verification email to {}, please verify your account",
        payload.email
    ))))
}

#[instrument(skip(state, token))]
pub async fn verification(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let hashed = reset_token::hash_token(&token);

    let user = User::find_by_reset_token(&state.db, &hashed)
        .await?
        .ok_or_else(|| {
            warn!("verification with invalid or expired token");
            ApiError::Validation("Token is invalid or has expired".into())
        })?;

    let user = User::mark_verified(&state.db, user.id).await?;
    info!(user_id = %user.id, "email verified");

    create_send_token(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(email), Some(password)) => (email.trim().to_lowercase(), password),
        _ => {
            return Err(ApiError::Validation(
                "Please provide email and password!".into(),
            ))
        }
    };

    // Unknown email and wrong password share one generic message, so
    // responses never reveal whether an account exists.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "signin with unknown email");
        return Err(ApiError::Authentication(
            "Incorrect email or password".into(),
        ));
    };
    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "signin with wrong password");
        return Err(ApiError::Authentication(
            "Incorrect email or password".into(),
        ));
    }

    info!(user_id = %user.id, "user signed in");
    create_send_token(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("There is no user with this email address.".into())
        })?;

    let token = reset_token::generate();
    User::set_reset_token(&state.db, user.id, &token.hashed, token.expires_at).await?;

    let reset_url = format!(
        "{}/reset-password/{}",
        state.config.frontend_url, token.plaintext
    );
    let message = format!(
        "Forgot your password? Submit a PATCH request with your new password and passwordConfirm to: {reset_url}.\nIf you didn't forget your password, please ignore this email!"
    );
    state
        .mailer
        .send(
            &user.email,
            "Your password reset token (valid for an hour)",
            &message,
        )
        .await?;

    info!(user_id = %user.id, "password reset email sent");
    Ok(Json(ApiMessage::success(format!(
        "We have sent a verification token to {email}"
    ))))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    validate_new_password(&payload.password, &payload.confirm_password)?;

    let hashed = reset_token::hash_token(&token);
    let user = User::find_by_reset_token(&state.db, &hashed)
        .await?
        .ok_or_else(|| {
            warn!("password reset with invalid or expired token");
            ApiError::Validation("Token is invalid or has expired".into())
        })?;

    let new_hash = hash_password(&payload.password)?;
    let user = User::update_password(&state.db, user.id, &new_hash).await?;
    info!(user_id = %user.id, "password reset");

    create_send_token(&state, user)
}

#[instrument(skip(state, user, payload))]
pub async fn update_my_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::Authentication(
            "Your current password is wrong.".into(),
        ));
    }

    validate_new_password(&payload.password, &payload.confirm_password)?;

    let new_hash = hash_password(&payload.password)?;
    // Stamping password_changed_at invalidates every earlier session;
    // the token issued below shares the change's second and stays valid.
    let user = User::update_password(&state.db, user.id, &new_hash).await?;
    info!(user_id = %user.id, "password updated");

    create_send_token(&state, user)
}

#[instrument]
pub async fn logout() -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        clear_session_cookie().parse().map_err(ApiError::internal)?,
    );
    Ok((headers, Json(serde_json::json!({ "status": "success" }))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn new_password_must_be_long_enough() {
        let err = validate_new_password("short", "short").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn new_password_must_match_confirmation() {
        let err = validate_new_password("longenough", "different").unwrap_err();
        assert_eq!(err.to_string(), "Passwords are not the same!");
    }

    #[test]
    fn valid_password_pair_passes() {
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }
}
