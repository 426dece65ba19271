use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::UserEnvelope,
        extractors::{restrict_to, CurrentUser},
    },
    error::ApiError,
    state::AppState,
    users::dto::{UpdateUserRequest, UsersListResponse},
    users::repo::{Role, User},
};

const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::Owner];

#[instrument(skip(state, user))]
pub async fn get_all_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UsersListResponse>, ApiError> {
    restrict_to(&user, ADMIN_ROLES)?;
    let users = User::list_all(&state.db).await?;
    Ok(Json(UsersListResponse::success(users)))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope::success(user))
}

#[instrument(skip(state, user))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserEnvelope>, ApiError> {
    restrict_to(&user, ADMIN_ROLES)?;
    let found = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found with that ID".into()))?;
    Ok(Json(UserEnvelope::success(found)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    restrict_to(&user, ADMIN_ROLES)?;

    if payload.password.is_some() || payload.password_confirm.is_some() {
        return Err(ApiError::Validation(
            "This route is not for password updates. Please use /updateMyPassword.".into(),
        ));
    }

    let updated = User::update_profile(
        &state.db,
        id,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.email.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("No user found with that ID".into()))?;

    info!(user_id = %id, "user profile updated");
    Ok(Json(UserEnvelope::success(updated)))
}

#[instrument(skip(state, user))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    restrict_to(&user, ADMIN_ROLES)?;
    let deleted = User::delete_by_id(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("No user found with that ID".into()));
    }
    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The administrative half of account activation: verification proves
/// the email, approval is granted here.
#[instrument(skip(state, user))]
pub async fn approve_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserEnvelope>, ApiError> {
    restrict_to(&user, ADMIN_ROLES)?;
    let approved = User::set_approved(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found with that ID".into()))?;
    info!(user_id = %id, approved_by = %user.id, "user approved");
    Ok(Json(UserEnvelope::success(approved)))
}
