use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    recipes::dto::{CreateRecipeRequest, RecipeResponse, RecipesListResponse, UpdateRecipeRequest},
    recipes::repo::Recipe,
    state::AppState,
};

/// The single recipe-creation path; ownership is recorded on the row
/// itself, which is what the owner's recipe list is derived from.
#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if payload.instructions.trim().is_empty() {
        return Err(ApiError::Validation("instructions are required".into()));
    }
    if payload.preparation_time <= 0 {
        return Err(ApiError::Validation(
            "preparationTime must be positive".into(),
        ));
    }

    let recipe = Recipe::create(
        &state.db,
        payload.title.trim(),
        payload.ingredients,
        &payload.instructions,
        payload.preparation_time,
        user.id,
    )
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "create recipe failed");
        ApiError::Internal(e)
    })?;

    info!(recipe_id = %recipe.id, user_id = %user.id, "recipe created");
    Ok((StatusCode::CREATED, Json(RecipeResponse::success(recipe))))
}

#[instrument(skip(state))]
pub async fn get_all_recipes(
    State(state): State<AppState>,
) -> Result<Json<RecipesListResponse>, ApiError> {
    let recipes = Recipe::list_all(&state.db).await.map_err(|e| {
        error!(error = %e, "list recipes failed");
        ApiError::Internal(e)
    })?;
    Ok(Json(RecipesListResponse::success(recipes)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = Recipe::find_by_id(&state.db, id)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "get recipe failed");
            ApiError::Internal(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;
    Ok(Json(RecipeResponse::success(recipe)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = Recipe::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.ingredients,
        payload.instructions.as_deref(),
        payload.preparation_time,
    )
    .await
    .map_err(|e| {
        error!(error = %e, %id, "update recipe failed");
        ApiError::Internal(e)
    })?
    .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    info!(recipe_id = %id, user_id = %user.id, "recipe updated");
    Ok(Json(RecipeResponse::success(recipe)))
}

#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = Recipe::delete_by_id(&state.db, id)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "delete recipe failed");
            ApiError::Internal(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    info!(recipe_id = %id, user_id = %user.id, "recipe deleted");
    Ok(Json(RecipeResponse::success(recipe)))
}
